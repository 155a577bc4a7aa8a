// SPDX-License-Identifier: Apache-2.0

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uxgate_policies::{
    evaluate_gate, evaluate_gate_policy, evaluate_readiness, parse_policy_json, published_policy,
    canonical_policy_json, GateMetrics,
};

fn bench_policy_evaluation(c: &mut Criterion) {
    let policy = published_policy();
    let raw = canonical_policy_json(&policy).expect("canonical policy");
    let metrics = GateMetrics {
        score: 88,
        p0_failures: 0,
        p1_failures: 2,
        executed: 120,
        total: 140,
    };

    c.bench_function("gate_policy_evaluate", |b| {
        b.iter(|| evaluate_gate_policy(black_box(&policy)))
    });

    c.bench_function("gate_policy_parse", |b| {
        b.iter(|| parse_policy_json(black_box(&raw)).expect("valid policy"))
    });

    c.bench_function("gate_readiness_matrix", |b| {
        b.iter(|| {
            (
                evaluate_readiness(black_box(&policy), black_box(&metrics)),
                evaluate_gate(black_box(&policy), black_box(&metrics)),
            )
        })
    });
}

criterion_group!(benches, bench_policy_evaluation);
criterion_main!(benches);
