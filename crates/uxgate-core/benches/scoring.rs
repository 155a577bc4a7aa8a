// SPDX-License-Identifier: Apache-2.0

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use uxgate_core::{build_report, score_results, Redactor, ReportMeta};
use uxgate_model::{AuditKind, AuditResult, Criticality, FailureClass, RunId};
use uxgate_policies::published_policy;

fn sample_results(count: usize) -> Vec<AuditResult> {
    (0..count)
        .map(|idx| {
            let id = format!("entry-{idx}");
            let crit = Criticality::ALL[idx % 3];
            let kind = AuditKind::ALL[idx % 3];
            match idx % 5 {
                0 => AuditResult::fail(
                    kind,
                    &id,
                    crit,
                    FailureClass::AssertionFailed,
                    "request for jane.doe@example.com failed with HTTP 500",
                ),
                1 => AuditResult::skip(kind, &id, crit, "auth fixture unavailable: jwt_admin"),
                _ => AuditResult::pass(kind, &id, crit),
            }
        })
        .collect()
}

fn bench_scoring(c: &mut Criterion) {
    let policy = published_policy();
    let redactor = Redactor::new(&policy.redaction).expect("redactor");
    let results = sample_results(500);
    let meta = ReportMeta {
        run_id: RunId::parse("bench_run").expect("run id"),
        generated_at_epoch_seconds: 1_769_423_382,
        base_url: "https://portal.example.com".to_string(),
        registry_digest: "bench".to_string(),
    };

    c.bench_function("score_results_500", |b| {
        b.iter(|| score_results(black_box(&results), black_box(&policy)))
    });

    c.bench_function("build_report_500", |b| {
        b.iter(|| {
            build_report(
                meta.clone(),
                black_box(results.clone()),
                black_box(&policy),
                &redactor,
            )
        })
    });

    c.bench_function("redact_error_line", |b| {
        b.iter(|| {
            redactor.redact(black_box(
                "Bearer eyJhbGciOiJIUzI1NiJ9.eyJzdWIiOiIxIn0.c2ln for ops@example.com, call +44 20 7946 0958",
            ))
        })
    });
}

criterion_group!(benches, bench_scoring);
criterion_main!(benches);
