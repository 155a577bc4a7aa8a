// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;

use uxgate_model::{
    AuditKind, AuditOutcome, AuditResult, CoverageReport, Criticality, Environment, FailureClass,
    FailureRow, OutcomeCounts, ReadinessRow, ReportSummary, RunId, ThresholdRow,
};
use uxgate_policies::{evaluate_gate, evaluate_readiness, GateMetrics, GatePolicy, MAX_SCORE};

use crate::redact::Redactor;

/// Run identity stamped on a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMeta {
    pub run_id: RunId,
    pub generated_at_epoch_seconds: u64,
    pub base_url: String,
    pub registry_digest: String,
}

fn tally(counts: &mut OutcomeCounts, outcome: AuditOutcome) {
    counts.total += 1;
    match outcome {
        AuditOutcome::Pass => counts.passed += 1,
        AuditOutcome::Fail => counts.failed += 1,
        AuditOutcome::Skip => counts.skipped += 1,
    }
}

fn failures_at(results: &[AuditResult], criticality: Criticality) -> u64 {
    results
        .iter()
        .filter(|r| r.outcome == AuditOutcome::Fail && r.criticality == criticality)
        .count() as u64
}

/// `100 - capped failure penalties - skip penalty`, clamped to `[0, 100]`.
/// A run with nothing executed scores 0.
#[must_use]
pub fn score_results(results: &[AuditResult], policy: &GatePolicy) -> u8 {
    let executed = results.iter().filter(|r| r.is_executed()).count();
    if executed == 0 {
        return 0;
    }
    let skipped = (results.len() - executed) as u64;
    let failure_penalty: u64 = Criticality::ALL
        .iter()
        .map(|c| policy.penalties.weight(*c).deduction(failures_at(results, *c)))
        .sum();
    let penalty = failure_penalty.saturating_add(policy.skip_policy.deduction(skipped));
    let score = u64::from(MAX_SCORE).saturating_sub(penalty);
    u8::try_from(score).unwrap_or(MAX_SCORE)
}

fn metrics_for(results: &[AuditResult], score: u8) -> GateMetrics {
    GateMetrics {
        score,
        p0_failures: failures_at(results, Criticality::P0),
        p1_failures: failures_at(results, Criticality::P1),
        executed: results.iter().filter(|r| r.is_executed()).count() as u64,
        total: results.len() as u64,
    }
}

fn coverage_warnings(
    results: &[AuditResult],
    metrics: &GateMetrics,
    policy: &GatePolicy,
) -> Vec<String> {
    let mut warnings = Vec::new();
    let skipped = metrics.total - metrics.executed;
    if metrics.executed == 0 {
        warnings.push(format!(
            "no audits executed ({} skipped): score forced to 0",
            skipped
        ));
    } else if skipped > metrics.executed {
        warnings.push(format!(
            "skipped audits ({skipped}) outnumber executed audits ({}); \
             the score covers executed audits only",
            metrics.executed
        ));
    }
    let required = policy.skip_policy.min_executed_percent;
    if required > 0 && metrics.executed_percent() < required {
        warnings.push(format!(
            "executed {}% is below the required {required}%",
            metrics.executed_percent()
        ));
    }
    for result in results.iter().filter(|r| r.used_fallback) {
        if let Some(locator) = result.matched_locator.as_deref() {
            warnings.push(format!(
                "{} {} matched only its fallback selector `{locator}`",
                result.kind, result.id
            ));
        }
    }
    warnings
}

/// Aggregates a flat result list into the coverage report.
#[must_use]
pub fn build_report(
    meta: ReportMeta,
    results: Vec<AuditResult>,
    policy: &GatePolicy,
    redactor: &Redactor,
) -> CoverageReport {
    let mut results: Vec<AuditResult> = results
        .into_iter()
        .map(|r| redactor.redact_result(r))
        .collect();
    results.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.id.cmp(&b.id)));

    let mut by_kind: BTreeMap<AuditKind, OutcomeCounts> = AuditKind::ALL
        .iter()
        .map(|k| (*k, OutcomeCounts::default()))
        .collect();
    let mut by_criticality: BTreeMap<Criticality, OutcomeCounts> = Criticality::ALL
        .iter()
        .map(|c| (*c, OutcomeCounts::default()))
        .collect();
    let mut totals = OutcomeCounts::default();
    for result in &results {
        tally(&mut totals, result.outcome);
        tally(by_kind.entry(result.kind).or_default(), result.outcome);
        tally(by_criticality.entry(result.criticality).or_default(), result.outcome);
    }

    let score = score_results(&results, policy);
    let metrics = metrics_for(&results, score);
    let status = evaluate_gate(policy, &metrics);
    let readiness = evaluate_readiness(policy, &metrics)
        .into_iter()
        .map(|v| ReadinessRow {
            environment: v.environment,
            ready: v.ready,
            blockers: v.blockers,
        })
        .collect();
    let thresholds = Environment::ALL
        .iter()
        .map(|env| {
            let t = policy.readiness.threshold(*env);
            ThresholdRow {
                environment: *env,
                min_score: t.min_score,
                max_p0_failures: t.max_p0_failures,
                max_p1_failures: t.max_p1_failures,
            }
        })
        .collect();

    let mut failures: Vec<FailureRow> = results
        .iter()
        .filter(|r| r.outcome == AuditOutcome::Fail)
        .map(|r| FailureRow {
            kind: r.kind,
            id: r.id.clone(),
            criticality: r.criticality,
            // Classless failures still count, so they still get a row.
            class: r.failure_class.unwrap_or(FailureClass::AssertionFailed),
            error: r.error.clone().unwrap_or_default(),
        })
        .collect();
    failures.sort_by(|a, b| {
        a.criticality
            .cmp(&b.criticality)
            .then(a.kind.cmp(&b.kind))
            .then_with(|| a.id.cmp(&b.id))
    });

    let summary = ReportSummary {
        total: totals.total,
        passed: totals.passed,
        failed: totals.failed,
        skipped: totals.skipped,
        executed_percent: metrics.executed_percent(),
        p0_failures: metrics.p0_failures,
        p1_failures: metrics.p1_failures,
        p2_failures: failures_at(&results, Criticality::P2),
        noop_buttons: results.iter().filter(|r| r.is_noop()).count() as u64,
        dead_ends: results.iter().filter(|r| r.is_dead_end()).count() as u64,
        score,
        status,
    };

    CoverageReport {
        run_id: meta.run_id,
        generated_at_epoch_seconds: meta.generated_at_epoch_seconds,
        base_url: meta.base_url,
        registry_digest: meta.registry_digest,
        skip_policy: policy.skip_policy.describe(),
        warnings: coverage_warnings(&results, &metrics, policy)
            .iter()
            .map(|w| redactor.redact(w))
            .collect(),
        summary,
        by_kind,
        by_criticality,
        readiness,
        failures,
        thresholds,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uxgate_model::GateStatus;
    use uxgate_policies::{published_policy, SkipMode};

    fn fail(kind: AuditKind, id: &str, crit: Criticality, class: FailureClass) -> AuditResult {
        AuditResult::fail(kind, id, crit, class, "failed")
    }

    fn meta() -> ReportMeta {
        ReportMeta {
            run_id: RunId::parse("unit_run").expect("run id"),
            generated_at_epoch_seconds: 0,
            base_url: "http://localhost".to_string(),
            registry_digest: "digest".to_string(),
        }
    }

    fn redactor() -> Redactor {
        Redactor::new(&published_policy().redaction).expect("redactor")
    }

    #[test]
    fn failure_penalties_are_capped_per_criticality() {
        let policy = published_policy();
        let mut results: Vec<AuditResult> = (0..4)
            .map(|i| {
                let id = format!("p0_{i}");
                fail(AuditKind::Page, &id, Criticality::P0, FailureClass::AssertionFailed)
            })
            .collect();
        results.extend((0..3).map(|i| {
            fail(AuditKind::Button, &format!("p1_{i}"), Criticality::P1, FailureClass::NoopDetected)
        }));
        assert_eq!(score_results(&results, &policy), 70);
    }

    #[test]
    fn nothing_executed_scores_zero() {
        let policy = published_policy();
        let skips = vec![AuditResult::skip(AuditKind::Page, "a", Criticality::P2, "auth")];
        assert_eq!(score_results(&skips, &policy), 0);
        assert_eq!(score_results(&[], &policy), 0);
    }

    #[test]
    fn penalize_mode_charges_skips() {
        let mut policy = published_policy();
        policy.skip_policy.mode = SkipMode::Penalize;
        policy.skip_policy.per_skip = 1;
        policy.skip_policy.max_total = 5;
        let mut results = vec![AuditResult::pass(AuditKind::Page, "home", Criticality::P1)];
        results.extend((0..9).map(|i| {
            AuditResult::skip(AuditKind::Button, &format!("b{i}"), Criticality::P2, "driver")
        }));
        assert_eq!(score_results(&results, &policy), 95);
    }

    #[test]
    fn report_counts_noops_dead_ends_and_orders_failures() {
        let policy = published_policy();
        let results = vec![
            fail(AuditKind::Workflow, "checkout", Criticality::P1, FailureClass::DeadEndDetected),
            fail(AuditKind::Button, "home:save", Criticality::P0, FailureClass::NoopDetected),
            AuditResult::pass(AuditKind::Page, "home", Criticality::P0)
                .with_locator("#x", true),
        ];
        let report = build_report(meta(), results, &policy, &redactor());
        assert_eq!(report.summary.noop_buttons, 1);
        assert_eq!(report.summary.dead_ends, 1);
        assert_eq!(report.summary.status, GateStatus::Hold);
        assert_eq!(report.failures[0].id, "home:save");
        assert_eq!(report.results[0].kind, AuditKind::Page);
        assert_eq!(report.by_kind[&AuditKind::Workflow].failed, 1);
        assert!(report.warnings.iter().any(|w| w.contains("fallback selector")));
    }

    #[test]
    fn coverage_floor_holds_the_gate() {
        let mut policy = published_policy();
        policy.skip_policy.min_executed_percent = 50;
        let mut results = vec![AuditResult::pass(AuditKind::Page, "home", Criticality::P1)];
        results.extend((0..3).map(|i| {
            AuditResult::skip(AuditKind::Page, &format!("s{i}"), Criticality::P2, "auth")
        }));
        let report = build_report(meta(), results, &policy, &redactor());
        assert_eq!(report.summary.score, 100);
        assert_eq!(report.summary.executed_percent, 25);
        assert_eq!(report.summary.status, GateStatus::Hold);
        assert!(report.readiness.iter().all(|row| !row.ready));
    }

    #[test]
    fn every_counted_failure_gets_a_table_row() {
        let policy = published_policy();
        let mut classless = fail(AuditKind::Page, "home", Criticality::P0, FailureClass::Timeout);
        classless.failure_class = None;
        let report = build_report(meta(), vec![classless], &policy, &redactor());
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].class, FailureClass::AssertionFailed);
    }
}
