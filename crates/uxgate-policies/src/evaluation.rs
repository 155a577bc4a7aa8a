// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uxgate_model::{Environment, GateStatus};

use crate::limits::{MAX_PERCENT, MAX_SCORE, MAX_WORKERS, MIN_WORKERS};
use crate::schema::GatePolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum PolicySeverity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyViolation {
    pub id: &'static str,
    pub severity: PolicySeverity,
    pub message: &'static str,
    pub evidence: String,
}

#[derive(Debug, Clone, Copy)]
enum RuleKind {
    NumberMin(u64),
    NumberMax(u64),
    StringNonEmpty,
}

#[derive(Debug, Clone, Copy)]
struct RuleSpec {
    id: &'static str,
    severity: PolicySeverity,
    message: &'static str,
    path: &'static str,
    kind: RuleKind,
}

const POLICY_RULES: &[RuleSpec] = &[
    RuleSpec {
        id: "policy.workers.min",
        severity: PolicySeverity::Error,
        message: "workers must be >= 1",
        path: "workers",
        kind: RuleKind::NumberMin(MIN_WORKERS as u64),
    },
    RuleSpec {
        id: "policy.workers.max",
        severity: PolicySeverity::Error,
        message: "workers exceeds the worker pool ceiling",
        path: "workers",
        kind: RuleKind::NumberMax(MAX_WORKERS as u64),
    },
    RuleSpec {
        id: "policy.timeouts.page_wait.min",
        severity: PolicySeverity::Error,
        message: "timeouts.page_wait_ms must be > 0",
        path: "timeouts.page_wait_ms",
        kind: RuleKind::NumberMin(1),
    },
    RuleSpec {
        id: "policy.timeouts.button_wait.min",
        severity: PolicySeverity::Error,
        message: "timeouts.button_wait_ms must be > 0",
        path: "timeouts.button_wait_ms",
        kind: RuleKind::NumberMin(1),
    },
    RuleSpec {
        id: "policy.timeouts.workflow_budget.min",
        severity: PolicySeverity::Error,
        message: "timeouts.workflow_budget_secs must be > 0",
        path: "timeouts.workflow_budget_secs",
        kind: RuleKind::NumberMin(1),
    },
    RuleSpec {
        id: "policy.readiness.staging.min_score.max",
        severity: PolicySeverity::Error,
        message: "readiness.staging.min_score must be <= 100",
        path: "readiness.staging.min_score",
        kind: RuleKind::NumberMax(MAX_SCORE as u64),
    },
    RuleSpec {
        id: "policy.readiness.canary.min_score.max",
        severity: PolicySeverity::Error,
        message: "readiness.canary.min_score must be <= 100",
        path: "readiness.canary.min_score",
        kind: RuleKind::NumberMax(MAX_SCORE as u64),
    },
    RuleSpec {
        id: "policy.readiness.production.min_score.max",
        severity: PolicySeverity::Error,
        message: "readiness.production.min_score must be <= 100",
        path: "readiness.production.min_score",
        kind: RuleKind::NumberMax(MAX_SCORE as u64),
    },
    RuleSpec {
        id: "policy.skip_policy.min_executed_percent.max",
        severity: PolicySeverity::Error,
        message: "skip_policy.min_executed_percent must be <= 100",
        path: "skip_policy.min_executed_percent",
        kind: RuleKind::NumberMax(MAX_PERCENT as u64),
    },
    RuleSpec {
        id: "policy.penalties.p0.per_failure.min",
        severity: PolicySeverity::Error,
        message: "penalties.p0.per_failure must be > 0",
        path: "penalties.p0.per_failure",
        kind: RuleKind::NumberMin(1),
    },
    RuleSpec {
        id: "policy.penalties.p0.max_total.max",
        severity: PolicySeverity::Error,
        message: "penalties.p0.max_total must be <= 100",
        path: "penalties.p0.max_total",
        kind: RuleKind::NumberMax(MAX_SCORE as u64),
    },
    RuleSpec {
        id: "policy.penalties.p1.max_total.max",
        severity: PolicySeverity::Error,
        message: "penalties.p1.max_total must be <= 100",
        path: "penalties.p1.max_total",
        kind: RuleKind::NumberMax(MAX_SCORE as u64),
    },
    RuleSpec {
        id: "policy.penalties.p2.max_total.max",
        severity: PolicySeverity::Error,
        message: "penalties.p2.max_total must be <= 100",
        path: "penalties.p2.max_total",
        kind: RuleKind::NumberMax(MAX_SCORE as u64),
    },
    RuleSpec {
        id: "policy.redaction.marker.non_empty",
        severity: PolicySeverity::Error,
        message: "redaction.marker must not be empty",
        path: "redaction.marker",
        kind: RuleKind::StringNonEmpty,
    },
];

#[must_use]
pub fn evaluate_gate_policy(policy: &GatePolicy) -> Vec<PolicyViolation> {
    let mut violations = Vec::new();
    let value = match serde_json::to_value(policy) {
        Ok(value) => value,
        Err(error) => {
            violations.push(PolicyViolation {
                id: "policy.serialization.failure",
                severity: PolicySeverity::Error,
                message: "gate policy serialization failed",
                evidence: error.to_string(),
            });
            return violations;
        }
    };

    for rule in POLICY_RULES {
        apply_rule(&value, *rule, &mut violations);
    }

    let p = &policy.penalties;
    if p.p0.per_failure < p.p1.per_failure || p.p1.per_failure < p.p2.per_failure {
        violations.push(PolicyViolation {
            id: "policy.penalties.ordering",
            severity: PolicySeverity::Error,
            message: "per_failure weights must satisfy P0 >= P1 >= P2",
            evidence: format!(
                "p0={} p1={} p2={}",
                p.p0.per_failure, p.p1.per_failure, p.p2.per_failure
            ),
        });
    }
    for (label, weight) in [("p0", p.p0), ("p1", p.p1), ("p2", p.p2)] {
        if weight.max_total < weight.per_failure {
            violations.push(PolicyViolation {
                id: "policy.penalties.cap_below_weight",
                severity: PolicySeverity::Warning,
                message: "max_total is below a single failure weight",
                evidence: format!(
                    "{label}.per_failure={} {label}.max_total={}",
                    weight.per_failure, weight.max_total
                ),
            });
        }
    }

    let r = &policy.readiness;
    let chain = [
        (Environment::Staging, r.staging),
        (Environment::Canary, r.canary),
        (Environment::Production, r.production),
    ];
    for pair in chain.windows(2) {
        let (looser_env, looser) = pair[0];
        let (stricter_env, stricter) = pair[1];
        let p1_loosened = match (looser.max_p1_failures, stricter.max_p1_failures) {
            (_, None) => looser.max_p1_failures.is_some(),
            (None, Some(_)) => false,
            (Some(a), Some(b)) => b > a,
        };
        if stricter.min_score < looser.min_score
            || stricter.max_p0_failures > looser.max_p0_failures
            || p1_loosened
        {
            violations.push(PolicyViolation {
                id: "policy.readiness.tightening",
                severity: PolicySeverity::Error,
                message: "readiness thresholds must tighten from staging to production",
                evidence: format!("{} is looser than {}", stricter_env, looser_env),
            });
        }
    }

    if policy.skip_policy.mode == crate::schema::SkipMode::Penalize
        && policy.skip_policy.per_skip == 0
    {
        violations.push(PolicyViolation {
            id: "policy.skip_policy.penalize_without_weight",
            severity: PolicySeverity::Warning,
            message: "skip_policy.mode=penalize with per_skip=0 never deducts",
            evidence: "skip_policy.per_skip=0".to_string(),
        });
    }

    violations
}

/// Aggregated run figures the readiness verdicts are computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateMetrics {
    pub score: u8,
    pub p0_failures: u64,
    pub p1_failures: u64,
    pub executed: u64,
    pub total: u64,
}

impl GateMetrics {
    #[must_use]
    pub fn executed_percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = self.executed.saturating_mul(100) / self.total;
        u8::try_from(pct.min(100)).unwrap_or(MAX_PERCENT)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvironmentVerdict {
    pub environment: Environment,
    pub ready: bool,
    pub blockers: Vec<String>,
}

fn coverage_blocker(policy: &GatePolicy, metrics: &GateMetrics) -> Option<String> {
    let required = policy.skip_policy.min_executed_percent;
    let actual = metrics.executed_percent();
    if required > 0 && actual < required {
        return Some(format!("executed {actual}% < required {required}%"));
    }
    None
}

#[must_use]
pub fn evaluate_readiness(policy: &GatePolicy, metrics: &GateMetrics) -> Vec<EnvironmentVerdict> {
    let coverage = coverage_blocker(policy, metrics);
    Environment::ALL
        .iter()
        .map(|env| {
            let threshold = policy.readiness.threshold(*env);
            let mut blockers = Vec::new();
            if metrics.score < threshold.min_score {
                blockers.push(format!(
                    "score {} < {}",
                    metrics.score, threshold.min_score
                ));
            }
            if metrics.p0_failures > u64::from(threshold.max_p0_failures) {
                blockers.push(format!(
                    "P0 failures {} > {}",
                    metrics.p0_failures, threshold.max_p0_failures
                ));
            }
            if let Some(max_p1) = threshold.max_p1_failures {
                if metrics.p1_failures > u64::from(max_p1) {
                    blockers.push(format!(
                        "P1 failures {} > {max_p1}",
                        metrics.p1_failures
                    ));
                }
            }
            if let Some(coverage) = &coverage {
                blockers.push(coverage.clone());
            }
            EnvironmentVerdict {
                environment: *env,
                ready: blockers.is_empty(),
                blockers,
            }
        })
        .collect()
}

/// GO requires the staging score, zero P0 failures and the coverage floor.
#[must_use]
pub fn evaluate_gate(policy: &GatePolicy, metrics: &GateMetrics) -> GateStatus {
    let staging = policy.readiness.staging;
    if metrics.score >= staging.min_score
        && metrics.p0_failures == 0
        && coverage_blocker(policy, metrics).is_none()
    {
        GateStatus::Go
    } else {
        GateStatus::Hold
    }
}

fn apply_rule(root: &Value, rule: RuleSpec, out: &mut Vec<PolicyViolation>) {
    let Some(value) = field_path(root, rule.path) else {
        out.push(PolicyViolation {
            id: rule.id,
            severity: PolicySeverity::Error,
            message: "required policy path missing",
            evidence: format!("path={}", rule.path),
        });
        return;
    };

    let pass = match rule.kind {
        RuleKind::NumberMin(min) => value.as_u64().is_some_and(|n| n >= min),
        RuleKind::NumberMax(max) => value.as_u64().is_some_and(|n| n <= max),
        RuleKind::StringNonEmpty => value.as_str().is_some_and(|s| !s.trim().is_empty()),
    };

    if !pass {
        out.push(PolicyViolation {
            id: rule.id,
            severity: rule.severity,
            message: rule.message,
            evidence: format!("path={} value={}", rule.path, value),
        });
    }
}

fn field_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut cur = root;
    for seg in path.split('.') {
        cur = cur.get(seg)?;
    }
    Some(cur)
}
