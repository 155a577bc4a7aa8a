// SPDX-License-Identifier: Apache-2.0

use serde_json::Value;

use crate::limits::{
    DEFAULT_BUTTON_WAIT_MS, DEFAULT_PAGE_WAIT_MS, DEFAULT_REDACTION_MARKER,
    DEFAULT_WORKERS, DEFAULT_WORKFLOW_BUDGET_SECS,
};
use crate::schema::{
    EnvironmentThreshold, GatePolicy, PenaltyTable, PenaltyWeight, PolicySchemaVersion,
    ReadinessThresholds, RedactionPolicy, SkipMode, SkipPolicy, TimeoutPolicy,
};
use crate::validate::{validate_gate_policy, PolicyValidationError};

/// Built-in policy used when no policy document is found.
#[must_use]
pub fn published_policy() -> GatePolicy {
    GatePolicy {
        schema_version: PolicySchemaVersion::V1,
        penalties: PenaltyTable {
            p0: PenaltyWeight {
                per_failure: 8,
                max_total: 20,
            },
            p1: PenaltyWeight {
                per_failure: 4,
                max_total: 10,
            },
            p2: PenaltyWeight {
                per_failure: 2,
                max_total: 6,
            },
        },
        skip_policy: SkipPolicy {
            mode: SkipMode::Ignore,
            per_skip: 0,
            max_total: 0,
            min_executed_percent: 0,
        },
        readiness: ReadinessThresholds {
            staging: EnvironmentThreshold {
                min_score: 85,
                max_p0_failures: 0,
                max_p1_failures: None,
            },
            canary: EnvironmentThreshold {
                min_score: 90,
                max_p0_failures: 0,
                max_p1_failures: Some(3),
            },
            production: EnvironmentThreshold {
                min_score: 95,
                max_p0_failures: 0,
                max_p1_failures: Some(1),
            },
        },
        timeouts: TimeoutPolicy {
            page_wait_ms: DEFAULT_PAGE_WAIT_MS,
            button_wait_ms: DEFAULT_BUTTON_WAIT_MS,
            workflow_budget_secs: DEFAULT_WORKFLOW_BUDGET_SECS,
        },
        workers: DEFAULT_WORKERS,
        redaction: RedactionPolicy {
            marker: DEFAULT_REDACTION_MARKER.to_string(),
            extra_patterns: Vec::new(),
        },
    }
}

pub fn parse_policy_json(raw: &str) -> Result<GatePolicy, PolicyValidationError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| PolicyValidationError(format!("parse policy failed: {e}")))?;
    let version = value
        .get("schema_version")
        .and_then(Value::as_str)
        .ok_or_else(|| PolicyValidationError("schema_version is required".to_string()))?;
    if version != PolicySchemaVersion::V1.as_str() {
        return Err(PolicyValidationError(format!(
            "unsupported policy schema_version: {version}"
        )));
    }
    let policy: GatePolicy = serde_json::from_value(value)
        .map_err(|e| PolicyValidationError(format!("decode policy failed: {e}")))?;
    validate_gate_policy(&policy)?;
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::canonical_policy_json;

    #[test]
    fn canonical_json_round_trips_through_parser() {
        let policy = published_policy();
        let raw = canonical_policy_json(&policy).expect("canonical");
        assert_eq!(parse_policy_json(&raw).expect("parse"), policy);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = canonical_policy_json(&published_policy()).expect("canonical");
        let patched = raw.replacen("\"workers\"", "\"wrokers\": 2,\n  \"workers\"", 1);
        let err = parse_policy_json(&patched).expect_err("unknown field");
        assert!(err.0.contains("decode policy failed"), "{err}");
    }

    #[test]
    fn future_schema_version_is_rejected() {
        let raw = canonical_policy_json(&published_policy())
            .expect("canonical")
            .replace("\"schema_version\": \"1\"", "\"schema_version\": \"2\"");
        let err = parse_policy_json(&raw).expect_err("version");
        assert!(err.0.contains("unsupported policy schema_version"));
    }

    #[test]
    fn redaction_pattern_matching_marker_is_rejected() {
        let mut policy = published_policy();
        policy.redaction.extra_patterns = vec![r"\[REDACTED\]".to_string()];
        let err = validate_gate_policy(&policy).expect_err("marker");
        assert!(err.0.contains("redaction marker"));

        policy.redaction.extra_patterns = vec!["(unclosed".to_string()];
        assert!(validate_gate_policy(&policy).is_err());
    }
}
