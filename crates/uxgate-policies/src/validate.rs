// SPDX-License-Identifier: Apache-2.0

use serde_json::{Map, Value};

use crate::evaluation::{evaluate_gate_policy, PolicySeverity};
use crate::schema::GatePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyValidationError(pub String);

impl std::fmt::Display for PolicyValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for PolicyValidationError {}

/// Rejects the policy on its first error-severity violation. Warnings pass.
pub fn validate_gate_policy(policy: &GatePolicy) -> Result<(), PolicyValidationError> {
    let violations = evaluate_gate_policy(policy);
    if let Some(v) = violations
        .into_iter()
        .find(|v| matches!(v.severity, PolicySeverity::Error))
    {
        return Err(PolicyValidationError(format!(
            "{}: {} ({})",
            v.id, v.message, v.evidence
        )));
    }
    validate_redaction_patterns(policy)
}

fn validate_redaction_patterns(policy: &GatePolicy) -> Result<(), PolicyValidationError> {
    for pattern in &policy.redaction.extra_patterns {
        let compiled = regex::Regex::new(pattern).map_err(|e| {
            PolicyValidationError(format!(
                "policy.redaction.extra_patterns: pattern `{pattern}` does not compile: {e}"
            ))
        })?;
        if compiled.is_match("") {
            return Err(PolicyValidationError(format!(
                "policy.redaction.extra_patterns: pattern `{pattern}` matches the empty string"
            )));
        }
        if compiled.is_match(&policy.redaction.marker) {
            return Err(PolicyValidationError(format!(
                "policy.redaction.extra_patterns: pattern `{pattern}` matches the redaction marker"
            )));
        }
    }
    Ok(())
}

pub fn canonical_policy_json(policy: &GatePolicy) -> Result<String, PolicyValidationError> {
    let value = serde_json::to_value(policy)
        .map_err(|e| PolicyValidationError(format!("encode policy failed: {e}")))?;
    serde_json::to_string_pretty(&normalize_json(value))
        .map_err(|e| PolicyValidationError(format!("print policy failed: {e}")))
}

pub(crate) fn normalize_json(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map
                .into_iter()
                .map(|(k, v)| (k, normalize_json(v)))
                .collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut out = Map::new();
            for (k, v) in entries {
                out.insert(k, v);
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_json).collect()),
        other => other,
    }
}
