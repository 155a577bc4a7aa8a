// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

mod adapters;
mod evaluation;
mod limits;
mod policy_set;
mod schema;
mod validate;

pub use adapters::{load_policy_file, load_policy_from_workspace, policy_path, resolve_policy};
pub use evaluation::{
    evaluate_gate, evaluate_gate_policy, evaluate_readiness, EnvironmentVerdict, GateMetrics,
    PolicySeverity, PolicyViolation,
};
pub use limits::{
    DEFAULT_BUTTON_WAIT_MS, DEFAULT_PAGE_WAIT_MS, DEFAULT_REDACTION_MARKER, DEFAULT_WORKERS,
    DEFAULT_WORKFLOW_BUDGET_SECS, MAX_PERCENT, MAX_SCORE, MAX_WORKERS, MIN_WORKERS,
};
pub use policy_set::{parse_policy_json, published_policy};
pub use schema::{
    EnvironmentThreshold, GatePolicy, PenaltyTable, PenaltyWeight, PolicySchemaVersion,
    ReadinessThresholds, RedactionPolicy, SkipMode, SkipPolicy, TimeoutPolicy,
};
pub use validate::{canonical_policy_json, validate_gate_policy, PolicyValidationError};

pub const CRATE_NAME: &str = "uxgate-policies";
