// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{AuditKind, AuditResult, Criticality, Environment, FailureClass, RunId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateStatus {
    #[serde(rename = "GO")]
    Go,
    #[serde(rename = "HOLD")]
    Hold,
}

impl GateStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Go => "GO",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub total: u64,
}

impl OutcomeCounts {
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.passed + self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub executed_percent: u8,
    pub p0_failures: u64,
    pub p1_failures: u64,
    pub p2_failures: u64,
    pub noop_buttons: u64,
    pub dead_ends: u64,
    pub score: u8,
    pub status: GateStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessRow {
    pub environment: Environment,
    pub ready: bool,
    pub blockers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdRow {
    pub environment: Environment,
    pub min_score: u8,
    pub max_p0_failures: u32,
    pub max_p1_failures: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRow {
    pub kind: AuditKind,
    pub id: String,
    pub criticality: Criticality,
    pub class: FailureClass,
    /// Already passed through PII redaction.
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub run_id: RunId,
    pub generated_at_epoch_seconds: u64,
    pub base_url: String,
    pub registry_digest: String,
    pub skip_policy: String,
    pub summary: ReportSummary,
    pub by_kind: BTreeMap<AuditKind, OutcomeCounts>,
    pub by_criticality: BTreeMap<Criticality, OutcomeCounts>,
    pub readiness: Vec<ReadinessRow>,
    pub failures: Vec<FailureRow>,
    pub thresholds: Vec<ThresholdRow>,
    pub warnings: Vec<String>,
    pub results: Vec<AuditResult>,
}

impl CoverageReport {
    #[must_use]
    pub fn is_ready(&self, environment: Environment) -> bool {
        self.readiness
            .iter()
            .any(|row| row.environment == environment && row.ready)
    }
}

pub fn report_json_schema() -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "uxgate coverage report",
        "type": "object",
        "required": [
            "run_id", "generated_at_epoch_seconds", "base_url", "registry_digest", "skip_policy",
            "summary", "by_kind", "by_criticality", "readiness", "failures", "thresholds",
            "warnings", "results"
        ],
        "properties": {
            "run_id": {"type": "string"},
            "generated_at_epoch_seconds": {"type": "integer", "minimum": 0},
            "base_url": {"type": "string"},
            "registry_digest": {"type": "string"},
            "skip_policy": {"type": "string"},
            "summary": {
                "type": "object",
                "required": [
                    "score", "status", "total", "passed", "failed", "skipped", "noop_buttons",
                    "dead_ends"
                ],
                "properties": {
                    "score": {"type": "integer", "minimum": 0, "maximum": 100},
                    "status": {"enum": ["GO", "HOLD"]}
                }
            },
            "by_kind": {"type": "object"},
            "by_criticality": {"type": "object"},
            "readiness": {"type": "array"},
            "failures": {"type": "array"},
            "thresholds": {"type": "array"},
            "warnings": {"type": "array", "items": {"type": "string"}},
            "results": {"type": "array"}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_schema_contains_required_fields() {
        let schema = report_json_schema();
        let required_text = schema
            .get("required")
            .map(Value::to_string)
            .unwrap_or_default();
        for field in ["run_id", "summary", "readiness", "failures", "results"] {
            assert!(required_text.contains(field), "missing {field}");
        }
    }

    #[test]
    fn gate_status_serializes_upper_case() {
        assert_eq!(
            serde_json::to_value(GateStatus::Hold).expect("encode"),
            json!("HOLD")
        );
    }

    #[test]
    fn enum_keyed_maps_serialize_as_strings() {
        let mut by_kind = BTreeMap::new();
        by_kind.insert(AuditKind::Workflow, OutcomeCounts::default());
        let value = serde_json::to_value(&by_kind).expect("encode");
        assert!(value.get("workflow").is_some());
    }
}
