// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use uxgate_model::{Criticality, Environment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum PolicySchemaVersion {
    #[serde(rename = "1")]
    V1,
}

impl PolicySchemaVersion {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "1",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatePolicy {
    pub schema_version: PolicySchemaVersion,
    pub penalties: PenaltyTable,
    pub skip_policy: SkipPolicy,
    pub readiness: ReadinessThresholds,
    pub timeouts: TimeoutPolicy,
    pub workers: u32,
    pub redaction: RedactionPolicy,
}

/// Score deduction for one criticality class: `min(failures * per_failure, max_total)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PenaltyWeight {
    pub per_failure: u32,
    pub max_total: u32,
}

impl PenaltyWeight {
    #[must_use]
    pub fn deduction(self, failures: u64) -> u64 {
        failures
            .saturating_mul(u64::from(self.per_failure))
            .min(u64::from(self.max_total))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PenaltyTable {
    pub p0: PenaltyWeight,
    pub p1: PenaltyWeight,
    pub p2: PenaltyWeight,
}

impl PenaltyTable {
    #[must_use]
    pub fn weight(&self, criticality: Criticality) -> PenaltyWeight {
        match criticality {
            Criticality::P0 => self.p0,
            Criticality::P1 => self.p1,
            Criticality::P2 => self.p2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipMode {
    /// Skips never touch the score.
    Ignore,
    /// Each skip deducts `per_skip`, capped at `max_total`.
    Penalize,
}

impl SkipMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::Penalize => "penalize",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkipPolicy {
    pub mode: SkipMode,
    pub per_skip: u32,
    pub max_total: u32,
    /// Executed (pass + fail) share of all results required for GO and for any
    /// environment to be ready. 0 disables the requirement.
    pub min_executed_percent: u8,
}

impl SkipPolicy {
    #[must_use]
    pub fn describe(&self) -> String {
        let mode = match self.mode {
            SkipMode::Ignore => "ignore".to_string(),
            SkipMode::Penalize => format!(
                "penalize(per_skip={}, max_total={})",
                self.per_skip, self.max_total
            ),
        };
        if self.min_executed_percent > 0 {
            format!("{mode}; min_executed={}%", self.min_executed_percent)
        } else {
            mode
        }
    }

    #[must_use]
    pub fn deduction(&self, skipped: u64) -> u64 {
        match self.mode {
            SkipMode::Ignore => 0,
            SkipMode::Penalize => skipped
                .saturating_mul(u64::from(self.per_skip))
                .min(u64::from(self.max_total)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentThreshold {
    pub min_score: u8,
    pub max_p0_failures: u32,
    /// `None` leaves P1 failures unbounded for the environment.
    pub max_p1_failures: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadinessThresholds {
    pub staging: EnvironmentThreshold,
    pub canary: EnvironmentThreshold,
    pub production: EnvironmentThreshold,
}

impl ReadinessThresholds {
    #[must_use]
    pub fn threshold(&self, environment: Environment) -> EnvironmentThreshold {
        match environment {
            Environment::Staging => self.staging,
            Environment::Canary => self.canary,
            Environment::Production => self.production,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutPolicy {
    pub page_wait_ms: u64,
    pub button_wait_ms: u64,
    pub workflow_budget_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedactionPolicy {
    pub marker: String,
    #[serde(default)]
    pub extra_patterns: Vec<String>,
}
