// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};

mod audit;
mod registry;
mod report;

pub use audit::{AuditKind, AuditOutcome, AuditResult, FailureClass};
pub use registry::{
    ButtonEntry, ButtonExpectation, Criterion, FormField, PageEntry, Registry, StepAction,
    WorkflowEntry, WorkflowStep,
};
pub use report::{
    report_json_schema, CoverageReport, FailureRow, GateStatus, OutcomeCounts, ReadinessRow,
    ReportSummary, ThresholdRow,
};

pub const CRATE_NAME: &str = "uxgate-model";

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'
}

/// Identifier of a registry entry (page, action, workflow).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    pub const MAX_LEN: usize = 128;

    pub fn parse(value: &str) -> Result<Self, String> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err("id cannot be empty".to_string());
        }
        if raw.len() > Self::MAX_LEN {
            return Err(format!("id `{raw}` exceeds max length {}", Self::MAX_LEN));
        }
        if !raw.chars().all(is_id_char) {
            return Err(format!(
                "invalid id `{raw}`: expected ascii letters, digits, `-`, `_` or `.`"
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    pub fn parse(value: &str) -> Result<Self, String> {
        let raw = value.trim();
        if raw.is_empty() {
            return Err("run id cannot be empty".to_string());
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(format!(
                "invalid run id `{raw}`: expected lowercase snake_case"
            ));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn from_seed(seed: &str) -> Self {
        let mut out = String::with_capacity(seed.len());
        for c in seed.chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c.to_ascii_lowercase());
            } else {
                out.push('_');
            }
        }
        let compact = out
            .split('_')
            .filter(|seg| !seg.is_empty())
            .collect::<Vec<_>>()
            .join("_");
        if compact.is_empty() {
            return Self("run".to_string());
        }
        Self(compact)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity class of a registry entry. `P0` is the most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Criticality {
    P0,
    P1,
    P2,
}

impl Criticality {
    pub const ALL: [Self; 3] = [Self::P0, Self::P1, Self::P2];

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "P0" | "p0" => Ok(Self::P0),
            "P1" | "p1" => Ok(Self::P1),
            "P2" | "p2" => Ok(Self::P2),
            other => Err(format!("invalid criticality `{other}`: expected P0, P1 or P2")),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auth context a page, button or workflow must be audited under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    Anon,
    PortalSso,
    JwtAdmin,
}

impl AuthMode {
    pub const ALL: [Self; 3] = [Self::Anon, Self::PortalSso, Self::JwtAdmin];

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "anon" => Ok(Self::Anon),
            "portal_sso" => Ok(Self::PortalSso),
            "jwt_admin" => Ok(Self::JwtAdmin),
            other => Err(format!(
                "invalid auth `{other}`: expected anon, portal_sso or jwt_admin"
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Anon => "anon",
            Self::PortalSso => "portal_sso",
            Self::JwtAdmin => "jwt_admin",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedOutcome {
    Navigation,
    NetworkCall,
    UiState,
    Disabled,
}

impl ExpectedOutcome {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "navigation" => Ok(Self::Navigation),
            "network_call" => Ok(Self::NetworkCall),
            "ui_state" => Ok(Self::UiState),
            "disabled" => Ok(Self::Disabled),
            other => Err(format!(
                "invalid expected_outcome `{other}`: expected navigation, network_call, ui_state or disabled"
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Navigation => "navigation",
            Self::NetworkCall => "network_call",
            Self::UiState => "ui_state",
            Self::Disabled => "disabled",
        }
    }
}

/// Release environments the readiness matrix is evaluated for, loosest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Staging,
    Canary,
    Production,
}

impl Environment {
    pub const ALL: [Self; 3] = [Self::Staging, Self::Canary, Self::Production];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Staging => "staging",
            Self::Canary => "canary",
            Self::Production => "production",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Staging => "Staging",
            Self::Canary => "Canary",
            Self::Production => "Production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_id_validation() {
        assert!(EntryId::parse("incidents-list").is_ok());
        assert!(EntryId::parse("portal.report_incident").is_ok());
        assert!(EntryId::parse("incidents list").is_err());
        assert!(EntryId::parse("a:b").is_err());
        assert!(EntryId::parse("  ").is_err());
    }

    #[test]
    fn run_id_validation_and_seed() {
        assert!(RunId::parse("ux_coverage_001").is_ok());
        assert!(RunId::parse("ux-coverage").is_err());
        let seeded = RunId::from_seed("UX Coverage: 2026-01-26");
        assert_eq!(seeded.as_str(), "ux_coverage_2026_01_26");
        assert_eq!(RunId::from_seed("::").as_str(), "run");
    }

    #[test]
    fn criticality_is_a_closed_enum() {
        assert_eq!(Criticality::parse("P0"), Ok(Criticality::P0));
        assert_eq!(Criticality::parse("p2"), Ok(Criticality::P2));
        assert!(Criticality::parse("P3").is_err());
        assert!(Criticality::parse("").is_err());
        assert!(Criticality::P0 < Criticality::P1);
    }

    #[test]
    fn auth_mode_is_a_closed_enum() {
        assert_eq!(AuthMode::parse("portal_sso"), Ok(AuthMode::PortalSso));
        assert!(AuthMode::parse("sso").is_err());
        assert_eq!(
            serde_json::to_value(AuthMode::JwtAdmin).expect("encode"),
            serde_json::json!("jwt_admin")
        );
    }

    #[test]
    fn environments_are_ordered_loosest_first() {
        assert_eq!(
            Environment::ALL,
            [Environment::Staging, Environment::Canary, Environment::Production]
        );
    }
}
