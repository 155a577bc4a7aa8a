// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{AuditKind, AuthMode, Criticality, EntryId, ExpectedOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub page_id: EntryId,
    pub route: String,
    pub auth: AuthMode,
    pub criticality: Criticality,
    pub expected_empty_state: Option<String>,
    pub expected_degraded_state: Option<String>,
}

/// Contractual effect of triggering a button, with the data the assertion needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ButtonExpectation {
    Navigation { route: String },
    NetworkCall { api: String },
    UiState { state: String },
    Disabled,
}

impl ButtonExpectation {
    #[must_use]
    pub fn outcome(&self) -> ExpectedOutcome {
        match self {
            Self::Navigation { .. } => ExpectedOutcome::Navigation,
            Self::NetworkCall { .. } => ExpectedOutcome::NetworkCall,
            Self::UiState { .. } => ExpectedOutcome::UiState,
            Self::Disabled => ExpectedOutcome::Disabled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonEntry {
    pub page_id: EntryId,
    pub action_id: EntryId,
    /// Route of the owning page; the control is looked up there.
    pub route: String,
    pub auth: AuthMode,
    pub selector: String,
    pub fallback_selector: Option<String>,
    pub criticality: Criticality,
    pub expected: ButtonExpectation,
    pub disabled_reason: Option<String>,
}

impl ButtonEntry {
    /// `<page_id>:<action_id>`, unique across the button registry.
    #[must_use]
    pub fn id(&self) -> String {
        format!("{}:{}", self.page_id, self.action_id)
    }

    /// Candidate locators in the order they are tried.
    #[must_use]
    pub fn locators(&self) -> Vec<&str> {
        let mut out = vec![self.selector.as_str()];
        if let Some(fallback) = self.fallback_selector.as_deref() {
            if fallback != self.selector {
                out.push(fallback);
            }
        }
        out
    }
}

/// Condition evaluated against the live session after a step, or at the end
/// of a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    Route(String),
    Visible(String),
    Api(String),
}

impl Criterion {
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Route(route) => format!("route {route}"),
            Self::Visible(state) => format!("visible {state}"),
            Self::Api(api) => format!("api {api}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Navigate,
    Click,
    Fill,
}

impl StepAction {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "navigate" => Ok(Self::Navigate),
            "click" => Ok(Self::Click),
            "fill" => Ok(Self::Fill),
            other => Err(format!(
                "invalid action `{other}`: expected navigate, click or fill"
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Navigate => "navigate",
            Self::Click => "click",
            Self::Fill => "fill",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormField {
    pub selector: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub step_id: u32,
    pub action: StepAction,
    pub route: Option<String>,
    pub selector: Option<String>,
    pub form_fields: Vec<FormField>,
    pub exit_criteria: Criterion,
    pub expected_api: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEntry {
    pub workflow_id: EntryId,
    pub name: String,
    pub criticality: Criticality,
    pub auth: AuthMode,
    /// Sorted by ascending `step_id`.
    pub steps: Vec<WorkflowStep>,
    pub success_terminal_state: Criterion,
    pub recovery_path: Option<String>,
    pub expected_apis: Vec<String>,
    pub max_duration_seconds: Option<u64>,
}

/// The three registries, flattened into their audit order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    pub pages: Vec<PageEntry>,
    pub buttons: Vec<ButtonEntry>,
    pub workflows: Vec<WorkflowEntry>,
}

impl Registry {
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.pages.len() + self.buttons.len() + self.workflows.len()
    }

    /// Every `(kind, id)` pair a complete run must produce a result for.
    #[must_use]
    pub fn expected_ids(&self) -> BTreeSet<(AuditKind, String)> {
        let pages = self
            .pages
            .iter()
            .map(|p| (AuditKind::Page, p.page_id.to_string()));
        let buttons = self.buttons.iter().map(|b| (AuditKind::Button, b.id()));
        let workflows = self
            .workflows
            .iter()
            .map(|w| (AuditKind::Workflow, w.workflow_id.to_string()));
        pages.chain(buttons).chain(workflows).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button(fallback: Option<&str>) -> ButtonEntry {
        ButtonEntry {
            page_id: EntryId::parse("incidents").expect("page id"),
            action_id: EntryId::parse("create").expect("action id"),
            route: "/incidents".to_string(),
            auth: AuthMode::JwtAdmin,
            selector: "[data-testid=create]".to_string(),
            fallback_selector: fallback.map(str::to_string),
            criticality: Criticality::P1,
            expected: ButtonExpectation::UiState {
                state: "incident-modal".to_string(),
            },
            disabled_reason: None,
        }
    }

    #[test]
    fn button_id_joins_page_and_action() {
        assert_eq!(button(None).id(), "incidents:create");
    }

    #[test]
    fn locators_keep_primary_first_and_skip_duplicate_fallback() {
        assert_eq!(
            button(Some("button:has-text('New')")).locators(),
            vec!["[data-testid=create]", "button:has-text('New')"]
        );
        assert_eq!(
            button(Some("[data-testid=create]")).locators(),
            vec!["[data-testid=create]"]
        );
    }

    #[test]
    fn criterion_serializes_as_tagged_map() {
        let value = serde_json::to_value(Criterion::Route("/done".to_string())).expect("encode");
        assert_eq!(value, serde_json::json!({"route": "/done"}));
    }
}
