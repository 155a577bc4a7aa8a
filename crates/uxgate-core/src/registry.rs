// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};
use uxgate_model::{
    AuthMode, ButtonEntry, ButtonExpectation, Criterion, Criticality, EntryId, ExpectedOutcome,
    FormField, PageEntry, Registry, StepAction, WorkflowEntry, WorkflowStep,
};

use crate::error::{GateError, RegistryParseError};

pub const REGISTRY_VERSION: u32 = 1;

const PAGES: &str = "pages";
const BUTTONS: &str = "buttons";
const WORKFLOWS: &str = "workflows";

#[derive(Debug, Clone)]
pub struct RegistryPaths {
    pub pages: PathBuf,
    pub buttons: PathBuf,
    pub workflows: PathBuf,
}

/// Raw text of the three registry documents.
#[derive(Debug, Clone)]
pub struct RegistrySources {
    pub pages: String,
    pub buttons: String,
    pub workflows: String,
}

impl RegistrySources {
    pub fn read(paths: &RegistryPaths) -> Result<Self, GateError> {
        let read = |path: &Path| {
            fs::read_to_string(path).map_err(|err| GateError::Read {
                path: path.to_path_buf(),
                detail: err.to_string(),
            })
        };
        Ok(Self {
            pages: read(&paths.pages)?,
            buttons: read(&paths.buttons)?,
            workflows: read(&paths.workflows)?,
        })
    }

    /// sha256 over the three documents, each prefixed by its registry name.
    #[must_use]
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for (name, text) in [
            (PAGES, &self.pages),
            (BUTTONS, &self.buttons),
            (WORKFLOWS, &self.workflows),
        ] {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
            hasher.update(text.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }

    pub fn load(&self) -> Result<Registry, RegistryParseError> {
        load_registry(&self.pages, &self.buttons, &self.workflows)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPagesDoc {
    version: u32,
    pages: Vec<RawPage>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPage {
    page_id: String,
    route: String,
    auth: String,
    criticality: Option<String>,
    expected_empty_state: Option<String>,
    expected_degraded_state: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawButtonsDoc {
    version: u32,
    pages: Vec<RawButtonGroup>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawButtonGroup {
    page_id: String,
    buttons: Vec<RawButton>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawButton {
    action_id: String,
    selector: String,
    fallback_selector: Option<String>,
    criticality: Option<String>,
    expected_outcome: String,
    expected_route: Option<String>,
    expected_api: Option<String>,
    expected_state: Option<String>,
    disabled_reason: Option<String>,
    auth: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWorkflowsDoc {
    version: u32,
    #[serde(default)]
    p0_workflows: Vec<RawWorkflow>,
    #[serde(default)]
    p1_workflows: Vec<RawWorkflow>,
    #[serde(default)]
    p2_workflows: Vec<RawWorkflow>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawWorkflow {
    workflow_id: String,
    name: String,
    criticality: Option<String>,
    #[serde(alias = "auth_type")]
    auth: String,
    steps: Vec<RawStep>,
    success_terminal_state: RawCriterion,
    recovery_path: Option<String>,
    #[serde(default)]
    expected_apis: Vec<String>,
    max_duration_seconds: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawStep {
    step_id: u32,
    action: String,
    route: Option<String>,
    selector: Option<String>,
    #[serde(default)]
    form_fields: Vec<RawFormField>,
    exit_criteria: RawCriterion,
    expected_api: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFormField {
    selector: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCriterion {
    route: Option<String>,
    visible: Option<String>,
    api: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_text(
    registry: &'static str,
    path: &str,
    field: &str,
    value: &str,
) -> Result<String, RegistryParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RegistryParseError::new(
            registry,
            format!("{path}.{field}"),
            "must not be empty",
        ));
    }
    Ok(trimmed.to_string())
}

fn parse_id(
    registry: &'static str,
    path: &str,
    field: &str,
    raw: &str,
) -> Result<EntryId, RegistryParseError> {
    EntryId::parse(raw)
        .map_err(|err| RegistryParseError::new(registry, format!("{path}.{field}"), err))
}

fn parse_criticality(
    registry: &'static str,
    path: &str,
    raw: Option<&str>,
) -> Result<Criticality, RegistryParseError> {
    let raw = raw.ok_or_else(|| {
        RegistryParseError::new(registry, format!("{path}.criticality"), "missing criticality")
    })?;
    Criticality::parse(raw)
        .map_err(|err| RegistryParseError::new(registry, format!("{path}.criticality"), err))
}

fn parse_auth(
    registry: &'static str,
    path: &str,
    raw: &str,
) -> Result<AuthMode, RegistryParseError> {
    AuthMode::parse(raw)
        .map_err(|err| RegistryParseError::new(registry, format!("{path}.auth"), err))
}

fn parse_criterion(
    registry: &'static str,
    path: &str,
    raw: RawCriterion,
) -> Result<Criterion, RegistryParseError> {
    let set = [
        non_empty(raw.route).map(Criterion::Route),
        non_empty(raw.visible).map(Criterion::Visible),
        non_empty(raw.api).map(Criterion::Api),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();
    match <[Criterion; 1]>::try_from(set) {
        Ok([criterion]) => Ok(criterion),
        Err(_) => Err(RegistryParseError::new(
            registry,
            path,
            "exactly one of route, visible or api is required",
        )),
    }
}

fn check_version(registry: &'static str, version: u32) -> Result<(), RegistryParseError> {
    if version != REGISTRY_VERSION {
        return Err(RegistryParseError::new(
            registry,
            "version",
            format!("unsupported version {version} (expected {REGISTRY_VERSION})"),
        ));
    }
    Ok(())
}

fn decode<T: for<'de> Deserialize<'de>>(
    registry: &'static str,
    text: &str,
) -> Result<T, RegistryParseError> {
    serde_yaml::from_str(text)
        .map_err(|err| RegistryParseError::new(registry, "", format!("invalid document: {err}")))
}

pub fn parse_pages(text: &str) -> Result<Vec<PageEntry>, RegistryParseError> {
    let raw: RawPagesDoc = decode(PAGES, text)?;
    check_version(PAGES, raw.version)?;
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(raw.pages.len());
    for (idx, row) in raw.pages.into_iter().enumerate() {
        let path = format!("pages[{idx}]");
        let page_id = parse_id(PAGES, &path, "page_id", &row.page_id)?;
        if !seen.insert(page_id.clone()) {
            return Err(RegistryParseError::new(
                PAGES,
                format!("{path}.page_id"),
                format!("duplicate page_id `{page_id}`"),
            ));
        }
        out.push(PageEntry {
            route: required_text(PAGES, &path, "route", &row.route)?,
            auth: parse_auth(PAGES, &path, &row.auth)?,
            criticality: parse_criticality(PAGES, &path, row.criticality.as_deref())?,
            expected_empty_state: non_empty(row.expected_empty_state),
            expected_degraded_state: non_empty(row.expected_degraded_state),
            page_id,
        });
    }
    Ok(out)
}

fn button_expectation(
    path: &str,
    row: &RawButton,
) -> Result<ButtonExpectation, RegistryParseError> {
    let outcome = ExpectedOutcome::parse(&row.expected_outcome).map_err(|err| {
        RegistryParseError::new(BUTTONS, format!("{path}.expected_outcome"), err)
    })?;
    let need = |value: &Option<String>, field: &str| {
        non_empty(value.clone()).ok_or_else(|| {
            RegistryParseError::new(
                BUTTONS,
                format!("{path}.{field}"),
                format!("{field} is required for expected_outcome {}", outcome.as_str()),
            )
        })
    };
    Ok(match outcome {
        ExpectedOutcome::Navigation => ButtonExpectation::Navigation {
            route: need(&row.expected_route, "expected_route")?,
        },
        ExpectedOutcome::NetworkCall => ButtonExpectation::NetworkCall {
            api: need(&row.expected_api, "expected_api")?,
        },
        ExpectedOutcome::UiState => ButtonExpectation::UiState {
            state: need(&row.expected_state, "expected_state")?,
        },
        ExpectedOutcome::Disabled => ButtonExpectation::Disabled,
    })
}

/// Buttons inherit route and auth from their page unless they override auth.
pub fn parse_buttons(
    text: &str,
    pages: &[PageEntry],
) -> Result<Vec<ButtonEntry>, RegistryParseError> {
    let raw: RawButtonsDoc = decode(BUTTONS, text)?;
    check_version(BUTTONS, raw.version)?;
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for (gidx, group) in raw.pages.into_iter().enumerate() {
        let gpath = format!("pages[{gidx}]");
        let page_id = parse_id(BUTTONS, &gpath, "page_id", &group.page_id)?;
        let page = pages.iter().find(|p| p.page_id == page_id).ok_or_else(|| {
            RegistryParseError::new(
                BUTTONS,
                format!("{gpath}.page_id"),
                format!("page `{page_id}` is not declared in the page registry"),
            )
        })?;
        for (bidx, row) in group.buttons.into_iter().enumerate() {
            let path = format!("{gpath}.buttons[{bidx}]");
            let action_id = parse_id(BUTTONS, &path, "action_id", &row.action_id)?;
            let id = format!("{page_id}:{action_id}");
            if !seen.insert(id.clone()) {
                return Err(RegistryParseError::new(
                    BUTTONS,
                    format!("{path}.action_id"),
                    format!("duplicate button `{id}`"),
                ));
            }
            let auth = match row.auth.as_deref() {
                Some(raw_auth) => parse_auth(BUTTONS, &path, raw_auth)?,
                None => page.auth,
            };
            out.push(ButtonEntry {
                page_id: page_id.clone(),
                route: page.route.clone(),
                auth,
                selector: required_text(BUTTONS, &path, "selector", &row.selector)?,
                fallback_selector: non_empty(row.fallback_selector.clone()),
                criticality: parse_criticality(BUTTONS, &path, row.criticality.as_deref())?,
                expected: button_expectation(&path, &row)?,
                disabled_reason: non_empty(row.disabled_reason),
                action_id,
            });
        }
    }
    Ok(out)
}

fn parse_step(path: &str, row: RawStep) -> Result<WorkflowStep, RegistryParseError> {
    let action = StepAction::parse(&row.action)
        .map_err(|err| RegistryParseError::new(WORKFLOWS, format!("{path}.action"), err))?;
    let route = non_empty(row.route);
    let selector = non_empty(row.selector);
    let form_fields = row
        .form_fields
        .into_iter()
        .enumerate()
        .map(|(fidx, field)| {
            Ok(FormField {
                selector: required_text(
                    WORKFLOWS,
                    &format!("{path}.form_fields[{fidx}]"),
                    "selector",
                    &field.selector,
                )?,
                value: field.value,
            })
        })
        .collect::<Result<Vec<_>, RegistryParseError>>()?;
    let missing = match action {
        StepAction::Navigate if route.is_none() => Some("navigate step requires route"),
        StepAction::Click if selector.is_none() => Some("click step requires selector"),
        StepAction::Fill if form_fields.is_empty() => {
            Some("fill step requires at least one form field")
        }
        _ => None,
    };
    if let Some(message) = missing {
        return Err(RegistryParseError::new(WORKFLOWS, path, message));
    }
    Ok(WorkflowStep {
        step_id: row.step_id,
        action,
        route,
        selector,
        form_fields,
        exit_criteria: parse_criterion(
            WORKFLOWS,
            &format!("{path}.exit_criteria"),
            row.exit_criteria,
        )?,
        expected_api: non_empty(row.expected_api),
    })
}

fn parse_workflow(
    path: &str,
    group: Criticality,
    row: RawWorkflow,
) -> Result<WorkflowEntry, RegistryParseError> {
    let workflow_id = parse_id(WORKFLOWS, path, "workflow_id", &row.workflow_id)?;
    let criticality = parse_criticality(WORKFLOWS, path, row.criticality.as_deref())?;
    if criticality != group {
        return Err(RegistryParseError::new(
            WORKFLOWS,
            format!("{path}.criticality"),
            format!("criticality {criticality} listed under the {group} group"),
        ));
    }
    if row.steps.is_empty() {
        return Err(RegistryParseError::new(
            WORKFLOWS,
            format!("{path}.steps"),
            "workflow requires at least one step",
        ));
    }
    if row.max_duration_seconds == Some(0) {
        return Err(RegistryParseError::new(
            WORKFLOWS,
            format!("{path}.max_duration_seconds"),
            "must be > 0",
        ));
    }
    let mut step_ids = BTreeSet::new();
    let mut steps = Vec::with_capacity(row.steps.len());
    for (sidx, step) in row.steps.into_iter().enumerate() {
        let spath = format!("{path}.steps[{sidx}]");
        if !step_ids.insert(step.step_id) {
            return Err(RegistryParseError::new(
                WORKFLOWS,
                format!("{spath}.step_id"),
                format!("duplicate step_id {}", step.step_id),
            ));
        }
        steps.push(parse_step(&spath, step)?);
    }
    steps.sort_by_key(|step| step.step_id);
    Ok(WorkflowEntry {
        name: required_text(WORKFLOWS, path, "name", &row.name)?,
        auth: parse_auth(WORKFLOWS, path, &row.auth)?,
        success_terminal_state: parse_criterion(
            WORKFLOWS,
            &format!("{path}.success_terminal_state"),
            row.success_terminal_state,
        )?,
        recovery_path: non_empty(row.recovery_path),
        expected_apis: row
            .expected_apis
            .into_iter()
            .filter_map(|api| non_empty(Some(api)))
            .collect(),
        max_duration_seconds: row.max_duration_seconds,
        workflow_id,
        criticality,
        steps,
    })
}

/// Flattens the P0, P1 and P2 groups, in that order.
pub fn parse_workflows(text: &str) -> Result<Vec<WorkflowEntry>, RegistryParseError> {
    let raw: RawWorkflowsDoc = decode(WORKFLOWS, text)?;
    check_version(WORKFLOWS, raw.version)?;
    let groups = [
        ("p0_workflows", Criticality::P0, raw.p0_workflows),
        ("p1_workflows", Criticality::P1, raw.p1_workflows),
        ("p2_workflows", Criticality::P2, raw.p2_workflows),
    ];
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for (group_name, group, rows) in groups {
        for (idx, row) in rows.into_iter().enumerate() {
            let path = format!("{group_name}[{idx}]");
            let entry = parse_workflow(&path, group, row)?;
            if !seen.insert(entry.workflow_id.clone()) {
                return Err(RegistryParseError::new(
                    WORKFLOWS,
                    format!("{path}.workflow_id"),
                    format!("duplicate workflow_id `{}`", entry.workflow_id),
                ));
            }
            out.push(entry);
        }
    }
    Ok(out)
}

pub fn load_registry(
    pages: &str,
    buttons: &str,
    workflows: &str,
) -> Result<Registry, RegistryParseError> {
    let pages = parse_pages(pages)?;
    let buttons = parse_buttons(buttons, &pages)?;
    let workflows = parse_workflows(workflows)?;
    Ok(Registry {
        pages,
        buttons,
        workflows,
    })
}

/// One line per entry: `kind<TAB>id<TAB>criticality<TAB>auth<TAB>detail`.
pub fn list_output(registry: &Registry) -> String {
    let pages = registry.pages.iter().map(|p| {
        format!(
            "page\t{}\t{}\t{}\t{}",
            p.page_id, p.criticality, p.auth, p.route
        )
    });
    let buttons = registry.buttons.iter().map(|b| {
        format!(
            "button\t{}\t{}\t{}\t{}",
            b.id(),
            b.criticality,
            b.auth,
            b.expected.outcome().as_str()
        )
    });
    let workflows = registry.workflows.iter().map(|w| {
        format!(
            "workflow\t{}\t{}\t{}\t{} steps",
            w.workflow_id,
            w.criticality,
            w.auth,
            w.steps.len()
        )
    });
    pages
        .chain(buttons)
        .chain(workflows)
        .collect::<Vec<_>>()
        .join("\n")
}
