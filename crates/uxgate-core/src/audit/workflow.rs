// SPDX-License-Identifier: Apache-2.0

use std::time::{Duration, Instant};

use uxgate_adapters::{AuthContext, DriverError, PageRender, UiDriver, UiSession};
use uxgate_model::{AuditKind, AuditResult, FailureClass, StepAction, WorkflowEntry, WorkflowStep};

use super::{capability_skip, criterion_holds, driver_outcome, elapsed_ms, AuditSettings};
use crate::matching::any_request_matches;

/// Where a workflow run stopped.
enum Halt {
    Step(u32, FailureClass, String),
    Terminal(FailureClass, String),
    Driver(u32, DriverError),
}

fn is_interactive(workflow: &WorkflowEntry) -> bool {
    workflow
        .steps
        .iter()
        .any(|s| matches!(s.action, StepAction::Click | StepAction::Fill))
}

fn run_step(
    session: &mut dyn UiSession,
    step: &WorkflowStep,
    settings: &AuditSettings,
) -> Result<Option<String>, DriverError> {
    match step.action {
        StepAction::Navigate => {
            let Some(route) = step.route.as_deref() else {
                return Ok(Some("navigate step has no route".to_string()));
            };
            if let PageRender::Error(detail) = session.navigate(route, settings.page_wait)? {
                return Ok(Some(format!("page {route} failed to render: {detail}")));
            }
        }
        StepAction::Click => {
            let Some(selector) = step.selector.as_deref() else {
                return Ok(Some("click step has no selector".to_string()));
            };
            session.click(selector, settings.button_wait)?;
        }
        StepAction::Fill => {
            for field in &step.form_fields {
                session.fill(&field.selector, &field.value)?;
            }
            if let Some(submit) = step.selector.as_deref() {
                session.click(submit, settings.button_wait)?;
            }
        }
    }
    if let Some(api) = step.expected_api.as_deref() {
        if !any_request_matches(api, &session.observed_requests()) {
            return Ok(Some(format!("expected request {api} was not observed")));
        }
    }
    if !criterion_holds(session, &step.exit_criteria)? {
        return Ok(Some(format!(
            "exit criterion not met: {}",
            step.exit_criteria.describe()
        )));
    }
    Ok(None)
}

fn budget_exceeded(started: Instant, budget: Duration, when: &str) -> Option<String> {
    (started.elapsed() >= budget)
        .then(|| format!("workflow budget of {}s exceeded {when}", budget.as_secs()))
}

/// No single wait may outlast what is left of the workflow budget.
fn capped(settings: &AuditSettings, started: Instant, budget: Duration) -> AuditSettings {
    let remaining = budget.saturating_sub(started.elapsed());
    AuditSettings {
        page_wait: settings.page_wait.min(remaining),
        button_wait: settings.button_wait.min(remaining),
        workflow_budget: budget,
    }
}

fn missing_apis(session: &dyn UiSession, workflow: &WorkflowEntry) -> Vec<String> {
    let observed = session.observed_requests();
    workflow
        .expected_apis
        .iter()
        .filter(|api| !any_request_matches(api, &observed))
        .cloned()
        .collect()
}

fn drive(
    session: &mut dyn UiSession,
    workflow: &WorkflowEntry,
    settings: &AuditSettings,
    started: Instant,
    budget: Duration,
) -> Result<(), Halt> {
    for step in &workflow.steps {
        let label = format!("step {}", step.step_id);
        if let Some(message) = budget_exceeded(started, budget, &format!("before {label}")) {
            return Err(Halt::Step(step.step_id, FailureClass::Timeout, message));
        }
        let outcome = run_step(session, step, &capped(settings, started, budget));
        if let Some(message) = budget_exceeded(started, budget, &format!("during {label}")) {
            return Err(Halt::Step(step.step_id, FailureClass::Timeout, message));
        }
        match outcome {
            Ok(None) => {}
            Ok(Some(message)) => {
                return Err(Halt::Step(
                    step.step_id,
                    FailureClass::AssertionFailed,
                    format!("{label}: {message}"),
                ))
            }
            Err(err) => return Err(Halt::Driver(step.step_id, err)),
        }
    }

    if let Some(message) = budget_exceeded(started, budget, "before the terminal check") {
        return Err(Halt::Terminal(FailureClass::Timeout, message));
    }
    let reached = criterion_holds(session, &workflow.success_terminal_state)
        .map_err(|err| Halt::Terminal(FailureClass::DriverError, err.to_string()))?;
    let missing = missing_apis(session, workflow);
    let missing_note = if missing.is_empty() {
        String::new()
    } else {
        format!("; expected apis not observed: {}", missing.join(", "))
    };

    if reached {
        if missing.is_empty() {
            return Ok(());
        }
        return Err(Halt::Terminal(
            FailureClass::AssertionFailed,
            format!("expected apis not observed: {}", missing.join(", ")),
        ));
    }

    let target = workflow.success_terminal_state.describe();
    let recovered = match workflow.recovery_path.as_deref() {
        Some(path) => matches!(
            session.navigate(path, capped(settings, started, budget).page_wait),
            Ok(PageRender::Rendered | PageRender::Empty | PageRender::Degraded)
        ),
        None => false,
    };
    if recovered {
        let path = workflow.recovery_path.as_deref().unwrap_or_default();
        Err(Halt::Terminal(
            FailureClass::AssertionFailed,
            format!("success state not reached ({target}); recovery via {path}{missing_note}"),
        ))
    } else {
        Err(Halt::Terminal(
            FailureClass::DeadEndDetected,
            format!("success state not reached ({target}) and no recovery path{missing_note}"),
        ))
    }
}

pub fn audit_workflow(
    driver: &dyn UiDriver,
    base_url: &str,
    workflow: &WorkflowEntry,
    auth: &AuthContext,
    settings: &AuditSettings,
) -> AuditResult {
    let id = workflow.workflow_id.as_str();
    let crit = workflow.criticality;
    let caps = driver.capabilities();
    if !caps.navigate {
        return capability_skip(AuditKind::Workflow, id, crit, driver.name(), "navigation");
    }
    if is_interactive(workflow) && !caps.interact {
        return capability_skip(AuditKind::Workflow, id, crit, driver.name(), "interaction");
    }

    let budget = workflow
        .max_duration_seconds
        .map_or(settings.workflow_budget, Duration::from_secs);
    let started = Instant::now();
    let mut session = match driver.open_session(base_url, auth) {
        Ok(session) => session,
        Err(err) => return driver_outcome(AuditKind::Workflow, id, crit, &err),
    };

    let result = match drive(session.as_mut(), workflow, settings, started, budget) {
        Ok(()) => AuditResult::pass(AuditKind::Workflow, id, crit),
        Err(Halt::Step(step_id, class, message)) => {
            AuditResult::fail(AuditKind::Workflow, id, crit, class, &message).at_step(step_id)
        }
        Err(Halt::Terminal(class, message)) => {
            AuditResult::fail(AuditKind::Workflow, id, crit, class, &message)
        }
        Err(Halt::Driver(step_id, err)) => {
            let result = driver_outcome(AuditKind::Workflow, id, crit, &err);
            if result.is_executed() {
                result.at_step(step_id)
            } else {
                result
            }
        }
    };
    result.with_duration_ms(elapsed_ms(started))
}
