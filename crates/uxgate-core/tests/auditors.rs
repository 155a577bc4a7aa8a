// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use uxgate_adapters::{AuthContext, HttpDriver, ScriptedDriver};
use uxgate_core::{audit_button, audit_page, audit_workflow, load_registry, AuditSettings};
use uxgate_model::{AuditOutcome, AuditResult, AuthMode, FailureClass, Registry};

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/portal")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()))
}

fn registry() -> Registry {
    load_registry(
        &fixture("pages.yaml"),
        &fixture("buttons.yaml"),
        &fixture("workflows.yaml"),
    )
    .expect("portal registry")
}

fn driver() -> ScriptedDriver {
    ScriptedDriver::from_yaml(&fixture("replay.yaml")).expect("replay script")
}

fn settings() -> AuditSettings {
    AuditSettings {
        page_wait: Duration::from_millis(5000),
        button_wait: Duration::from_millis(100),
        workflow_budget: Duration::from_secs(60),
    }
}

fn page(id: &str) -> AuditResult {
    let registry = registry();
    let entry = registry
        .pages
        .iter()
        .find(|p| p.page_id.as_str() == id)
        .expect("page entry");
    audit_page(&driver(), "http://portal.test", entry, &AuthContext::anonymous(), &settings())
}

fn button(action: &str) -> AuditResult {
    let registry = registry();
    let entry = registry
        .buttons
        .iter()
        .find(|b| b.action_id.as_str() == action)
        .expect("button entry");
    audit_button(&driver(), "http://portal.test", entry, &AuthContext::anonymous(), &settings())
}

fn workflow(id: &str) -> AuditResult {
    let registry = registry();
    let entry = registry
        .workflows
        .iter()
        .find(|w| w.workflow_id.as_str() == id)
        .expect("workflow entry");
    audit_workflow(&driver(), "http://portal.test", entry, &AuthContext::anonymous(), &settings())
}

fn assert_failed(result: &AuditResult, class: FailureClass) {
    assert_eq!(result.outcome, AuditOutcome::Fail, "{result:?}");
    assert_eq!(result.failure_class, Some(class), "{result:?}");
}

#[test]
fn rendered_and_declared_empty_pages_pass() {
    assert_eq!(page("incidents").outcome, AuditOutcome::Pass);
    assert_eq!(page("empty-list").outcome, AuditOutcome::Pass);
}

#[test]
fn degraded_page_without_visible_degraded_state_fails() {
    let result = page("degraded-list");
    assert_failed(&result, FailureClass::AssertionFailed);
    assert!(result.error.unwrap_or_default().contains("degraded-banner"));
}

#[test]
fn error_render_and_transport_failure_keep_page_criticality() {
    let missing = page("missing");
    assert_failed(&missing, FailureClass::AssertionFailed);
    assert!(missing.error.as_deref().unwrap_or_default().contains("404"));

    let down = page("down");
    assert_failed(&down, FailureClass::DriverError);
    assert_eq!(down.criticality, uxgate_model::Criticality::P0);
}

#[test]
fn unavailable_auth_mode_is_a_skip() {
    let registry = registry();
    let admin = registry
        .pages
        .iter()
        .find(|p| p.auth == AuthMode::JwtAdmin)
        .expect("admin page");
    let ctx = AuthContext::with_credential(AuthMode::JwtAdmin, "token");
    let result = audit_page(&driver(), "http://portal.test", admin, &ctx, &settings());
    assert_eq!(result.outcome, AuditOutcome::Skip);
    assert!(!result.is_executed());
}

#[test]
fn fallback_selector_use_is_recorded() {
    let result = button("create");
    assert_eq!(result.outcome, AuditOutcome::Pass, "{result:?}");
    assert_eq!(result.matched_locator.as_deref(), Some("[data-testid=create]"));
    assert!(result.used_fallback);
    assert!(result.is_link());
}

#[test]
fn network_call_matches_ignoring_query() {
    let result = button("refresh");
    assert_eq!(result.outcome, AuditOutcome::Pass, "{result:?}");
    assert!(!result.used_fallback);
}

#[test]
fn disabled_control_needs_a_reason() {
    assert_eq!(button("export").outcome, AuditOutcome::Pass);
    let unexplained = button("export-unexplained");
    assert_failed(&unexplained, FailureClass::AssertionFailed);
    assert!(unexplained
        .error
        .unwrap_or_default()
        .contains("disabled_reason"));
}

#[test]
fn control_without_effect_is_a_noop() {
    let result = button("archive");
    assert_failed(&result, FailureClass::NoopDetected);
    assert!(result.is_noop());
}

#[test]
fn wrong_effect_is_an_assertion_failure() {
    assert_failed(&button("filter"), FailureClass::AssertionFailed);
}

#[test]
fn slow_control_times_out() {
    assert_failed(&button("slow"), FailureClass::Timeout);
}

#[test]
fn unmatched_locators_fail_as_not_found() {
    let result = button("ghost");
    assert_failed(&result, FailureClass::AssertionFailed);
    assert!(result.error.unwrap_or_default().contains("control not found"));
    assert_eq!(result.matched_locator, None);
}

#[test]
fn page_only_driver_skips_button_audits() {
    let registry = registry();
    let http = HttpDriver::new().expect("http client");
    let result = audit_button(
        &http,
        "http://127.0.0.1:9",
        &registry.buttons[0],
        &AuthContext::anonymous(),
        &settings(),
    );
    assert_eq!(result.outcome, AuditOutcome::Skip);
    assert!(result.is_link());
}

#[test]
fn complete_workflow_passes() {
    let result = workflow("create-incident");
    assert_eq!(result.outcome, AuditOutcome::Pass, "{result:?}");
}

#[test]
fn step_failure_stops_at_that_step() {
    let result = workflow("broken-submit");
    assert_failed(&result, FailureClass::AssertionFailed);
    assert_eq!(result.failed_step, Some(2));
}

#[test]
fn missing_expected_api_fails_an_otherwise_passing_workflow() {
    let result = workflow("missing-api");
    assert_failed(&result, FailureClass::AssertionFailed);
    assert_eq!(result.failed_step, None);
    assert!(result.error.unwrap_or_default().contains("POST /api/audit-log"));
}

#[test]
fn unreachable_success_without_recovery_is_a_dead_end() {
    let result = workflow("dead-end");
    assert_failed(&result, FailureClass::DeadEndDetected);
    assert!(result.is_dead_end());
}

#[test]
fn reachable_recovery_path_is_an_ordinary_failure() {
    let result = workflow("recoverable");
    assert_failed(&result, FailureClass::AssertionFailed);
    assert!(result.error.unwrap_or_default().contains("/help"));
}

#[test]
fn exhausted_budget_is_a_timeout_at_the_next_step() {
    let result = workflow("over-budget");
    assert_failed(&result, FailureClass::Timeout);
    assert_eq!(result.failed_step, Some(2));
    assert!(result.duration_ms < 1400, "{result:?}");
}

#[test]
fn a_step_cannot_outlast_the_workflow_budget() {
    let workflows = r#"
version: 1
p1_workflows:
  - workflow_id: stalled
    name: Stalled page
    criticality: P1
    auth: anon
    max_duration_seconds: 1
    steps:
      - step_id: 1
        action: navigate
        route: /stalled
        exit_criteria: {visible: never-shown}
    success_terminal_state: {visible: never-shown}
"#;
    let registry = load_registry(&fixture("pages.yaml"), &fixture("buttons.yaml"), workflows)
        .expect("registry");
    let driver = ScriptedDriver::from_yaml(
        "version: 1\nroutes:\n  /stalled:\n    delay_ms: 2500\n",
    )
    .expect("replay script");
    let result = audit_workflow(
        &driver,
        "http://portal.test",
        &registry.workflows[0],
        &AuthContext::anonymous(),
        &settings(),
    );
    assert_failed(&result, FailureClass::Timeout);
    assert_eq!(result.failed_step, Some(1));
    assert!(result.duration_ms < 2500, "{result:?}");
    assert!(result.error.unwrap_or_default().contains("budget"));
}
