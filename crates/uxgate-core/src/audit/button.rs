// SPDX-License-Identifier: Apache-2.0

use std::time::Instant;

use uxgate_adapters::{AuthContext, ControlState, DriverError, PageRender, UiDriver, UiSession};
use uxgate_model::{AuditKind, AuditResult, ButtonEntry, ButtonExpectation, FailureClass};

use super::{capability_skip, driver_outcome, elapsed_ms, AuditSettings};
use crate::matching::{any_request_matches, route_matches};

/// First candidate locator that resolves to a control, with its index.
fn locate(
    session: &mut dyn UiSession,
    button: &ButtonEntry,
) -> Result<Option<(usize, String, ControlState)>, DriverError> {
    for (idx, locator) in button.locators().into_iter().enumerate() {
        if let Some(state) = session.find_control(locator)? {
            return Ok(Some((idx, locator.to_string(), state)));
        }
    }
    Ok(None)
}

fn check_effect(
    session: &mut dyn UiSession,
    button: &ButtonEntry,
    locator: &str,
    settings: &AuditSettings,
) -> Result<Option<(FailureClass, String)>, DriverError> {
    let effects = session.click(locator, settings.button_wait)?;
    if effects.is_noop() {
        return Ok(Some((
            FailureClass::NoopDetected,
            format!(
                "no route change, request or ui state within {}ms",
                settings.button_wait.as_millis()
            ),
        )));
    }
    let mismatch = match &button.expected {
        ButtonExpectation::Navigation { route } => {
            let actual = effects
                .route_after
                .clone()
                .unwrap_or_else(|| session.current_route());
            (!route_matches(route, &actual))
                .then(|| format!("expected navigation to {route}, landed on {actual}"))
        }
        ButtonExpectation::NetworkCall { api } => {
            (!any_request_matches(api, &effects.requests)).then(|| {
                let seen = if effects.requests.is_empty() {
                    "none".to_string()
                } else {
                    effects.requests.join(", ")
                };
                format!("expected request {api}, observed {seen}")
            })
        }
        ButtonExpectation::UiState { state } => {
            let shown = effects.states.iter().any(|s| s == state) || session.is_visible(state)?;
            (!shown).then(|| format!("expected ui state {state} to become visible"))
        }
        ButtonExpectation::Disabled => None,
    };
    Ok(mismatch.map(|message| (FailureClass::AssertionFailed, message)))
}

fn audit_on_session(
    session: &mut dyn UiSession,
    button: &ButtonEntry,
    settings: &AuditSettings,
) -> Result<AuditResult, DriverError> {
    let id = button.id();
    let crit = button.criticality;
    let fail =
        |class, message: &str| AuditResult::fail(AuditKind::Button, &id, crit, class, message);

    if let PageRender::Error(detail) = session.navigate(&button.route, settings.page_wait)? {
        return Ok(fail(
            FailureClass::AssertionFailed,
            &format!("page {} failed to render: {detail}", button.route),
        ));
    }

    let Some((idx, locator, control)) = locate(session, button)? else {
        return Ok(fail(
            FailureClass::AssertionFailed,
            &format!("control not found: {}", button.locators().join(" | ")),
        ));
    };

    let result = if button.expected == ButtonExpectation::Disabled {
        let has_reason = button
            .disabled_reason
            .as_deref()
            .is_some_and(|r| !r.trim().is_empty());
        if control.enabled {
            fail(FailureClass::AssertionFailed, "control is interactive but declared disabled")
        } else if !has_reason {
            fail(FailureClass::AssertionFailed, "disabled control has no disabled_reason")
        } else {
            AuditResult::pass(AuditKind::Button, &id, crit)
        }
    } else if !control.enabled {
        fail(
            FailureClass::AssertionFailed,
            &format!("control is disabled, expected {}", button.expected.outcome().as_str()),
        )
    } else {
        match check_effect(session, button, &locator, settings)? {
            Some((class, message)) => fail(class, &message),
            None => AuditResult::pass(AuditKind::Button, &id, crit),
        }
    };
    Ok(result.with_locator(&locator, idx > 0))
}

pub fn audit_button(
    driver: &dyn UiDriver,
    base_url: &str,
    button: &ButtonEntry,
    auth: &AuthContext,
    settings: &AuditSettings,
) -> AuditResult {
    let id = button.id();
    let expected = button.expected.outcome();
    if !driver.capabilities().interact {
        return capability_skip(
            AuditKind::Button,
            &id,
            button.criticality,
            driver.name(),
            "interaction",
        )
        .expecting(expected);
    }
    let started = Instant::now();
    let outcome = driver
        .open_session(base_url, auth)
        .and_then(|mut session| audit_on_session(session.as_mut(), button, settings));
    match outcome {
        Ok(result) => result,
        Err(err) => driver_outcome(AuditKind::Button, &id, button.criticality, &err),
    }
    .expecting(expected)
    .with_duration_ms(elapsed_ms(started))
}
