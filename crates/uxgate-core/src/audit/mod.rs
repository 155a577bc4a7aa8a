// SPDX-License-Identifier: Apache-2.0

//! Page, button and workflow auditors. Each is a pure function of the driver,
//! the registry entry, the auth context and the target base URL.

use std::time::Duration;

use uxgate_adapters::{DriverError, UiSession};
use uxgate_model::{AuditKind, AuditResult, Criterion, Criticality, FailureClass};
use uxgate_policies::TimeoutPolicy;

use crate::matching::{any_request_matches, route_matches};

mod button;
mod page;
mod workflow;

pub use button::audit_button;
pub use page::audit_page;
pub use workflow::audit_workflow;

/// Bounded waits applied to each audited interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditSettings {
    pub page_wait: Duration,
    pub button_wait: Duration,
    pub workflow_budget: Duration,
}

impl AuditSettings {
    #[must_use]
    pub fn from_policy(timeouts: &TimeoutPolicy) -> Self {
        Self {
            page_wait: Duration::from_millis(timeouts.page_wait_ms),
            button_wait: Duration::from_millis(timeouts.button_wait_ms),
            workflow_budget: Duration::from_secs(timeouts.workflow_budget_secs),
        }
    }
}

/// Precondition errors skip; timeouts and other driver errors fail.
pub(crate) fn driver_outcome(
    kind: AuditKind,
    id: &str,
    criticality: Criticality,
    err: &DriverError,
) -> AuditResult {
    if err.is_precondition() {
        return AuditResult::skip(kind, id, criticality, &err.to_string());
    }
    let class = match err {
        DriverError::Timeout { .. } => FailureClass::Timeout,
        DriverError::ControlNotFound { .. } => FailureClass::AssertionFailed,
        _ => FailureClass::DriverError,
    };
    AuditResult::fail(kind, id, criticality, class, &err.to_string())
}

pub(crate) fn capability_skip(
    kind: AuditKind,
    id: &str,
    criticality: Criticality,
    driver: &str,
    capability: &str,
) -> AuditResult {
    AuditResult::skip(
        kind,
        id,
        criticality,
        &format!("driver {driver} does not support {capability}"),
    )
}

pub(crate) fn criterion_holds(
    session: &mut dyn UiSession,
    criterion: &Criterion,
) -> Result<bool, DriverError> {
    match criterion {
        Criterion::Route(route) => Ok(route_matches(route, &session.current_route())),
        Criterion::Visible(state) => session.is_visible(state),
        Criterion::Api(api) => Ok(any_request_matches(api, &session.observed_requests())),
    }
}

pub(crate) fn elapsed_ms(started: std::time::Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
