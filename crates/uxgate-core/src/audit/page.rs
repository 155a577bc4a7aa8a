// SPDX-License-Identifier: Apache-2.0

use std::time::Instant;

use uxgate_adapters::{AuthContext, PageRender, UiDriver};
use uxgate_model::{AuditKind, AuditResult, FailureClass, PageEntry};

use super::{capability_skip, driver_outcome, elapsed_ms, AuditSettings};

fn expected_state(
    page: &PageEntry,
    session: &mut dyn uxgate_adapters::UiSession,
    label: &str,
    state: Option<&str>,
) -> AuditResult {
    let id = page.page_id.as_str();
    let Some(state) = state else {
        return AuditResult::fail(
            AuditKind::Page,
            id,
            page.criticality,
            FailureClass::AssertionFailed,
            &format!("page rendered {label} but declares no expected_{label}_state"),
        );
    };
    match session.is_visible(state) {
        Ok(true) => AuditResult::pass(AuditKind::Page, id, page.criticality),
        Ok(false) => AuditResult::fail(
            AuditKind::Page,
            id,
            page.criticality,
            FailureClass::AssertionFailed,
            &format!("page rendered {label} but {state} is not visible"),
        ),
        Err(err) => driver_outcome(AuditKind::Page, id, page.criticality, &err),
    }
}

pub fn audit_page(
    driver: &dyn UiDriver,
    base_url: &str,
    page: &PageEntry,
    auth: &AuthContext,
    settings: &AuditSettings,
) -> AuditResult {
    let id = page.page_id.as_str();
    if !driver.capabilities().navigate {
        return capability_skip(AuditKind::Page, id, page.criticality, driver.name(), "navigation");
    }
    let started = Instant::now();
    let mut session = match driver.open_session(base_url, auth) {
        Ok(session) => session,
        Err(err) => return driver_outcome(AuditKind::Page, id, page.criticality, &err),
    };

    let result = match session.navigate(&page.route, settings.page_wait) {
        Ok(PageRender::Rendered) => AuditResult::pass(AuditKind::Page, id, page.criticality),
        Ok(PageRender::Empty) => expected_state(
            page,
            session.as_mut(),
            "empty",
            page.expected_empty_state.as_deref(),
        ),
        Ok(PageRender::Degraded) => expected_state(
            page,
            session.as_mut(),
            "degraded",
            page.expected_degraded_state.as_deref(),
        ),
        Ok(PageRender::Error(detail)) => AuditResult::fail(
            AuditKind::Page,
            id,
            page.criticality,
            FailureClass::AssertionFailed,
            &format!("page {} failed to render: {detail}", page.route),
        ),
        Err(err) => driver_outcome(AuditKind::Page, id, page.criticality, &err),
    };
    result.with_duration_ms(elapsed_ms(started))
}
