// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::info;
use uxgate_adapters::{AuthFixtures, UiDriver};
use uxgate_model::{
    AuditKind, AuditResult, AuthMode, ButtonEntry, Criticality, FailureClass, PageEntry, Registry,
    WorkflowEntry,
};
use uxgate_policies::{MAX_WORKERS, MIN_WORKERS};

use crate::audit::{audit_button, audit_page, audit_workflow, AuditSettings};
use crate::error::GateError;
use crate::redact::Redactor;

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub base_url: String,
    pub workers: u32,
    pub settings: AuditSettings,
    pub fixtures: AuthFixtures,
}

#[derive(Debug, Clone, Copy)]
enum AuditJob<'a> {
    Page(&'a PageEntry),
    Button(&'a ButtonEntry),
    Workflow(&'a WorkflowEntry),
}

impl AuditJob<'_> {
    fn kind(self) -> AuditKind {
        match self {
            Self::Page(_) => AuditKind::Page,
            Self::Button(_) => AuditKind::Button,
            Self::Workflow(_) => AuditKind::Workflow,
        }
    }

    fn id(self) -> String {
        match self {
            Self::Page(p) => p.page_id.to_string(),
            Self::Button(b) => b.id(),
            Self::Workflow(w) => w.workflow_id.to_string(),
        }
    }

    fn criticality(self) -> Criticality {
        match self {
            Self::Page(p) => p.criticality,
            Self::Button(b) => b.criticality,
            Self::Workflow(w) => w.criticality,
        }
    }

    fn auth(self) -> AuthMode {
        match self {
            Self::Page(p) => p.auth,
            Self::Button(b) => b.auth,
            Self::Workflow(w) => w.auth,
        }
    }
}

fn expand_jobs(registry: &Registry) -> Vec<AuditJob<'_>> {
    let pages = registry.pages.iter().map(AuditJob::Page);
    let buttons = registry.buttons.iter().map(AuditJob::Button);
    let workflows = registry.workflows.iter().map(AuditJob::Workflow);
    pages.chain(buttons).chain(workflows).collect()
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&'static str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn run_job(driver: &dyn UiDriver, job: AuditJob<'_>, request: &RunRequest) -> AuditResult {
    let result = audit_job(driver, job, request);
    match job {
        AuditJob::Button(button) => result.expecting(button.expected.outcome()),
        _ => result,
    }
}

fn audit_job(driver: &dyn UiDriver, job: AuditJob<'_>, request: &RunRequest) -> AuditResult {
    let mode = job.auth();
    let Some(auth) = request.fixtures.context_for(mode) else {
        return AuditResult::skip(
            job.kind(),
            &job.id(),
            job.criticality(),
            &format!("auth fixture unavailable: {mode}"),
        );
    };
    let base_url = request.base_url.as_str();
    let settings = &request.settings;
    let outcome = catch_unwind(AssertUnwindSafe(|| match job {
        AuditJob::Page(page) => audit_page(driver, base_url, page, &auth, settings),
        AuditJob::Button(button) => audit_button(driver, base_url, button, &auth, settings),
        AuditJob::Workflow(workflow) => audit_workflow(driver, base_url, workflow, &auth, settings),
    }));
    outcome.unwrap_or_else(|payload| {
        AuditResult::fail(
            job.kind(),
            &job.id(),
            job.criticality(),
            FailureClass::DriverError,
            &format!("auditor panicked: {}", panic_payload_to_string(payload.as_ref())),
        )
    })
}

/// Runs every registry entry exactly once on a bounded pool of scoped threads.
/// Results are redacted and sorted by (kind, id).
pub fn run_audits(
    driver: &dyn UiDriver,
    registry: &Registry,
    request: &RunRequest,
    redactor: &Redactor,
) -> Result<Vec<AuditResult>, GateError> {
    let jobs = expand_jobs(registry);
    let workers = usize::try_from(request.workers.clamp(MIN_WORKERS, MAX_WORKERS))
        .unwrap_or(1)
        .min(jobs.len().max(1));
    info!(
        driver = driver.name(),
        base_url = %request.base_url,
        entries = jobs.len(),
        workers,
        "run started"
    );

    let next = AtomicUsize::new(0);
    let sink = Mutex::new(Vec::with_capacity(jobs.len()));
    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let idx = next.fetch_add(1, Ordering::Relaxed);
                let Some(job) = jobs.get(idx).copied() else {
                    break;
                };
                let result = redactor.redact_result(run_job(driver, job, request));
                info!(
                    kind = result.kind.as_str(),
                    id = %result.id,
                    outcome = result.outcome.as_str(),
                    class = result.failure_class.map(|c| c.as_str()).unwrap_or("-"),
                    error = result.error.as_deref().unwrap_or(""),
                    duration_ms = result.duration_ms,
                    "audit finished"
                );
                sink.lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .push(result);
            });
        }
    });

    let mut results = sink
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    results.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.id.cmp(&b.id)));
    verify_result_coverage(registry, &results)?;
    Ok(results)
}

/// Exactly one result per registry entry, nothing extra.
pub fn verify_result_coverage(
    registry: &Registry,
    results: &[AuditResult],
) -> Result<(), GateError> {
    let expected = registry.expected_ids();
    let mut seen = BTreeSet::new();
    let mut unexpected = Vec::new();
    for result in results {
        let key = (result.kind, result.id.clone());
        if !expected.contains(&key) || !seen.insert(key) {
            unexpected.push(format!("{}:{}", result.kind, result.id));
        }
    }
    let missing: Vec<String> = expected
        .difference(&seen)
        .map(|(kind, id)| format!("{kind}:{id}"))
        .collect();
    if missing.is_empty() && unexpected.is_empty() {
        Ok(())
    } else {
        Err(GateError::Coverage {
            missing,
            unexpected,
        })
    }
}
