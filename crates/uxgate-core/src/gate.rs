// SPDX-License-Identifier: Apache-2.0

use tracing::info;
use uxgate_adapters::UiDriver;
use uxgate_model::{CoverageReport, Registry};
use uxgate_policies::GatePolicy;

use crate::error::GateError;
use crate::redact::Redactor;
use crate::runner::{run_audits, RunRequest};
use crate::scoring::{build_report, ReportMeta};

/// Audits every registry entry against `driver` and scores the results.
pub fn run_gate(
    driver: &dyn UiDriver,
    registry: &Registry,
    policy: &GatePolicy,
    request: &RunRequest,
    meta: ReportMeta,
) -> Result<CoverageReport, GateError> {
    let redactor = Redactor::new(&policy.redaction)?;
    let results = run_audits(driver, registry, request, &redactor)?;
    let report = build_report(meta, results, policy, &redactor);
    log_finished(&report);
    Ok(report)
}

pub(crate) fn log_finished(report: &CoverageReport) {
    info!(
        run_id = %report.run_id,
        score = report.summary.score,
        status = report.summary.status.as_str(),
        failed = report.summary.failed,
        skipped = report.summary.skipped,
        "run finished"
    );
}
