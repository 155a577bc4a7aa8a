// SPDX-License-Identifier: Apache-2.0

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use uxgate_adapters::ReportWriter;
use uxgate_model::{AuditKind, AuditOutcome, AuditResult, CoverageReport, GateStatus};

use crate::error::GateError;

pub const MARKDOWN_REPORT_FILE: &str = "ux-coverage-report.md";
pub const JSON_REPORT_FILE: &str = "ux-coverage-report.json";

fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    (yoe + era * 400 + i64::from(m <= 2), m, d)
}

/// `YYYY-MM-DDTHH:MM:SSZ` for a UTC epoch second.
#[must_use]
pub fn format_utc_timestamp(epoch_seconds: u64) -> String {
    let secs = i64::try_from(epoch_seconds).unwrap_or(i64::MAX);
    let (y, m, d) = civil_from_days(secs.div_euclid(86_400));
    let rem = secs.rem_euclid(86_400);
    format!(
        "{y:04}-{m:02}-{d:02}T{:02}:{:02}:{:02}Z",
        rem / 3600,
        (rem % 3600) / 60,
        rem % 60
    )
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

fn result_detail(result: &AuditResult) -> String {
    let mut parts = Vec::new();
    if let Some(step) = result.failed_step {
        parts.push(format!("step {step}"));
    }
    match result.outcome {
        AuditOutcome::Pass => {}
        AuditOutcome::Fail => {
            if let Some(class) = result.failure_class {
                parts.push(class.to_string());
            }
            if let Some(error) = result.error.as_deref() {
                parts.push(error.to_string());
            }
        }
        AuditOutcome::Skip => {
            parts.push(result.skip_reason.clone().unwrap_or_else(|| "skipped".to_string()));
        }
    }
    if result.used_fallback {
        if let Some(locator) = result.matched_locator.as_deref() {
            parts.push(format!("fallback selector `{locator}`"));
        }
    }
    cell(&parts.join(": "))
}

fn outcome_label(outcome: AuditOutcome) -> &'static str {
    match outcome {
        AuditOutcome::Pass => "PASS",
        AuditOutcome::Fail => "FAIL",
        AuditOutcome::Skip => "SKIP",
    }
}

fn push_result_table<'a>(
    out: &mut String,
    title: &str,
    rows: impl Iterator<Item = &'a AuditResult>,
) {
    let _ = writeln!(out, "### {title}\n");
    let rows: Vec<&AuditResult> = rows.collect();
    if rows.is_empty() {
        out.push_str("_No entries._\n\n");
        return;
    }
    out.push_str("| ID | Criticality | Outcome | Detail |\n|---|---|---|---|\n");
    for row in rows {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} |",
            cell(&row.id),
            row.criticality,
            outcome_label(row.outcome),
            result_detail(row)
        );
    }
    out.push('\n');
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[must_use]
pub fn render_markdown(report: &CoverageReport) -> String {
    let s = &report.summary;
    let mut out = String::new();
    let _ = writeln!(out, "# UX Coverage Report\n");
    let _ = writeln!(out, "- Run ID: `{}`", report.run_id);
    let _ = writeln!(
        out,
        "- Generated: {}",
        format_utc_timestamp(report.generated_at_epoch_seconds)
    );
    let _ = writeln!(out, "- Base URL: {}", cell(&report.base_url));
    let _ = writeln!(out, "- Registry digest: `{}`\n", report.registry_digest);

    out.push_str("## Summary\n\n| Metric | Value |\n|---|---|\n");
    let rows = [
        ("Score", s.score.to_string()),
        ("Status", s.status.to_string()),
        ("Total audits", s.total.to_string()),
        ("Passed", s.passed.to_string()),
        ("Failed", s.failed.to_string()),
        ("Skipped", s.skipped.to_string()),
        ("Executed", format!("{}%", s.executed_percent)),
        ("P0 failures", s.p0_failures.to_string()),
        ("P1 failures", s.p1_failures.to_string()),
        ("P2 failures", s.p2_failures.to_string()),
        ("Noop buttons", s.noop_buttons.to_string()),
        ("Dead ends", s.dead_ends.to_string()),
        ("Skip policy", cell(&report.skip_policy)),
    ];
    for (label, value) in rows {
        let _ = writeln!(out, "| {label} | {value} |");
    }

    out.push_str("\n## Readiness\n\n| Environment | Ready | Blockers |\n|---|---|---|\n");
    for row in &report.readiness {
        let blockers = if row.blockers.is_empty() {
            "-".to_string()
        } else {
            cell(&row.blockers.join("; "))
        };
        let _ = writeln!(
            out,
            "| {} | {} | {blockers} |",
            row.environment.title(),
            yes_no(row.ready)
        );
    }

    out.push_str("\n## Audit Results\n\n");
    let of_kind = |kind: AuditKind| report.results.iter().filter(move |r| r.kind == kind);
    push_result_table(&mut out, "Page Audit", of_kind(AuditKind::Page));
    push_result_table(
        &mut out,
        "Link Audit",
        of_kind(AuditKind::Button).filter(|r| r.is_link()),
    );
    push_result_table(
        &mut out,
        "Button Audit",
        of_kind(AuditKind::Button).filter(|r| !r.is_link()),
    );
    push_result_table(&mut out, "Workflow Audit", of_kind(AuditKind::Workflow));

    out.push_str("## Failures\n\n");
    if report.failures.is_empty() {
        out.push_str("_No failures._\n");
    } else {
        out.push_str("| Type | ID | Criticality | Error |\n|---|---|---|---|\n");
        for row in &report.failures {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {}: {} |",
                row.kind,
                cell(&row.id),
                row.criticality,
                row.class,
                cell(&row.error)
            );
        }
    }

    out.push_str("\n## Thresholds\n\n");
    out.push_str("| Environment | Min score | Max P0 failures | Max P1 failures |\n");
    out.push_str("|---|---|---|---|\n");
    for row in &report.thresholds {
        let max_p1 = row
            .max_p1_failures
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        let _ = writeln!(
            out,
            "| {} | {} | {} | {max_p1} |",
            row.environment.title(),
            row.min_score,
            row.max_p0_failures
        );
    }

    if !report.warnings.is_empty() {
        out.push_str("\n## Warnings\n\n");
        for warning in &report.warnings {
            let _ = writeln!(out, "- {}", cell(warning));
        }
    }
    out
}

pub fn render_json(report: &CoverageReport) -> Result<String, GateError> {
    serde_json::to_string_pretty(report).map_err(|err| GateError::Encode(err.to_string()))
}

#[must_use]
pub fn render_text_summary(report: &CoverageReport) -> String {
    let s = &report.summary;
    format!(
        "summary: score={} status={} passed={} failed={} skipped={} total={} executed={}% noop_buttons={} dead_ends={}",
        s.score,
        s.status,
        s.passed,
        s.failed,
        s.skipped,
        s.total,
        s.executed_percent,
        s.noop_buttons,
        s.dead_ends
    )
}

#[must_use]
pub fn exit_code_for_report(report: &CoverageReport) -> i32 {
    match report.summary.status {
        GateStatus::Go => 0,
        GateStatus::Hold => 1,
    }
}

/// Writes the Markdown and JSON reports under the writer's output root.
pub fn write_reports(
    writer: &ReportWriter,
    report: &CoverageReport,
) -> Result<Vec<PathBuf>, GateError> {
    let json = render_json(report)?;
    let markdown = render_markdown(report);
    Ok(vec![
        writer.write_text(Path::new(MARKDOWN_REPORT_FILE), &markdown)?,
        writer.write_text(Path::new(JSON_REPORT_FILE), &json)?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_timestamps_use_civil_dates() {
        assert_eq!(format_utc_timestamp(0), "1970-01-01T00:00:00Z");
        assert_eq!(format_utc_timestamp(951_782_400), "2000-02-29T00:00:00Z");
        assert_eq!(format_utc_timestamp(1_769_423_382), "2026-01-26T10:29:42Z");
    }

    #[test]
    fn table_cells_escape_pipes_and_newlines() {
        assert_eq!(cell("a|b\nc"), "a\\|b c");
    }
}
