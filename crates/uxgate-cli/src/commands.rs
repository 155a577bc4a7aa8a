// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{json, Value};
use tracing::{info, warn};
use uxgate_adapters::{AuthFixtures, HttpDriver, ReportWriter, ScriptedDriver, UiDriver};
use uxgate_core::{
    build_report, exit_code_for_report, list_output, render_json, render_text_summary, run_gate,
    write_reports, AuditSettings, GateError, Redactor, RegistryPaths, RegistrySources,
    ReportMeta, RunRequest,
};
use uxgate_model::{report_json_schema, AuditOutcome, AuditResult, CoverageReport, RunId};
use uxgate_policies::canonical_policy_json;

use crate::config::{base_url, layered_policy};
use crate::errors::{CliError, ExitCode};
use crate::OutputMode;

pub(crate) struct RunArgs {
    pub paths: RegistryPaths,
    pub base_url: Option<String>,
    pub policy: Option<PathBuf>,
    pub replay: Option<PathBuf>,
    pub out: PathBuf,
    pub workers: Option<u32>,
    pub run_id: Option<String>,
}

fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn status_exit(report: &CoverageReport) -> ExitCode {
    match exit_code_for_report(report) {
        0 => ExitCode::Success,
        _ => ExitCode::Hold,
    }
}

fn emit_report(
    report: &CoverageReport,
    written: &[PathBuf],
    mode: OutputMode,
) -> Result<(), CliError> {
    if mode.json {
        println!("{}", render_json(report)?);
    } else {
        println!("{}", render_text_summary(report));
        for path in written {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

pub(crate) fn run_gate_command(args: RunArgs, mode: OutputMode) -> Result<ExitCode, CliError> {
    let policy = layered_policy(args.policy.as_deref(), args.workers)?;
    let base_url = base_url(args.base_url)?;
    let run_id = match args.run_id.as_deref() {
        Some(raw) => RunId::parse(raw).map_err(|e| CliError::usage(&e))?,
        None => RunId::from_seed(&format!("ux_coverage_{}", now_epoch_seconds())),
    };

    let sources = RegistrySources::read(&args.paths)?;
    let registry = sources.load().map_err(GateError::from)?;
    let driver: Box<dyn UiDriver> = match args.replay.as_deref() {
        Some(path) => Box::new(ScriptedDriver::from_path(path).map_err(GateError::from)?),
        None => Box::new(HttpDriver::new().map_err(GateError::from)?),
    };
    info!(
        run_id = %run_id,
        driver = driver.name(),
        entries = registry.entry_count(),
        workers = policy.workers,
        "gate configured"
    );

    let request = RunRequest {
        base_url: base_url.clone(),
        workers: policy.workers,
        settings: AuditSettings::from_policy(&policy.timeouts),
        fixtures: AuthFixtures::from_env(),
    };
    let meta = ReportMeta {
        run_id,
        generated_at_epoch_seconds: now_epoch_seconds(),
        base_url,
        registry_digest: sources.digest(),
    };
    let report = run_gate(driver.as_ref(), &registry, &policy, &request, meta)?;
    let written = write_reports(&ReportWriter::new(&args.out), &report)?;
    emit_report(&report, &written, mode)?;
    Ok(status_exit(&report))
}

pub(crate) fn validate_registry(
    paths: &RegistryPaths,
    mode: OutputMode,
) -> Result<ExitCode, CliError> {
    let sources = RegistrySources::read(paths)?;
    let registry = sources.load().map_err(GateError::from)?;
    if mode.json {
        println!(
            "{}",
            json!({
                "status": "ok",
                "pages": registry.pages.len(),
                "buttons": registry.buttons.len(),
                "workflows": registry.workflows.len(),
                "digest": sources.digest(),
            })
        );
    } else {
        println!(
            "registry ok: {} pages, {} buttons, {} workflows",
            registry.pages.len(),
            registry.buttons.len(),
            registry.workflows.len()
        );
    }
    Ok(ExitCode::Success)
}

pub(crate) fn list_registry(paths: &RegistryPaths, mode: OutputMode) -> Result<ExitCode, CliError> {
    let registry = RegistrySources::read(paths)?
        .load()
        .map_err(GateError::from)?;
    if mode.json {
        let ids = registry
            .expected_ids()
            .into_iter()
            .map(|(kind, id)| json!({"kind": kind, "id": id}))
            .collect::<Vec<_>>();
        println!("{}", Value::Array(ids));
    } else {
        println!("{}", list_output(&registry));
    }
    Ok(ExitCode::Success)
}

/// Accepts a full report document, whose metadata is kept, or a bare result array.
fn read_results(path: &Path) -> Result<(Option<ReportMeta>, Vec<AuditResult>), CliError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        CliError::from(GateError::Read {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    })?;
    let invalid = |e: serde_json::Error| {
        CliError::from(GateError::Read {
            path: path.to_path_buf(),
            detail: format!("invalid results document: {e}"),
        })
    };
    let value: Value = serde_json::from_str(&raw).map_err(invalid)?;
    if value.is_array() {
        let results = serde_json::from_value(value).map_err(invalid)?;
        return Ok((None, results));
    }
    let report: CoverageReport = serde_json::from_value(value).map_err(invalid)?;
    let meta = ReportMeta {
        run_id: report.run_id,
        generated_at_epoch_seconds: report.generated_at_epoch_seconds,
        base_url: report.base_url,
        registry_digest: report.registry_digest,
    };
    Ok((Some(meta), report.results))
}

/// Every failure must carry its class and every (kind, id) must appear once.
fn check_results(path: &Path, results: &[AuditResult]) -> Result<(), CliError> {
    let location = path.display().to_string();
    if let Some(row) = results
        .iter()
        .find(|r| r.outcome == AuditOutcome::Fail && r.failure_class.is_none())
    {
        return Err(CliError::invalid_results(
            &location,
            &format!("failed {} {} carries no failure_class", row.kind, row.id),
        ));
    }
    let mut seen = BTreeSet::new();
    for row in results {
        if !seen.insert((row.kind, row.id.as_str())) {
            return Err(CliError::invalid_results(
                &location,
                &format!("{} {} appears more than once", row.kind, row.id),
            ));
        }
    }
    Ok(())
}

pub(crate) fn rescore(
    results_path: &Path,
    policy_path: Option<&Path>,
    out: Option<&Path>,
    mode: OutputMode,
) -> Result<ExitCode, CliError> {
    let policy = layered_policy(policy_path, None)?;
    let redactor = Redactor::new(&policy.redaction)?;
    let (meta, results) = read_results(results_path)?;
    check_results(results_path, &results)?;
    let meta = meta.unwrap_or_else(|| {
        warn!("results document carries no run metadata");
        ReportMeta {
            run_id: RunId::from_seed(&format!("ux_rescore_{}", now_epoch_seconds())),
            generated_at_epoch_seconds: now_epoch_seconds(),
            base_url: String::new(),
            registry_digest: String::new(),
        }
    });
    let report = build_report(meta, results, &policy, &redactor);
    let written = match out {
        Some(dir) => write_reports(&ReportWriter::new(dir), &report)?,
        None => Vec::new(),
    };
    emit_report(&report, &written, mode)?;
    Ok(status_exit(&report))
}

pub(crate) fn redact_text(
    policy_path: Option<&Path>,
    text: &[String],
    mode: OutputMode,
) -> Result<ExitCode, CliError> {
    let policy = layered_policy(policy_path, None)?;
    let redactor = Redactor::new(&policy.redaction)?;
    let input = if text.is_empty() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| CliError::dependency(format!("read stdin failed: {e}")))?;
        buf
    } else {
        text.join(" ")
    };
    let redacted = redactor.redact(&input);
    if mode.json {
        println!("{}", json!({ "redacted": redacted }));
    } else {
        println!("{}", redacted.trim_end_matches('\n'));
    }
    Ok(ExitCode::Success)
}

pub(crate) fn print_policy(policy_path: Option<&Path>) -> Result<ExitCode, CliError> {
    let policy = layered_policy(policy_path, None)?;
    println!("{}", canonical_policy_json(&policy)?);
    Ok(ExitCode::Success)
}

pub(crate) fn print_report_schema() -> Result<ExitCode, CliError> {
    let schema = serde_json::to_string_pretty(&report_json_schema())
        .map_err(|e| CliError::from(GateError::Encode(e.to_string())))?;
    println!("{schema}");
    Ok(ExitCode::Success)
}
