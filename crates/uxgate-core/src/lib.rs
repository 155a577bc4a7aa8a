// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

//! Registry loading, auditing, scoring and reporting for the UX coverage gate.

pub mod audit;
mod error;
mod gate;
mod matching;
mod redact;
mod registry;
mod render;
mod runner;
mod scoring;

pub use audit::{audit_button, audit_page, audit_workflow, AuditSettings};
pub use error::{GateError, RegistryParseError};
pub use gate::run_gate;
pub use matching::{any_request_matches, request_matches, route_matches};
pub use redact::Redactor;
pub use registry::{
    list_output, load_registry, parse_buttons, parse_pages, parse_workflows, RegistryPaths,
    RegistrySources, REGISTRY_VERSION,
};
pub use render::{
    exit_code_for_report, format_utc_timestamp, render_json, render_markdown,
    render_text_summary, write_reports, JSON_REPORT_FILE, MARKDOWN_REPORT_FILE,
};
pub use runner::{run_audits, verify_result_coverage, RunRequest};
pub use scoring::{build_report, score_results, ReportMeta};

pub const CRATE_NAME: &str = "uxgate-core";
