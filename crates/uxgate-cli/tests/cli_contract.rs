// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;

const SCRUBBED_ENV: [&str; 6] = [
    "UX_GATE_BASE_URL",
    "UX_GATE_WORKERS",
    "UX_GATE_PORTAL_SESSION",
    "UX_GATE_ADMIN_JWT",
    "UX_GATE_LOG_LEVEL",
    "UX_GATE_LOG_JSON",
];

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Runs from an empty working directory so no workspace policy file is picked up.
fn uxgate(cwd: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_uxgate"));
    cmd.current_dir(cwd);
    for key in SCRUBBED_ENV {
        cmd.env_remove(key);
    }
    cmd
}

fn registry_args(dir: &Path) -> Vec<String> {
    ["pages", "buttons", "workflows"]
        .iter()
        .flat_map(|name| {
            [
                format!("--{name}"),
                dir.join(format!("{name}.yaml")).display().to_string(),
            ]
        })
        .collect()
}

fn parse_commands_from_help(text: &str) -> Vec<String> {
    let mut commands = Vec::new();
    let mut in_commands = false;
    for line in text.lines() {
        let trimmed = line.trim_end();
        if trimmed == "Commands:" {
            in_commands = true;
            continue;
        }
        if in_commands {
            if trimmed.is_empty() {
                break;
            }
            let name = trimmed.split_whitespace().next().unwrap_or("");
            if !name.is_empty() && name != "help" {
                commands.push(name.to_string());
            }
        }
    }
    commands.sort();
    commands
}

#[test]
fn help_command_surface_is_stable() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path()).arg("--help").output().expect("run help");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8 help");
    let expected = include_str!("snapshots/help.commands.txt")
        .lines()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    assert_eq!(parse_commands_from_help(&text), expected);
}

#[test]
fn unknown_flag_returns_usage_exit_code_with_machine_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path())
        .args(["--json", "--unknown-flag"])
        .output()
        .expect("run bad cli");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    let machine: Value = serde_json::from_str(stderr.trim()).expect("machine error json");
    assert_eq!(machine["code"], "usage_error");
}

#[test]
fn missing_command_is_a_usage_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path()).output().expect("run bare");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn registry_validate_reports_counts() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path())
        .args(["--json", "registry", "validate"])
        .args(registry_args(&fixture("healthy")))
        .output()
        .expect("run validate");
    assert!(output.status.success());
    let body: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(body["pages"], 2);
    assert_eq!(body["buttons"], 2);
    assert_eq!(body["workflows"], 1);
    assert_eq!(body["digest"].as_str().map(str::len), Some(64));
}

#[test]
fn registry_validate_rejects_an_unsupported_version() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let healthy = fixture("healthy");
    let output = uxgate(tmp.path())
        .args(["--json", "registry", "validate", "--pages"])
        .arg(fixture("broken_pages.yaml"))
        .arg("--buttons")
        .arg(healthy.join("buttons.yaml"))
        .arg("--workflows")
        .arg(healthy.join("workflows.yaml"))
        .output()
        .expect("run validate");
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    let machine: Value = serde_json::from_str(stderr.trim()).expect("machine error json");
    assert_eq!(machine["code"], "registry_invalid");
    assert_eq!(machine["details"]["registry"], "pages");
}

#[test]
fn registry_list_prints_one_line_per_entry() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path())
        .args(["registry", "list"])
        .args(registry_args(&fixture("healthy")))
        .output()
        .expect("run list");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8");
    assert_eq!(text.lines().count(), 5);
    assert!(text.lines().any(|l| l.starts_with("button\tincidents:create\t")));
}

#[test]
fn healthy_replay_is_go_and_writes_both_reports() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = fixture("healthy");
    let out = tmp.path().join("reports");
    let output = uxgate(tmp.path())
        .args(["--json", "run", "--base-url", "https://portal.example.com"])
        .args(registry_args(&dir))
        .arg("--replay")
        .arg(dir.join("replay.yaml"))
        .arg("--out")
        .arg(&out)
        .args(["--run-id", "cli_healthy"])
        .output()
        .expect("run gate");
    assert_eq!(output.status.code(), Some(0));
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["run_id"], "cli_healthy");
    assert_eq!(report["summary"]["status"], "GO");
    assert_eq!(report["summary"]["score"], 100);
    assert!(out.join("ux-coverage-report.md").is_file());
    assert!(out.join("ux-coverage-report.json").is_file());
}

#[test]
fn security_errors_hold_with_exit_code_one_and_redacted_report() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = fixture("security");
    let out = tmp.path().join("reports");
    let output = uxgate(tmp.path())
        .env("UX_GATE_PORTAL_SESSION", "fixture-session")
        .args(["run", "--base-url", "https://portal.example.com"])
        .args(registry_args(&dir))
        .arg("--replay")
        .arg(dir.join("replay.yaml"))
        .arg("--out")
        .arg(&out)
        .output()
        .expect("run gate");
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8(output.stdout).expect("utf8");
    assert!(stdout.contains("HOLD"));
    let markdown =
        std::fs::read_to_string(out.join("ux-coverage-report.md")).expect("markdown report");
    assert!(markdown.contains("SecurityError"));
    assert!(!markdown.contains("ops@example.com"));
}

#[test]
fn run_requires_a_base_url() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path())
        .arg("run")
        .args(registry_args(&fixture("healthy")))
        .output()
        .expect("run gate");
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn zero_workers_fail_policy_validation() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path())
        .args(["--json", "policy", "print"])
        .env("UX_GATE_WORKERS", "0")
        .output()
        .expect("print policy");
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    assert!(stderr.contains("policy_invalid"));
}

#[test]
fn policy_print_emits_the_published_defaults() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path())
        .args(["policy", "print"])
        .output()
        .expect("print policy");
    assert!(output.status.success());
    let policy: Value = serde_json::from_slice(&output.stdout).expect("policy json");
    assert_eq!(policy["workers"], 4);
    assert_eq!(policy["penalties"]["p0"]["per_failure"], 8);
    assert_eq!(policy["readiness"]["production"]["min_score"], 95);
}

#[test]
fn redact_hides_emails_from_arguments_and_stdin() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path())
        .args(["redact", "contact", "ops@example.com"])
        .output()
        .expect("redact args");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).expect("utf8");
    assert_eq!(text.trim(), "contact [REDACTED]");

    let output = uxgate(tmp.path())
        .arg("redact")
        .write_stdin("mail ops@example.com now\n")
        .output()
        .expect("redact stdin");
    let text = String::from_utf8(output.stdout).expect("utf8");
    assert!(!text.contains("ops@example.com"));
}

#[test]
fn score_reevaluates_a_written_report() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir = fixture("healthy");
    let out = tmp.path().join("reports");
    let status = uxgate(tmp.path())
        .args(["run", "--base-url", "https://portal.example.com"])
        .args(registry_args(&dir))
        .arg("--replay")
        .arg(dir.join("replay.yaml"))
        .arg("--out")
        .arg(&out)
        .args(["--run-id", "cli_rescore"])
        .output()
        .expect("run gate")
        .status;
    assert!(status.success());

    let output = uxgate(tmp.path())
        .args(["--json", "score", "--results"])
        .arg(out.join("ux-coverage-report.json"))
        .output()
        .expect("score");
    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).expect("report json");
    assert_eq!(report["run_id"], "cli_rescore");
    assert_eq!(report["summary"]["score"], 100);
}

fn score_results(tmp: &Path, rows: &str) -> std::process::Output {
    let results = tmp.join("results.json");
    std::fs::write(&results, rows).expect("write results");
    uxgate(tmp)
        .args(["--json", "score", "--results"])
        .arg(&results)
        .output()
        .expect("score")
}

#[test]
fn score_rejects_a_failure_without_a_class() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = score_results(
        tmp.path(),
        r#"[{"kind":"page","id":"home","outcome":"fail","criticality":"P0","error":"boom"}]"#,
    );
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    let machine: Value = serde_json::from_str(stderr.trim()).expect("machine error json");
    assert_eq!(machine["code"], "results_invalid");
    assert!(machine["message"].as_str().unwrap_or_default().contains("failure_class"));
}

#[test]
fn score_rejects_duplicate_rows() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let row = r#"{"kind":"page","id":"home","outcome":"pass","criticality":"P1"}"#;
    let output = score_results(tmp.path(), &format!("[{row},{row}]"));
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8(output.stderr).expect("utf8 stderr");
    assert!(stderr.contains("more than once"));
}

#[test]
fn report_schema_describes_the_json_report() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path())
        .args(["report", "schema"])
        .output()
        .expect("report schema");
    assert!(output.status.success());
    let schema: Value = serde_json::from_slice(&output.stdout).expect("schema json");
    assert_eq!(schema["title"], "uxgate coverage report");
    assert!(schema["required"]
        .as_array()
        .is_some_and(|fields| fields.iter().any(|f| f == "summary")));
}

#[test]
fn completion_generates_a_script() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let output = uxgate(tmp.path())
        .args(["completion", "bash"])
        .output()
        .expect("completion");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("uxgate"));
}
