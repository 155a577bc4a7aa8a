// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::path::Path;

use uxgate_policies::{resolve_policy, validate_gate_policy, GatePolicy, PolicyValidationError};

use crate::errors::CliError;

pub(crate) const ENV_BASE_URL: &str = "UX_GATE_BASE_URL";
pub(crate) const ENV_WORKERS: &str = "UX_GATE_WORKERS";
pub(crate) const ENV_LOG_LEVEL: &str = "UX_GATE_LOG_LEVEL";
pub(crate) const ENV_LOG_JSON: &str = "UX_GATE_LOG_JSON";

pub(crate) fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Published defaults, then the policy file, then the environment, then flags.
pub(crate) fn layered_policy(
    explicit: Option<&Path>,
    workers_flag: Option<u32>,
) -> Result<GatePolicy, CliError> {
    let root = env::current_dir()
        .map_err(|e| CliError::dependency(format!("resolve working directory failed: {e}")))?;
    let mut policy = resolve_policy(explicit, &root)?;
    if let Some(raw) = env_non_empty(ENV_WORKERS) {
        policy.workers = raw.trim().parse().map_err(|_| {
            PolicyValidationError(format!(
                "{ENV_WORKERS} must be a positive integer, got `{raw}`"
            ))
        })?;
    }
    if let Some(workers) = workers_flag {
        policy.workers = workers;
    }
    validate_gate_policy(&policy)?;
    Ok(policy)
}

pub(crate) fn base_url(flag: Option<String>) -> Result<String, CliError> {
    flag.or_else(|| env_non_empty(ENV_BASE_URL))
        .map(|url| url.trim().trim_end_matches('/').to_string())
        .ok_or_else(|| CliError::usage(&format!("--base-url or {ENV_BASE_URL} is required")))
}
