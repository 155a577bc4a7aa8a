// SPDX-License-Identifier: Apache-2.0

use std::fs;
use std::path::{Path, PathBuf};

use crate::policy_set::{parse_policy_json, published_policy};
use crate::schema::GatePolicy;
use crate::validate::PolicyValidationError;

const POLICY_PATH: &str = "configs/ux-gate/policy.json";

#[must_use]
pub fn policy_path(root: &Path) -> PathBuf {
    root.join(POLICY_PATH)
}

pub fn load_policy_file(path: &Path) -> Result<GatePolicy, PolicyValidationError> {
    let raw = fs::read_to_string(path).map_err(|e| {
        PolicyValidationError(format!("read policy {} failed: {e}", path.display()))
    })?;
    parse_policy_json(&raw)
}

pub fn load_policy_from_workspace(root: &Path) -> Result<GatePolicy, PolicyValidationError> {
    load_policy_file(&policy_path(root))
}

/// Explicit file first, then the workspace document, then the published defaults.
pub fn resolve_policy(
    explicit: Option<&Path>,
    root: &Path,
) -> Result<GatePolicy, PolicyValidationError> {
    if let Some(path) = explicit {
        return load_policy_file(path);
    }
    let workspace = policy_path(root);
    if workspace.is_file() {
        return load_policy_file(&workspace);
    }
    Ok(published_policy())
}
