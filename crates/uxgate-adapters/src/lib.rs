// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

mod auth;
mod driver;
mod http;
mod scripted;

pub use auth::{AuthContext, AuthFixtures, ADMIN_JWT_ENV, PORTAL_SESSION_ENV};
pub use driver::{
    normalize_route, ControlState, DriverCapabilities, DriverError, Effects, PageRender,
    UiDriver, UiSession,
};
pub use http::HttpDriver;
pub use scripted::{
    RenderKind, ReplayScript, ScriptedControl, ScriptedDriver, ScriptedEffect, ScriptedRoute,
};

pub const CRATE_NAME: &str = "uxgate-adapters";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    PathViolation {
        path: PathBuf,
        detail: String,
    },
    Io {
        op: &'static str,
        path: PathBuf,
        detail: String,
    },
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PathViolation { path, detail } => {
                write!(f, "path violation: {} ({detail})", path.display())
            }
            Self::Io { op, path, detail } => {
                write!(f, "io error: {op} {} ({detail})", path.display())
            }
        }
    }
}

impl std::error::Error for AdapterError {}

pub fn ensure_write_path_under(out_dir: &Path, target: &Path) -> Result<PathBuf, AdapterError> {
    fs::create_dir_all(out_dir).map_err(|err| AdapterError::Io {
        op: "create_dir_all",
        path: out_dir.to_path_buf(),
        detail: err.to_string(),
    })?;

    let absolute_target = if target.is_absolute() {
        target.to_path_buf()
    } else {
        out_dir.join(target)
    };

    let normalized_root = normalize_path(out_dir);
    let normalized_target = normalize_path(&absolute_target);

    if !normalized_target.starts_with(&normalized_root) || normalized_target == normalized_root {
        return Err(AdapterError::PathViolation {
            path: absolute_target,
            detail: format!("writes allowed only under {}", normalized_root.display()),
        });
    }

    if let Some(parent) = normalized_target.parent() {
        fs::create_dir_all(parent).map_err(|err| AdapterError::Io {
            op: "create_dir_all",
            path: parent.to_path_buf(),
            detail: err.to_string(),
        })?;
    }
    Ok(normalized_target)
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Writes report files, refusing anything outside its output directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    out_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(out_dir: &Path) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
        }
    }

    pub fn write_text(&self, path: &Path, content: &str) -> Result<PathBuf, AdapterError> {
        let target = ensure_write_path_under(&self.out_dir, path)?;
        fs::write(&target, content).map_err(|err| AdapterError::Io {
            op: "write",
            path: target.clone(),
            detail: err.to_string(),
        })?;
        Ok(target)
    }
}
