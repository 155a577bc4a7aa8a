// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::time::Duration;

use uxgate_model::AuthMode;

use crate::auth::AuthContext;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverError {
    Unsupported {
        capability: &'static str,
        driver: &'static str,
    },
    AuthUnavailable {
        mode: AuthMode,
    },
    Navigation {
        route: String,
        detail: String,
    },
    ControlNotFound {
        selector: String,
    },
    Interaction {
        selector: String,
        detail: String,
    },
    Timeout {
        operation: String,
        waited_ms: u64,
    },
    Transport {
        detail: String,
    },
    Script {
        detail: String,
    },
}

impl DriverError {
    /// Precondition errors turn an audit into a skip instead of a failure.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Unsupported { .. } | Self::AuthUnavailable { .. })
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported { capability, driver } => {
                write!(f, "driver {driver} does not support {capability}")
            }
            Self::AuthUnavailable { mode } => write!(f, "auth fixture unavailable: {mode}"),
            Self::Navigation { route, detail } => {
                write!(f, "navigation to {route} failed: {detail}")
            }
            Self::ControlNotFound { selector } => write!(f, "control not found: {selector}"),
            Self::Interaction { selector, detail } => {
                write!(f, "interaction with {selector} failed: {detail}")
            }
            Self::Timeout {
                operation,
                waited_ms,
            } => write!(f, "timed out after {waited_ms}ms: {operation}"),
            Self::Transport { detail } => write!(f, "transport error: {detail}"),
            Self::Script { detail } => write!(f, "replay script error: {detail}"),
        }
    }
}

impl std::error::Error for DriverError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverCapabilities {
    pub navigate: bool,
    pub interact: bool,
}

impl DriverCapabilities {
    #[must_use]
    pub fn full() -> Self {
        Self {
            navigate: true,
            interact: true,
        }
    }

    #[must_use]
    pub fn navigate_only() -> Self {
        Self {
            navigate: true,
            interact: false,
        }
    }
}

/// What a page looked like once navigation settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRender {
    Rendered,
    Empty,
    Degraded,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub enabled: bool,
}

/// Observable consequences of one interaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Effects {
    /// Set only when the interaction changed the current route.
    pub route_after: Option<String>,
    pub requests: Vec<String>,
    pub states: Vec<String>,
}

impl Effects {
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.route_after.is_none() && self.requests.is_empty() && self.states.is_empty()
    }
}

pub trait UiDriver: Send + Sync {
    fn name(&self) -> &'static str;
    fn capabilities(&self) -> DriverCapabilities;
    fn open_session(
        &self,
        base_url: &str,
        auth: &AuthContext,
    ) -> Result<Box<dyn UiSession>, DriverError>;
}

/// One isolated browsing session. Owned by a single audit job.
pub trait UiSession {
    fn navigate(&mut self, route: &str, wait: Duration) -> Result<PageRender, DriverError>;
    fn find_control(&mut self, selector: &str) -> Result<Option<ControlState>, DriverError>;
    fn click(&mut self, selector: &str, wait: Duration) -> Result<Effects, DriverError>;
    fn fill(&mut self, selector: &str, value: &str) -> Result<(), DriverError>;
    fn is_visible(&mut self, state: &str) -> Result<bool, DriverError>;
    fn current_route(&self) -> String;
    /// Every request seen since the session opened, as `METHOD /path`.
    fn observed_requests(&self) -> Vec<String>;
}

pub(crate) fn duration_ms(wait: Duration) -> u64 {
    u64::try_from(wait.as_millis()).unwrap_or(u64::MAX)
}

/// Drops the query and fragment and any trailing slash, keeping `/` itself.
#[must_use]
pub fn normalize_route(route: &str) -> String {
    let path = route
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim();
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return "/".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_capability_and_auth_errors_are_preconditions() {
        assert!(DriverError::Unsupported {
            capability: "interact",
            driver: "http"
        }
        .is_precondition());
        assert!(DriverError::AuthUnavailable {
            mode: AuthMode::JwtAdmin
        }
        .is_precondition());
        assert!(!DriverError::Transport {
            detail: "refused".to_string()
        }
        .is_precondition());
        assert!(!DriverError::ControlNotFound {
            selector: "#x".to_string()
        }
        .is_precondition());
    }

    #[test]
    fn routes_normalize_query_and_trailing_slash() {
        assert_eq!(normalize_route("/incidents/?page=2"), "/incidents");
        assert_eq!(normalize_route("incidents#top"), "/incidents");
        assert_eq!(normalize_route("/"), "/");
        assert_eq!(normalize_route(""), "/");
    }

    #[test]
    fn empty_effects_are_a_noop() {
        assert!(Effects::default().is_noop());
        let effects = Effects {
            states: vec!["toast".to_string()],
            ..Effects::default()
        };
        assert!(!effects.is_noop());
    }
}
