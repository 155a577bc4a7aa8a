// SPDX-License-Identifier: Apache-2.0

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use uxgate_model::AuthMode;

use crate::auth::AuthContext;
use crate::driver::{
    duration_ms, normalize_route, ControlState, DriverCapabilities, DriverError, Effects,
    PageRender, UiDriver, UiSession,
};

const SCRIPT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderKind {
    #[default]
    Rendered,
    Empty,
    Degraded,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedEffect {
    #[serde(default)]
    pub route: Option<String>,
    #[serde(default)]
    pub requests: Vec<String>,
    #[serde(default)]
    pub states: Vec<String>,
}

fn enabled_by_default() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedControl {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub on_click: ScriptedEffect,
    #[serde(default)]
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedRoute {
    #[serde(default)]
    pub render: RenderKind,
    #[serde(default)]
    pub error: Option<String>,
    /// Navigation itself fails, as when the host refuses the connection.
    #[serde(default)]
    pub transport_error: Option<String>,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub requests: Vec<String>,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub controls: BTreeMap<String, ScriptedControl>,
}

fn all_auth_modes() -> Vec<AuthMode> {
    AuthMode::ALL.to_vec()
}

/// Recorded behaviour of an environment, replayed by [`ScriptedDriver`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayScript {
    pub version: u32,
    #[serde(default = "all_auth_modes")]
    pub auth_modes: Vec<AuthMode>,
    #[serde(default)]
    pub routes: BTreeMap<String, ScriptedRoute>,
    /// Served for any route not listed in `routes`.
    #[serde(default)]
    pub fallback: Option<ScriptedRoute>,
}

impl ReplayScript {
    fn route(&self, route: &str) -> Option<&ScriptedRoute> {
        let key = normalize_route(route);
        self.routes
            .iter()
            .find(|(declared, _)| normalize_route(declared) == key)
            .map(|(_, entry)| entry)
            .or(self.fallback.as_ref())
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedDriver {
    script: Arc<ReplayScript>,
}

impl ScriptedDriver {
    pub fn from_yaml(raw: &str) -> Result<Self, DriverError> {
        let script: ReplayScript = serde_yaml::from_str(raw).map_err(|e| DriverError::Script {
            detail: format!("parse replay script failed: {e}"),
        })?;
        if script.version != SCRIPT_VERSION {
            return Err(DriverError::Script {
                detail: format!(
                    "unsupported replay script version {} (expected {SCRIPT_VERSION})",
                    script.version
                ),
            });
        }
        Ok(Self {
            script: Arc::new(script),
        })
    }

    pub fn from_path(path: &Path) -> Result<Self, DriverError> {
        let raw = std::fs::read_to_string(path).map_err(|e| DriverError::Script {
            detail: format!("read {} failed: {e}", path.display()),
        })?;
        Self::from_yaml(&raw)
    }
}

impl UiDriver for ScriptedDriver {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities::full()
    }

    fn open_session(
        &self,
        _base_url: &str,
        auth: &AuthContext,
    ) -> Result<Box<dyn UiSession>, DriverError> {
        if !self.script.auth_modes.contains(&auth.mode) {
            return Err(DriverError::AuthUnavailable { mode: auth.mode });
        }
        Ok(Box::new(ScriptedSession {
            script: Arc::clone(&self.script),
            current_route: String::new(),
            visible: BTreeSet::new(),
            requests: Vec::new(),
            filled: BTreeMap::new(),
        }))
    }
}

struct ScriptedSession {
    script: Arc<ReplayScript>,
    current_route: String,
    visible: BTreeSet<String>,
    requests: Vec<String>,
    filled: BTreeMap<String, String>,
}

fn settle(delay_ms: u64, wait: Duration, operation: String) -> Result<(), DriverError> {
    let waited_ms = duration_ms(wait);
    if delay_ms > waited_ms {
        std::thread::sleep(wait);
        return Err(DriverError::Timeout {
            operation,
            waited_ms,
        });
    }
    std::thread::sleep(Duration::from_millis(delay_ms));
    Ok(())
}

impl ScriptedSession {
    fn control(&self, selector: &str) -> Option<&ScriptedControl> {
        self.script
            .route(&self.current_route)
            .and_then(|route| route.controls.get(selector))
    }

    fn enter(&mut self, route: &str) -> Option<ScriptedRoute> {
        self.current_route = normalize_route(route);
        self.visible.clear();
        let entry = self.script.route(route).cloned()?;
        self.visible.extend(entry.states.iter().cloned());
        self.requests.extend(entry.requests.iter().cloned());
        Some(entry)
    }

    fn interactive_control(&self, selector: &str) -> Result<ScriptedControl, DriverError> {
        let control = self
            .control(selector)
            .cloned()
            .ok_or_else(|| DriverError::ControlNotFound {
                selector: selector.to_string(),
            })?;
        if !control.enabled {
            return Err(DriverError::Interaction {
                selector: selector.to_string(),
                detail: "control is disabled".to_string(),
            });
        }
        Ok(control)
    }
}

impl UiSession for ScriptedSession {
    fn navigate(&mut self, route: &str, wait: Duration) -> Result<PageRender, DriverError> {
        if let Some(entry) = self.script.route(route) {
            if let Some(detail) = &entry.transport_error {
                return Err(DriverError::Navigation {
                    route: route.to_string(),
                    detail: detail.clone(),
                });
            }
            settle(entry.delay_ms, wait, format!("navigate {route}"))?;
        }
        let Some(entry) = self.enter(route) else {
            return Ok(PageRender::Error("404 not found".to_string()));
        };
        Ok(match entry.render {
            RenderKind::Rendered => PageRender::Rendered,
            RenderKind::Empty => PageRender::Empty,
            RenderKind::Degraded => PageRender::Degraded,
            RenderKind::Error => {
                PageRender::Error(entry.error.unwrap_or_else(|| "page error".to_string()))
            }
        })
    }

    fn find_control(&mut self, selector: &str) -> Result<Option<ControlState>, DriverError> {
        Ok(self.control(selector).map(|c| ControlState { enabled: c.enabled }))
    }

    fn click(&mut self, selector: &str, wait: Duration) -> Result<Effects, DriverError> {
        let control = self.interactive_control(selector)?;
        settle(control.delay_ms, wait, format!("click {selector}"))?;

        let effect = control.on_click;
        let mut requests = effect.requests.clone();
        self.requests.extend(effect.requests.iter().cloned());

        let mut route_after = None;
        if let Some(target) = effect.route.as_deref() {
            if normalize_route(target) != self.current_route {
                let before = self.requests.len();
                self.enter(target);
                requests.extend(self.requests[before..].iter().cloned());
                route_after = Some(normalize_route(target));
            }
        }
        self.visible.extend(effect.states.iter().cloned());

        Ok(Effects {
            route_after,
            requests,
            states: effect.states,
        })
    }

    fn fill(&mut self, selector: &str, value: &str) -> Result<(), DriverError> {
        self.interactive_control(selector)?;
        self.filled.insert(selector.to_string(), value.to_string());
        Ok(())
    }

    fn is_visible(&mut self, state: &str) -> Result<bool, DriverError> {
        Ok(self.visible.contains(state))
    }

    fn current_route(&self) -> String {
        self.current_route.clone()
    }

    fn observed_requests(&self) -> Vec<String> {
        self.requests.clone()
    }
}
