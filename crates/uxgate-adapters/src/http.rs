// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, COOKIE};
use uxgate_model::AuthMode;

use crate::auth::AuthContext;
use crate::driver::{
    duration_ms, normalize_route, ControlState, DriverCapabilities, DriverError, Effects,
    PageRender, UiDriver, UiSession,
};

const DRIVER_NAME: &str = "http";
const SESSION_COOKIE: &str = "portal_session";

/// Page-level driver over plain HTTP. Interactions are unsupported, so button
/// audits and interactive workflow steps are skipped under it.
#[derive(Debug, Clone)]
pub struct HttpDriver {
    client: Client,
}

impl HttpDriver {
    pub fn new() -> Result<Self, DriverError> {
        let client = Client::builder()
            .user_agent(concat!("uxgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DriverError::Transport {
                detail: format!("build http client failed: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl UiDriver for HttpDriver {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities::navigate_only()
    }

    fn open_session(
        &self,
        base_url: &str,
        auth: &AuthContext,
    ) -> Result<Box<dyn UiSession>, DriverError> {
        if auth.mode != AuthMode::Anon && auth.credential().is_none() {
            return Err(DriverError::AuthUnavailable { mode: auth.mode });
        }
        let markers = Regex::new(r#"data-ux-(state|render)="([^"]+)""#).map_err(|e| {
            DriverError::Transport {
                detail: format!("marker pattern failed: {e}"),
            }
        })?;
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            auth: auth.clone(),
            markers,
            current_route: String::new(),
            visible: BTreeSet::new(),
            requests: Vec::new(),
        }))
    }
}

struct HttpSession {
    client: Client,
    base_url: String,
    auth: AuthContext,
    markers: Regex,
    current_route: String,
    visible: BTreeSet<String>,
    requests: Vec<String>,
}

impl HttpSession {
    fn unsupported() -> DriverError {
        DriverError::Unsupported {
            capability: "interact",
            driver: DRIVER_NAME,
        }
    }

    fn scan_markers(&mut self, body: &str) -> Option<String> {
        let mut render = None;
        for caps in self.markers.captures_iter(body) {
            let value = caps[2].to_string();
            match &caps[1] {
                "render" => render = Some(value),
                _ => {
                    self.visible.insert(value);
                }
            }
        }
        render
    }
}

pub(crate) fn classify_status(status: u16, render_marker: Option<&str>) -> PageRender {
    match status {
        200..=299 => match render_marker {
            Some("empty") => PageRender::Empty,
            Some("degraded") => PageRender::Degraded,
            _ => PageRender::Rendered,
        },
        500..=599 => PageRender::Degraded,
        other => PageRender::Error(format!("HTTP {other}")),
    }
}

impl UiSession for HttpSession {
    fn navigate(&mut self, route: &str, wait: Duration) -> Result<PageRender, DriverError> {
        let url = format!("{}{}", self.base_url, normalize_route(route));
        let mut request = self.client.get(&url).timeout(wait);
        request = match (self.auth.mode, self.auth.credential()) {
            (AuthMode::JwtAdmin, Some(token)) => {
                request.header(AUTHORIZATION, format!("Bearer {token}"))
            }
            (AuthMode::PortalSso, Some(session)) => {
                request.header(COOKIE, format!("{SESSION_COOKIE}={session}"))
            }
            _ => request,
        };
        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                DriverError::Timeout {
                    operation: format!("navigate {route}"),
                    waited_ms: duration_ms(wait),
                }
            } else {
                DriverError::Navigation {
                    route: route.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let status = response.status().as_u16();
        self.current_route = normalize_route(response.url().path());
        self.requests.push(format!("GET {}", normalize_route(route)));
        self.visible.clear();
        let body = response.text().map_err(|e| DriverError::Transport {
            detail: format!("read body of {route} failed: {e}"),
        })?;
        let render = self.scan_markers(&body);
        Ok(classify_status(status, render.as_deref()))
    }

    fn find_control(&mut self, _selector: &str) -> Result<Option<ControlState>, DriverError> {
        Err(Self::unsupported())
    }

    fn click(&mut self, _selector: &str, _wait: Duration) -> Result<Effects, DriverError> {
        Err(Self::unsupported())
    }

    fn fill(&mut self, _selector: &str, _value: &str) -> Result<(), DriverError> {
        Err(Self::unsupported())
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
