// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use uxgate_model::AuthMode;

pub const PORTAL_SESSION_ENV: &str = "UX_GATE_PORTAL_SESSION";
pub const ADMIN_JWT_ENV: &str = "UX_GATE_ADMIN_JWT";

/// Credentials an audit runs with. Passed explicitly into every auditor call.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub mode: AuthMode,
    credential: Option<String>,
}

impl AuthContext {
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            mode: AuthMode::Anon,
            credential: None,
        }
    }

    #[must_use]
    pub fn with_credential(mode: AuthMode, credential: &str) -> Self {
        Self {
            mode,
            credential: Some(credential.to_string()),
        }
    }

    pub fn credential(&self) -> Option<&str> {
        self.credential.as_deref()
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("mode", &self.mode)
            .field(
                "credential",
                &self.credential.as_ref().map(|_| "<hidden>"),
            )
            .finish()
    }
}

/// Fixture values supplied by the surrounding harness.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthFixtures {
    pub portal_session: Option<String>,
    pub admin_jwt: Option<String>,
}

impl AuthFixtures {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            portal_session: non_empty(PORTAL_SESSION_ENV),
            admin_jwt: non_empty(ADMIN_JWT_ENV),
        }
    }

    /// `None` when the fixture for `mode` is unavailable; the audit is skipped.
    #[must_use]
    pub fn context_for(&self, mode: AuthMode) -> Option<AuthContext> {
        match mode {
            AuthMode::Anon => Some(AuthContext::anonymous()),
            AuthMode::PortalSso => self
                .portal_session
                .as_deref()
                .map(|v| AuthContext::with_credential(mode, v)),
            AuthMode::JwtAdmin => self
                .admin_jwt
                .as_deref()
                .map(|v| AuthContext::with_credential(mode, v)),
        }
    }

    #[must_use]
    pub fn available_modes(&self) -> Vec<AuthMode> {
        AuthMode::ALL
            .into_iter()
            .filter(|mode| self.context_for(*mode).is_some())
            .collect()
    }
}

impl fmt::Debug for AuthFixtures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthFixtures")
            .field("portal_session", &self.portal_session.is_some())
            .field("admin_jwt", &self.admin_jwt.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fixtures_make_modes_unavailable() {
        let fixtures = AuthFixtures::from_lookup(|key| {
            (key == ADMIN_JWT_ENV).then(|| "eyJhbGciOi.payload.sig".to_string())
        });
        assert!(fixtures.context_for(AuthMode::Anon).is_some());
        assert!(fixtures.context_for(AuthMode::PortalSso).is_none());
        assert_eq!(
            fixtures.available_modes(),
            vec![AuthMode::Anon, AuthMode::JwtAdmin]
        );
    }

    #[test]
    fn blank_fixture_counts_as_missing() {
        let fixtures = AuthFixtures::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(fixtures.available_modes(), vec![AuthMode::Anon]);
    }

    #[test]
    fn debug_output_never_shows_credentials() {
        let ctx = AuthContext::with_credential(AuthMode::PortalSso, "session=secret-cookie");
        let fixtures = AuthFixtures {
            portal_session: Some("secret-cookie".to_string()),
            admin_jwt: None,
        };
        assert!(!format!("{ctx:?}").contains("secret"));
        assert!(!format!("{fixtures:?}").contains("secret"));
    }
}
