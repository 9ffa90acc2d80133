//! Shared-credential authentication.
//!
//! There is no session store: a request is authenticated when it carries the
//! session cookie with exactly [`SESSION_MARKER`] as its value.

use subtle::ConstantTimeEq;

use crate::app_config::Environment;

pub const SESSION_COOKIE_NAME: &str = "portal_session";
pub const SESSION_MARKER: &str = "1";
/// Seven days.
pub const SESSION_MAX_AGE_SECS: u64 = 60 * 60 * 24 * 7;

const DEV_ADMIN_USER: &str = "admin";
const DEV_ADMIN_PASS: &str = "admin123";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Session {
    Authenticated,
    Anonymous,
}

impl Session {
    /// Classify the raw session cookie value, if any.
    #[must_use]
    pub fn from_cookie(value: Option<&str>) -> Self {
        match value {
            Some(v) if v == SESSION_MARKER => Session::Authenticated,
            _ => Session::Anonymous,
        }
    }

    #[must_use]
    pub fn is_authenticated(self) -> bool {
        matches!(self, Session::Authenticated)
    }
}

/// The single username/password pair that unlocks the portal.
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &"[redacted]")
            .field("password", &"[redacted]")
            .finish()
    }
}

/// Credentials after environment defaults have been applied.
#[derive(Debug, Clone)]
pub struct ResolvedCredentials {
    pub credentials: Credentials,
    /// True when at least one secret came from the development fallback.
    pub using_dev_defaults: bool,
}

/// One or both secrets are unset in a production deployment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("server auth environment variables are missing: {}", .missing.join(", "))]
pub struct MissingCredentials {
    pub missing: Vec<&'static str>,
}

impl Credentials {
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Apply the environment policy to the configured secrets.
    ///
    /// Outside production a missing secret falls back to the fixed development
    /// value. In production both must be set.
    ///
    /// # Errors
    ///
    /// Returns [`MissingCredentials`] naming `ADMIN_USER` and/or `ADMIN_PASS`.
    pub fn resolve(
        env: &Environment,
        admin_user: Option<&str>,
        admin_pass: Option<&str>,
    ) -> Result<ResolvedCredentials, MissingCredentials> {
        let using_dev_defaults = admin_user.is_none() || admin_pass.is_none();

        if env.is_production() && using_dev_defaults {
            let missing = [("ADMIN_USER", admin_user), ("ADMIN_PASS", admin_pass)]
                .into_iter()
                .filter(|(_, value)| value.is_none())
                .map(|(key, _)| key)
                .collect();
            return Err(MissingCredentials { missing });
        }

        Ok(ResolvedCredentials {
            credentials: Credentials::new(
                admin_user.unwrap_or(DEV_ADMIN_USER),
                admin_pass.unwrap_or(DEV_ADMIN_PASS),
            ),
            using_dev_defaults,
        })
    }

    /// Exact match on both fields. Both comparisons always run so the
    /// outcome does not reveal which one failed.
    #[must_use]
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        (user_ok & pass_ok).into()
    }
}
