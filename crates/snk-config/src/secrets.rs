//! Cluster credential resolution.
//!
//! # Contract
//! - Config stores only env var NAMES (`cluster.auth_env.username|password`).
//! - Credentials are resolved once at startup and passed to the service
//!   constructor.
//! - `Debug` redacts values; errors name the variable, never the value.

use anyhow::{bail, Result};

use crate::Settings;

/// Resolved basic-auth pair. **Values are redacted in `Debug` output.**
#[derive(Clone)]
pub struct ClusterCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for ClusterCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterCredentials")
            .field("username", &"<REDACTED>")
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// Resolve from the process environment.
pub fn resolve_credentials(settings: &Settings) -> Result<Option<ClusterCredentials>> {
    resolve_credentials_with(settings, |name| std::env::var(name).ok())
}

/// `Ok(None)` when neither variable is set: the cluster is reached without
/// auth. Exactly one of the two set is an error.
pub fn resolve_credentials_with<F>(
    settings: &Settings,
    lookup: F,
) -> Result<Option<ClusterCredentials>>
where
    F: Fn(&str) -> Option<String>,
{
    let names = &settings.cluster.auth_env;
    let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    match (non_blank(&names.username), non_blank(&names.password)) {
        (Some(username), Some(password)) => Ok(Some(ClusterCredentials { username, password })),
        (None, None) => Ok(None),
        (Some(_), None) => bail!(
            "SECRETS_INCOMPLETE: env var '{}' is set but '{}' is not set or empty",
            names.username,
            names.password
        ),
        (None, Some(_)) => bail!(
            "SECRETS_INCOMPLETE: env var '{}' is set but '{}' is not set or empty",
            names.password,
            names.username
        ),
    }
}
