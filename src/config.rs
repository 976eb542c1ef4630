//! Configuration module for environment variables and client settings

use anyhow::{Context, Result, anyhow};
use once_cell::sync::Lazy;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::auth::Role;

const DEFAULT_API_BASE_URL: &str = "http://ams-java.duckdns.org/api/v1";
const DEFAULT_SESSION_FILE: &str = ".ams-session.json";
const DEFAULT_TOAST_TTL_MS: u64 = 5000;

/// Global client configuration loaded from environment variables
pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    Config::from_env().expect("Failed to load configuration from environment")
});

#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base address every gateway path is appended to
    pub api_base_url: Url,

    /// File backing the persisted session record
    pub session_file: PathBuf,

    /// Lifetime of a toast when the caller does not pick one
    pub toast_ttl: Duration,

    /// Credentials for an automatic login, if configured
    pub login: Option<LoginConfig>,
}

#[derive(Clone)]
pub struct LoginConfig {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for LoginConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = lookup("AMS_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = Url::parse(&api_base_url)
            .with_context(|| format!("AMS_API_BASE_URL is not a valid URL: {}", api_base_url))?;
        if api_base_url.cannot_be_a_base() {
            return Err(anyhow!("AMS_API_BASE_URL must be an absolute http(s) URL"));
        }

        let toast_ttl_ms = match lookup("AMS_TOAST_TTL_MS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .with_context(|| format!("AMS_TOAST_TTL_MS must be milliseconds, got {}", raw))?,
            None => DEFAULT_TOAST_TTL_MS,
        };

        let login = match (lookup("AMS_USERNAME"), lookup("AMS_PASSWORD")) {
            (Some(username), Some(password)) => Some(LoginConfig {
                username,
                password,
                role: lookup("AMS_ROLE")
                    .map(|r| r.parse::<Role>())
                    .transpose()
                    .map_err(|e| anyhow!("AMS_ROLE: {}", e))?
                    .unwrap_or(Role::Customer),
            }),
            _ => None,
        };

        Ok(Self {
            api_base_url,
            session_file: lookup("AMS_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
            toast_ttl: Duration::from_millis(toast_ttl_ms),
            login,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_base_url.as_str(), DEFAULT_API_BASE_URL);
        assert_eq!(config.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
        assert_eq!(config.toast_ttl, Duration::from_millis(5000));
        assert!(config.login.is_none());
    }

    #[test]
    fn login_needs_username_and_password() {
        assert!(load(&[("AMS_USERNAME", "ana")]).unwrap().login.is_none());

        let config = load(&[
            ("AMS_USERNAME", "ops"),
            ("AMS_PASSWORD", "secret"),
            ("AMS_ROLE", "employee"),
        ])
        .unwrap();
        let login = config.login.unwrap();
        assert_eq!(login.role, Role::Employee);
        assert!(!format!("{:?}", login).contains("secret"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(load(&[("AMS_API_BASE_URL", "not a url")]).is_err());
        assert!(load(&[("AMS_TOAST_TTL_MS", "soon")]).is_err());
        assert!(load(&[("AMS_USERNAME", "a"), ("AMS_PASSWORD", "b"), ("AMS_ROLE", "pilot")]).is_err());
    }
}
