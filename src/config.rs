//! Auth service configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_AUTH_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_AUTH_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_AUTH_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid AUTH_BASE_URL `{0}`: expected an http(s) URL")]
    InvalidBaseUrl(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl AuthTimeouts {
    #[must_use]
    pub fn request(self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn connect(self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for AuthTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_AUTH_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_AUTH_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Backend origin without trailing slash, e.g. `http://127.0.0.1:8000`.
    pub base_url: String,
    pub timeouts: AuthTimeouts,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_AUTH_BASE_URL.to_owned(), timeouts: AuthTimeouts::default() }
    }
}

impl AuthConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `AUTH_BASE_URL`: default `http://127.0.0.1:8000`
    /// - `AUTH_REQUEST_TIMEOUT_SECS`: default 30
    /// - `AUTH_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the base URL is empty or not http(s).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the base URL is empty or not http(s).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(lookup("AUTH_BASE_URL").as_deref())?;
        let timeouts = AuthTimeouts {
            request_secs: parse_secs(lookup("AUTH_REQUEST_TIMEOUT_SECS").as_deref(), DEFAULT_AUTH_REQUEST_TIMEOUT_SECS),
            connect_secs: parse_secs(lookup("AUTH_CONNECT_TIMEOUT_SECS").as_deref(), DEFAULT_AUTH_CONNECT_TIMEOUT_SECS),
        };
        Ok(Self { base_url, timeouts })
    }

    /// Override the base URL, applying the same checks as `AUTH_BASE_URL`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] unless the URL is http(s).
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> Result<Self, ConfigError> {
        self.base_url = parse_base_url(Some(base_url.as_ref()))?;
        Ok(self)
    }
}

fn parse_base_url(raw: Option<&str>) -> Result<String, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_AUTH_BASE_URL.to_owned());
    };
    let trimmed = raw.trim().trim_end_matches('/');
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidBaseUrl(raw.to_owned()));
    }
    Ok(trimmed.to_owned())
}

fn parse_secs(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
