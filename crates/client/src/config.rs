//! Client configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const API_URL_ENV: &str = "BIZDESK_API_URL";
pub const TIMEOUT_ENV: &str = "BIZDESK_TIMEOUT_SECS";
pub const SESSION_FILE_ENV: &str = "BIZDESK_SESSION_FILE";
pub const STALE_ENV: &str = "BIZDESK_STALE_SECS";
pub const PAGE_SIZE_ENV: &str = "BIZDESK_PAGE_SIZE";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer (got {value:?})")]
    InvalidNumber { key: &'static str, value: String },

    #[error("{key} must be an http(s) URL (got {value:?})")]
    InvalidUrl { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, without trailing slash (`http://localhost:8080`).
    pub api_url: String,
    pub timeout: Duration,
    /// Session file override; `None` means the per-user default location.
    pub session_path: Option<PathBuf>,
    /// How long fetched lists stay fresh in the query cache.
    pub stale_after: Duration,
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080".to_string(),
            timeout: Duration::from_secs(30),
            session_path: None,
            stale_after: Duration::from_secs(30),
            page_size: 25,
        }
    }
}

impl ClientConfig {
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self {
            api_url: normalize_url(&api_url.into()),
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset or blank keys keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = get(API_URL_ENV) {
            let url = normalize_url(&url);
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl {
                    key: API_URL_ENV,
                    value: url,
                });
            }
            config.api_url = url;
        }
        if let Some(v) = get(TIMEOUT_ENV) {
            config.timeout = Duration::from_secs(parse_positive(TIMEOUT_ENV, &v)?);
        }
        if let Some(v) = get(STALE_ENV) {
            config.stale_after = Duration::from_secs(parse_positive(STALE_ENV, &v)?);
        }
        if let Some(v) = get(PAGE_SIZE_ENV) {
            let size = parse_positive(PAGE_SIZE_ENV, &v)?;
            config.page_size = u32::try_from(size).map_err(|_| ConfigError::InvalidNumber {
                key: PAGE_SIZE_ENV,
                value: v.clone(),
            })?;
        }
        config.session_path = get(SESSION_FILE_ENV).map(PathBuf::from);

        Ok(config)
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_positive(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        }),
    }
}
