//! Client configuration
//!
//! Everything is read from the environment once at startup. Invalid values are
//! reported instead of silently replaced by defaults.

use crate::transport::RetryPolicy;
use std::num::NonZeroUsize;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: usize = 6;
pub const DEFAULT_RETRY_BASE_MS: u64 = 1000;

/// Greeting shown before the first exchange
pub const WELCOME_MESSAGE: &str = "Hi! I'm EkoAssist, your Lagos housing guide. I can help you find properties, check rent prices, and learn from tenant experiences. What area are you interested in?";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("page size must be at least 1, got {0}")]
    InvalidPageSize(i64),
    #[error("request timeout must be at least 1 second")]
    ZeroTimeout,
    #[error("{name} is not a valid number: {value:?}")]
    NotANumber { name: &'static str, value: String },
}

/// Number of properties shown per page of a reply. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize(NonZeroUsize);

impl PageSize {
    /// Accepts a signed value so that negative inputs are rejected with the
    /// value that was supplied rather than a parse failure.
    pub fn new(size: i64) -> Result<Self, ConfigError> {
        usize::try_from(size)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(Self)
            .ok_or(ConfigError::InvalidPageSize(size))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(NonZeroUsize::new(DEFAULT_PAGE_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub page_size: PageSize,
    pub retry: RetryPolicy,
    pub welcome_message: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: PageSize::default(),
            retry: RetryPolicy::disabled(),
            welcome_message: Some(WELCOME_MESSAGE.to_string()),
        }
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = lookup("EKOASSIST_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout_secs: u64 = parse_var(&lookup, "EKOASSIST_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let page_size = match parse_var::<i64>(&lookup, "EKOASSIST_PAGE_SIZE")? {
            Some(size) => PageSize::new(size)?,
            None => PageSize::default(),
        };

        let max_retries: u32 = parse_var(&lookup, "EKOASSIST_MAX_RETRIES")?.unwrap_or(0);
        let base_ms: u64 =
            parse_var(&lookup, "EKOASSIST_RETRY_BASE_MS")?.unwrap_or(DEFAULT_RETRY_BASE_MS);

        let welcome_message = match lookup("EKOASSIST_WELCOME").as_deref().map(str::trim) {
            Some("0" | "false" | "off" | "no") => None,
            _ => Some(WELCOME_MESSAGE.to_string()),
        };

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            page_size,
            retry: RetryPolicy::new(max_retries, Duration::from_millis(base_ms)),
            welcome_message,
        })
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::NotANumber { name, value: raw }),
    }
}
