//! Client configuration.

use std::time::Duration;

use thiserror::Error;

/// Default backend origin.
pub const DEFAULT_API_BASE: &str = "http://localhost:8080";
/// Default page size.
pub const DEFAULT_PER_PAGE: u32 = 20;
/// Largest page size the backend honours.
pub const MAX_PER_PAGE: u32 = 100;
/// Default reconnection backoff floor.
pub const DEFAULT_RECONNECT_FLOOR: Duration = Duration::from_millis(3000);
/// Default reconnection backoff ceiling.
pub const DEFAULT_RECONNECT_CEILING: Duration = Duration::from_millis(30_000);
/// Default timeout for REST requests.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("per_page must be between 1 and 100, got {0}")]
    PerPageOutOfRange(u32),
    #[error("Reconnect floor must be non-zero and not exceed the ceiling")]
    InvalidBackoff,
}

/// Settings shared by the HTTP collaborator, the feed store and the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend origin, e.g. `http://localhost:8080`.
    pub api_base: String,
    /// Page size for listings.
    pub per_page: u32,
    /// Reconnection delay after a successful open.
    pub reconnect_floor: Duration,
    /// Upper bound for the reconnection delay.
    pub reconnect_ceiling: Duration,
    /// Timeout applied to each REST request (never to the stream).
    pub request_timeout: Duration,
    /// Session cookie to seed the cookie jar with (`name=value`).
    pub session_cookie: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl ClientConfig {
    /// Create a configuration for a backend origin with default settings.
    #[must_use]
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            per_page: DEFAULT_PER_PAGE,
            reconnect_floor: DEFAULT_RECONNECT_FLOOR,
            reconnect_ceiling: DEFAULT_RECONNECT_CEILING,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            session_cookie: None,
        }
    }

    /// Load from `FEED_SYNC_*` environment variables.
    ///
    /// # Errors
    /// Returns error if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    ///
    /// # Errors
    /// Returns error if a variable is set but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(
            lookup("FEED_SYNC_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        );

        if let Some(v) = lookup("FEED_SYNC_PER_PAGE") {
            config.per_page = parse(&v, "FEED_SYNC_PER_PAGE")?;
        }
        if let Some(v) = lookup("FEED_SYNC_RECONNECT_FLOOR_MS") {
            config.reconnect_floor =
                Duration::from_millis(parse(&v, "FEED_SYNC_RECONNECT_FLOOR_MS")?);
        }
        if let Some(v) = lookup("FEED_SYNC_RECONNECT_CEILING_MS") {
            config.reconnect_ceiling =
                Duration::from_millis(parse(&v, "FEED_SYNC_RECONNECT_CEILING_MS")?);
        }
        config.session_cookie = lookup("FEED_SYNC_SESSION_COOKIE").filter(|c| !c.is_empty());

        config.validate()?;
        Ok(config)
    }

    /// Check invariants between fields.
    ///
    /// # Errors
    /// Returns error on an out of range page size or inverted backoff bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(ConfigError::PerPageOutOfRange(self.per_page));
        }
        if self.reconnect_floor.is_zero() || self.reconnect_floor > self.reconnect_ceiling {
            return Err(ConfigError::InvalidBackoff);
        }
        Ok(())
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &'static str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
