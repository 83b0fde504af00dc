//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//! - `FITSUPPLY_API_URL` - Backend origin (default: `http://127.0.0.1:8000`)
//! - `FITSUPPLY_API_PREFIX` - Versioned API prefix (default: `/api/v1`)
//! - `FITSUPPLY_STATE_DIR` - Directory for durable client state (default: `.fitsupply`)
//! - `FITSUPPLY_CART_SYNC_DEBOUNCE_MS` - Quiet period before a cart upload (default: 1000)
//! - `FITSUPPLY_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `FITSUPPLY_SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_API_PREFIX: &str = "/api/v1";
const DEFAULT_STATE_DIR: &str = ".fitsupply";
const DEFAULT_DEBOUNCE_MS: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// FitSupply client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://api.fitsupply.example`
    pub api_url: Url,
    /// Versioned prefix appended to the origin, e.g. `/api/v1`
    pub api_prefix: String,
    /// Directory holding the durable cart and token records
    pub state_dir: PathBuf,
    /// Quiet period after the last cart edit before uploading the cart
    pub cart_sync_debounce: Duration,
    /// Timeout applied to every HTTP request
    pub http_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let api_url = parse_api_url("FITSUPPLY_API_URL", &get_or("FITSUPPLY_API_URL", DEFAULT_API_URL))?;
        let api_prefix = normalize_prefix(&get_or("FITSUPPLY_API_PREFIX", DEFAULT_API_PREFIX));
        let state_dir = PathBuf::from(get_or("FITSUPPLY_STATE_DIR", DEFAULT_STATE_DIR));
        let debounce_ms = parse_u64(
            "FITSUPPLY_CART_SYNC_DEBOUNCE_MS",
            lookup("FITSUPPLY_CART_SYNC_DEBOUNCE_MS"),
            DEFAULT_DEBOUNCE_MS,
        )?;
        let timeout_secs = parse_u64(
            "FITSUPPLY_HTTP_TIMEOUT_SECS",
            lookup("FITSUPPLY_HTTP_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "FITSUPPLY_HTTP_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        let sentry_dsn = lookup("FITSUPPLY_SENTRY_DSN").filter(|dsn| !dsn.trim().is_empty());

        Ok(Self {
            api_url,
            api_prefix,
            state_dir,
            cart_sync_debounce: Duration::from_millis(debounce_ms),
            http_timeout: Duration::from_secs(timeout_secs),
            sentry_dsn,
        })
    }

    /// Configuration pointing at a specific backend and state directory,
    /// with defaults for everything else.
    #[must_use]
    pub fn for_backend(api_url: Url, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_url,
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            state_dir: state_dir.into(),
            cart_sync_debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MS),
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            sentry_dsn: None,
        }
    }

    /// Override the cart sync quiet period.
    #[must_use]
    pub const fn with_cart_sync_debounce(mut self, debounce: Duration) -> Self {
        self.cart_sync_debounce = debounce;
        self
    }

    /// The full API base, e.g. `http://127.0.0.1:8000/api/v1`, without a
    /// trailing slash.
    #[must_use]
    pub fn api_base(&self) -> String {
        format!(
            "{}{}",
            self.api_url.as_str().trim_end_matches('/'),
            self.api_prefix
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse the backend origin; only http(s) URLs are accepted.
fn parse_api_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Ensure the prefix has exactly one leading slash and no trailing slash.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

/// Parse an optional unsigned integer with a default.
fn parse_u64(key: &str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    value.map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
