//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CAFE_API_BASE_URL` - Base URL of the catalog API (e.g., `https://cafe.example.com/api`)
//!
//! ## Optional
//! - `CAFE_STORAGE_DIR` - Directory for the persisted session token (default: `.cafe`)
//! - `CAFE_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)
//! - `CAFE_PRODUCT_LIMIT` - Number of products fetched by a refresh (default: 50)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_DIR: &str = ".cafe";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Products fetched per refresh unless configured otherwise.
pub const DEFAULT_PRODUCT_LIMIT: u32 = 50;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Catalog client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Directory backing the token store
    pub storage_dir: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
    /// Default `limite` for product list refreshes
    pub product_limit: u32,
}

impl ClientConfig {
    /// Configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            product_limit: DEFAULT_PRODUCT_LIMIT,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(&get_required(&lookup, "CAFE_API_BASE_URL")?)?;
        let storage_dir = PathBuf::from(get_or_default(
            &lookup,
            "CAFE_STORAGE_DIR",
            DEFAULT_STORAGE_DIR,
        ));
        let timeout_secs = get_or_default(
            &lookup,
            "CAFE_HTTP_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("CAFE_HTTP_TIMEOUT_SECS".to_string(), e.to_string()))?;
        let product_limit = get_or_default(
            &lookup,
            "CAFE_PRODUCT_LIMIT",
            &DEFAULT_PRODUCT_LIMIT.to_string(),
        )
        .parse::<u32>()
        .map_err(|e| ConfigError::InvalidEnvVar("CAFE_PRODUCT_LIMIT".to_string(), e.to_string()))?;

        Ok(Self {
            base_url,
            storage_dir,
            timeout: Duration::from_secs(timeout_secs),
            product_limit,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a variable with a default value.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Parse the API base URL, rejecting URLs that cannot carry a path.
fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value.trim()).map_err(|e| {
        ConfigError::InvalidEnvVar("CAFE_API_BASE_URL".to_string(), e.to_string())
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "CAFE_API_BASE_URL".to_string(),
            format!("{url} is not an http(s) base URL"),
        ));
    }
    Ok(url)
}
