//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `KHAJA_API_BASE_URL` - Backend origin, e.g. `https://api.khaja.app/api`
//!
//! ## Optional
//! - `KHAJA_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `KHAJA_DATA_DIR` - Directory for durable client state (default: `.khaja`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend origin; all gateway requests are resolved relative to it.
    pub base_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Directory holding durable client state (credentials, cart, location).
    pub data_dir: PathBuf,
}

impl ApiConfig {
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

        let base_url = get_required_env("KHAJA_API_BASE_URL")?
            .parse::<Url>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("KHAJA_API_BASE_URL".to_string(), e.to_string())
            })?;

        let timeout_secs = get_env_or_default("KHAJA_REQUEST_TIMEOUT_SECS", "30")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("KHAJA_REQUEST_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let data_dir = PathBuf::from(get_env_or_default("KHAJA_DATA_DIR", ".khaja"));

        Ok(Self {
            base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            data_dir,
        })
    }

    /// Build a configuration directly (mainly for tests and embedding).
    #[must_use]
    pub fn new(base_url: Url, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_url,
            request_timeout: Duration::from_secs(30),
            data_dir: data_dir.into(),
        }
    }

    /// Path of the durable credential record.
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join("credentials.json")
    }

    /// Path of the durable cart record.
    #[must_use]
    pub fn cart_path(&self) -> PathBuf {
        self.data_dir.join("cart.json")
    }

    /// Path of the durable delivery-location record.
    #[must_use]
    pub fn location_path(&self) -> PathBuf {
        self.data_dir.join("location.json")
    }

    /// Directory holding durable client state.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
