//! Configuration management with environment variable support.
//!
//! This module provides configuration loading from `.env` files, typed
//! configuration extraction via [`Config<T>`], and the environment mapping for
//! [`VersioningOptions`].
//!
//! # Example
//!
//! ```ignore
//! use vroute_extras::config::{load_dotenv, versioning_options_from_env};
//!
//! // Load .env file at startup
//! load_dotenv();
//!
//! // VROUTE_HEADER_NAME=x-api-version, VROUTE_DEFAULT_VERSION=2.0, ...
//! let options = versioning_options_from_env()?;
//! ```

use serde::de::DeserializeOwned;
use thiserror::Error;
use vroute_core::VersioningOptions;

pub use crate::environment::Environment;

/// Prefix of the variables read by [`versioning_options_from_env`]
pub const VERSIONING_PREFIX: &str = "VROUTE";

/// Error type for configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable deserialization failed.
    #[error("Configuration error: {0}")]
    Env(#[from] envy::Error),
}

/// Configuration extractor that deserializes environment variables.
///
/// Uses the `envy` crate to deserialize environment variables into
/// a typed configuration struct. Field names are converted to
/// SCREAMING_SNAKE_CASE for environment variable lookup.
///
/// # Example
///
/// ```ignore
/// use vroute_extras::config::Config;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct RoutingConfig {
///     route_prefix: String,  // Reads from ROUTE_PREFIX
/// }
///
/// let config = Config::<RoutingConfig>::from_env()?;
/// println!("Prefix: {}", config.route_prefix);
/// ```
#[derive(Debug, Clone)]
pub struct Config<T>(pub T);

impl<T: DeserializeOwned> Config<T> {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required environment variables are missing
    /// or if deserialization fails.
    pub fn from_env() -> Result<Self, ConfigError> {
        envy::from_env::<T>().map(Config).map_err(ConfigError::from)
    }

    /// Load configuration with a prefix.
    ///
    /// Only environment variables starting with the given prefix
    /// (followed by underscore) will be considered.
    pub fn from_env_prefixed(prefix: &str) -> Result<Self, ConfigError> {
        envy::prefixed(format!("{}_", prefix))
            .from_env::<T>()
            .map(Config)
            .map_err(ConfigError::from)
    }

    /// Get the inner configuration value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Config<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Read [`VersioningOptions`] from `VROUTE_*` variables.
///
/// | Variable | Field |
/// |----------|-------|
/// | `VROUTE_ASSUME_DEFAULT_VERSION_WHEN_UNSPECIFIED` | `assume_default_version_when_unspecified` |
/// | `VROUTE_DEFAULT_VERSION` | `default_version` |
/// | `VROUTE_REPORT_API_VERSIONS` | `report_api_versions` |
/// | `VROUTE_QUERY_PARAMETER` | `query_parameter` |
/// | `VROUTE_HEADER_NAME` | `header_name` |
/// | `VROUTE_URL_SEGMENT_PARAMETER` | `url_segment_parameter` |
///
/// Unset variables keep their defaults. An empty value disables a version
/// source.
pub fn versioning_options_from_env() -> Result<VersioningOptions, ConfigError> {
    let Config(mut options) = Config::<VersioningOptions>::from_env_prefixed(VERSIONING_PREFIX)?;
    for source in [
        &mut options.query_parameter,
        &mut options.header_name,
        &mut options.url_segment_parameter,
    ] {
        if source.as_deref().is_some_and(|value| value.trim().is_empty()) {
            *source = None;
        }
    }

    tracing::debug!(
        default_version = %options.default_version,
        query = ?options.query_parameter,
        header = ?options.header_name,
        segment = ?options.url_segment_parameter,
        "Versioning options loaded from environment"
    );
    Ok(options)
}

/// Load environment variables from a `.env` file.
///
/// Existing environment variables take precedence over `.env` values and a
/// missing file is not an error.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Load environment variables from a specific file path.
pub fn load_dotenv_from<P: AsRef<std::path::Path>>(path: P) {
    let _ = dotenvy::from_path(path);
}
