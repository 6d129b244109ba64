//! Deployment environment detection

use std::fmt;

/// Environment variable naming the deployment environment
pub const ENV_VAR: &str = "VROUTE_ENV";

/// Environment profile for the application.
///
/// Detected from the `VROUTE_ENV` environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    /// Development environment with debug logging.
    Development,
    /// Production environment.
    Production,
    /// Custom environment name for specialized deployments.
    Custom(String),
}

impl Environment {
    /// Detect the current environment from `VROUTE_ENV`.
    ///
    /// Returns:
    /// - `Production` if `VROUTE_ENV` is "production" or "prod"
    /// - `Development` if `VROUTE_ENV` is "development", "dev", or not set
    /// - `Custom(name)` for any other value
    pub fn current() -> Self {
        match std::env::var(ENV_VAR).as_deref() {
            Ok("production") | Ok("prod") => Self::Production,
            Ok("development") | Ok("dev") | Err(_) => Self::Development,
            Ok(other) => Self::Custom(other.to_string()),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if running in development mode.
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Get the environment name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Get the default log level for this environment.
    ///
    /// - Development: "debug"
    /// - Production: "info"
    /// - Custom: "info"
    pub fn default_log_level(&self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Production | Self::Custom(_) => "info",
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
