//! Tracing subscriber setup
//!
//! Routing events are emitted under the `vroute` target. [`init_logging`]
//! installs a global `fmt` subscriber filtered by `RUST_LOG`, falling back to
//! the level configured in [`LogConfig`].
//!
//! # Example
//!
//! ```rust,no_run
//! use vroute_extras::logging::{init_logging, LogConfig, LogFormat};
//!
//! init_logging(LogConfig::default().format(LogFormat::Pretty)).unwrap();
//! ```

use crate::environment::Environment;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Logging format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// One line per event
    #[default]
    Compact,
    /// Multi-line, human oriented
    Pretty,
    /// The `fmt` default format
    Full,
}

/// Logging configuration
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info,vroute=debug`
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Whether to print event targets
    pub with_target: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::for_environment(&Environment::current())
    }
}

impl LogConfig {
    /// Defaults for an environment: its default level, compact output
    pub fn for_environment(environment: &Environment) -> Self {
        Self {
            level: environment.default_log_level().to_string(),
            format: LogFormat::Compact,
            with_target: true,
        }
    }

    /// Set the fallback filter directive
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the output format
    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Show or hide event targets
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// Build the filter: `RUST_LOG` if set, else the configured level
    pub fn filter(&self) -> Result<EnvFilter, LoggingError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level).map_err(|e| LoggingError::InvalidFilter {
                directive: self.level.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Error returned by [`init_logging`]
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The configured directive does not parse
    #[error("invalid log filter \"{directive}\": {reason}")]
    InvalidFilter {
        /// The rejected directive
        directive: String,
        /// Parser message
        reason: String,
    },
    /// A global subscriber is already installed
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Install the global tracing subscriber
pub fn init_logging(config: LogConfig) -> Result<(), LoggingError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.filter()?)
        .with_target(config.with_target);

    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Full => builder.try_init(),
    };
    installed.map_err(|e| LoggingError::Init(e.to_string()))?;

    tracing::debug!(target: "vroute", level = %config.level, format = ?config.format, "Logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_environment_defaults() {
        let dev = LogConfig::for_environment(&Environment::Development);
        assert_eq!(dev.level, "debug");
        assert_eq!(dev.format, LogFormat::Compact);

        let prod = LogConfig::for_environment(&Environment::Production);
        assert_eq!(prod.level, "info");
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::for_environment(&Environment::Production)
            .level("warn,vroute=trace")
            .format(LogFormat::Pretty)
            .with_target(false);
        assert_eq!(config.level, "warn,vroute=trace");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.with_target);
    }

    #[test]
    #[serial]
    fn test_invalid_filter_directive() {
        std::env::remove_var("RUST_LOG");
        let config = LogConfig::default().level("vroute=notalevel");
        assert!(matches!(config.filter(), Err(LoggingError::InvalidFilter { .. })));
    }

    #[test]
    #[serial]
    fn test_second_init_fails() {
        std::env::remove_var("RUST_LOG");
        let _ = init_logging(LogConfig::default());
        let second = init_logging(LogConfig::default());
        assert!(matches!(second, Err(LoggingError::Init(_))));
    }
}
