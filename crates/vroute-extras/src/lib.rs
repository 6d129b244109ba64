//! # vroute-extras
//!
//! Optional ambient features for vroute, opt-in via Cargo feature flags.
//!
//! ## Features
//!
//! - `config` - `VROUTE_*` environment configuration with `.env` file support
//! - `logging` - tracing subscriber initialisation
//! - `full` - All features enabled
//!
//! ## Example
//!
//! ```toml
//! [dependencies]
//! vroute-extras = { version = "0.1", features = ["config", "logging"] }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

// Deployment environment detection
pub mod environment;

// Configuration management module
#[cfg(feature = "config")]
pub mod config;

// Tracing subscriber setup
#[cfg(feature = "logging")]
pub mod logging;

// Re-exports for convenience
pub use environment::Environment;

#[cfg(feature = "config")]
pub use config::{
    load_dotenv, load_dotenv_from, versioning_options_from_env, Config, ConfigError,
};

#[cfg(feature = "logging")]
pub use logging::{init_logging, LogConfig, LogFormat, LoggingError};
