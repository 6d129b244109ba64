//! # vroute
//!
//! API-version-aware route resolution.
//!
//! Register one route family per resource model generation: each API version
//! gets its own entry, path constraint and isolated execution context, and the
//! family gets an unversioned fallback that turns "right path, wrong version"
//! into a deterministic 400 instead of a 404.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use vroute_rs::prelude::*;
//!
//! let orders = |version| {
//!     Model::builder("orders")
//!         .version(version)
//!         .entity_set(EntitySet::new("Orders").property("Total"))
//!         .build()
//! };
//!
//! let mut table = RouteTable::new();
//! table.register_versioned_routes(
//!     "orders",
//!     "api/v{apiVersion}",
//!     [orders(ApiVersion::new(1, 0))?, orders(ApiVersion::new(2, 0))?],
//! )?;
//!
//! let resolver = Resolver::new(Arc::new(table), VersioningOptions::default());
//!
//! match resolver.resolve(&RouteRequest::new("/api/v2.0/Orders(7)/Total"))? {
//!     Resolution::Dispatch(hit) => assert_eq!(hit.route_name(), "orders-2.0"),
//!     other => panic!("unexpected {:?}", other),
//! }
//!
//! let Resolution::Rejected(rejection) = resolver.resolve(&RouteRequest::new("/api/v3.0/Orders"))? else {
//!     panic!("expected a rejection");
//! };
//! let error = rejection.to_api_error("/api/v3.0/Orders", resolver.options());
//! assert_eq!(error.code, "UnsupportedApiVersion");
//! assert_eq!(error.supported_versions_header().as_deref(), Some("1.0, 2.0"));
//! # Ok::<(), RouteError>(())
//! ```
//!
//! ## Optional Features
//!
//! - `tracing` - routing events through `tracing` (default)
//! - `config` - `VROUTE_*` environment configuration with `.env` file support
//! - `logging` - tracing subscriber initialisation
//! - `full` - All optional features enabled
//!
//! ```toml
//! [dependencies]
//! vroute-rs = { version = "0.1", features = ["config", "logging"] }
//! ```

// Re-export core functionality
pub use vroute_core::*;

// Re-export extras (feature-gated)
#[cfg(feature = "config")]
pub use vroute_extras::config;
#[cfg(feature = "config")]
pub use vroute_extras::{
    load_dotenv, load_dotenv_from, versioning_options_from_env, Config, ConfigError,
};

#[cfg(feature = "logging")]
pub use vroute_extras::logging;
#[cfg(feature = "logging")]
pub use vroute_extras::{init_logging, LogConfig, LogFormat, LoggingError};

#[cfg(any(feature = "config", feature = "logging"))]
pub use vroute_extras::Environment;

/// Prelude module - import everything you need with `use vroute_rs::prelude::*`
pub mod prelude {
    // Core types
    pub use vroute_core::{
        // Error handling
        ApiError,
        // Versions
        ApiVersion,
        BatchHandler,
        ContextBuilder,
        ContextFactory,
        EntitySet,
        // Execution contexts
        ExecutionContext,
        // Models
        Model,
        PathKind,
        RejectionReason,
        RequestedVersion,
        // Resolution
        Resolution,
        Resolver,
        Result,
        RouteError,
        RouteName,
        RouteRequest,
        // Route table
        RouteTable,
        VersionedRouteFamily,
        VersioningOptions,
    };

    // Re-export commonly used external types
    pub use serde::{Deserialize, Serialize};
    pub use tracing::{debug, error, info, trace, warn};

    // Configuration types (feature-gated)
    #[cfg(feature = "config")]
    pub use vroute_extras::{load_dotenv, versioning_options_from_env, Config, ConfigError, Environment};

    // Logging types (feature-gated)
    #[cfg(feature = "logging")]
    pub use vroute_extras::{init_logging, LogConfig, LogFormat};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn prelude_imports_work() {
        let _: fn() -> Result<()> = || Ok(());
        let _ = VersioningOptions::default();
    }
}
