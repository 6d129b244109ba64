//! # vroute Core
//!
//! API-version-aware route resolution. Route families are registered once at
//! startup: one entry per (route name, API version) pair, each with its own
//! compiled path constraint and isolated execution context, plus one
//! unversioned fallback entry per family. At request time the [`Resolver`]
//! picks exactly one outcome: dispatch, a deterministic version rejection,
//! not found, or an ambiguous-route error.
//!
//! This crate is not meant to be used directly. Use `vroute-rs` instead.

#[macro_use]
mod tracing_macros;

pub mod batch;
pub mod constraint;
pub mod context;
mod error;
pub mod model;
pub mod reader;
mod registration;
mod resolver;
mod table;
pub mod template;
mod version;

// Public API
pub use batch::{BatchEndpoint, BatchHandler, BatchHandlerService};
pub use constraint::{
    compile_path_constraint, ExactVersionConstraint, ModelPathConstraint, PathConstraint, PathKind, PathMatch,
    ResourcePath, UnionPathConstraint, VersionConstraint,
};
pub use context::{ContextBuilder, ContextFactory, DefaultContextFactory, ExecutionContext, RouteName};
pub use error::{ApiError, Result, RouteError};
pub use model::{EntitySet, Model, ModelBuilder, Singleton};
pub use reader::{
    ApiVersionReader, CombinedVersionReader, HeaderVersionReader, QueryStringVersionReader, RequestedVersion,
    RouteRequest, UrlSegmentVersionReader,
};
pub use registration::{VersionedRouteFamily, BATCH_SUFFIX, UNVERSIONED_SUFFIX};
pub use resolver::{MatchResult, RejectionReason, Resolution, Resolver, VersionRejection, VersioningOptions};
pub use table::{Candidate, EntryRole, RegisteredRoute, RouteEntry, RouteTable};
pub use template::{RouteTemplate, RouteValues, TemplateError, TemplateMatch};
pub use version::{ApiVersion, VersionParseError};
