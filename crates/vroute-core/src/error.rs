//! Error types for vroute
//!
//! [`RouteError`] covers both startup failures (registration) and the one
//! request-time failure, an ambiguous match. [`ApiError`] is the client-facing
//! shape the host turns into an HTTP response.

use crate::template::TemplateError;
use crate::version::ApiVersion;
use http::StatusCode;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Result type alias for vroute operations
pub type Result<T, E = RouteError> = std::result::Result<T, E>;

/// Errors raised while registering or resolving routes
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Two entries (or batch endpoints) share a name
    #[error("a route named \"{name}\" is already registered")]
    DuplicateName { name: String },

    /// More than one versioned entry accepted the same request
    #[error("request matched multiple routes: {}", .names.join(", "))]
    AmbiguousRoute { names: Vec<String> },

    /// The execution context factory produced nothing for a route
    #[error("the context factory returned no container for route \"{route_name}\"")]
    NullContainer { route_name: String },

    /// A model passed to versioned registration has no API version annotation
    #[error("model \"{model}\" registered under route \"{route_name}\" has no API version")]
    MissingModelVersion { route_name: String, model: String },

    /// A route family was registered without any model
    #[error("route family \"{route_name}\" has no models to register")]
    EmptyFamily { route_name: String },

    /// A model could not be compiled into a path constraint
    #[error("invalid model \"{model}\": {reason}")]
    InvalidModel { model: String, reason: String },

    /// The route prefix is malformed
    #[error(transparent)]
    InvalidTemplate(#[from] TemplateError),
}

impl RouteError {
    /// Whether this error can only happen while registering routes
    pub fn is_startup_error(&self) -> bool {
        !matches!(self, RouteError::AmbiguousRoute { .. })
    }
}

/// Client-facing error
///
/// Serialized as `{"error": {"code": ..., "message": ...}}`. When versions are
/// reported, the supported list is exposed through
/// [`ApiError::supported_versions_header`] for the `api-supported-versions`
/// response header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error code identifier
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Versions the matched route family supports (empty when not reported)
    pub supported_versions: Vec<ApiVersion>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            supported_versions: Vec::new(),
        }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// Create a 500 Internal Server Error
    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }

    /// Attach the versions supported by the matched route family
    pub fn with_supported_versions(mut self, versions: impl IntoIterator<Item = ApiVersion>) -> Self {
        self.supported_versions = versions.into_iter().collect();
        self.supported_versions.sort();
        self.supported_versions.dedup();
        self
    }

    /// Value for the `api-supported-versions` header, if any versions are known
    pub fn supported_versions_header(&self) -> Option<String> {
        if self.supported_versions.is_empty() {
            return None;
        }
        Some(
            self.supported_versions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        )
    }

    /// Render the JSON response body
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(ErrorResponse::from(self)).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<&RouteError> for ApiError {
    fn from(err: &RouteError) -> Self {
        match err {
            RouteError::AmbiguousRoute { .. } => ApiError::internal("AmbiguousRoute", err.to_string()),
            _ => ApiError::internal("RouteConfiguration", err.to_string()),
        }
    }
}

/// JSON representation of an API error response
#[derive(Serialize)]
pub(crate) struct ErrorResponse<'a> {
    pub error: ErrorBody<'a>,
}

#[derive(Serialize)]
pub(crate) struct ErrorBody<'a> {
    pub code: &'a str,
    pub message: &'a str,
}

impl<'a> From<&'a ApiError> for ErrorResponse<'a> {
    fn from(err: &'a ApiError) -> Self {
        Self {
            error: ErrorBody {
                code: &err.code,
                message: &err.message,
            },
        }
    }
}
