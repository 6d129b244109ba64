//! Request-time resolution
//!
//! The [`Resolver`] turns a request into exactly one [`Resolution`]:
//!
//! ```text
//! Start -> structural filter --none--> NotFound
//!                 |
//!                 v
//!          version filter --one--> Dispatch
//!                 |        --many-> RouteError::AmbiguousRoute
//!                 |        --zero-> Rejected (via the family fallback)
//! ```
//!
//! A zero-hit request whose version was accepted by an entry that only
//! partially parsed the path is `NotFound`, unless some version of a family
//! recognizes the whole path. Fallbacks that recognize the path are preferred
//! over fallbacks that only share its root segment.
//!
//! There is no tie-break between versioned entries. Two entries accepting the
//! same request is a configuration defect and is reported on every such
//! request.
//!
//! Resolution only reads the frozen [`RouteTable`], so one resolver can be
//! shared by any number of threads.

use crate::batch::BatchEndpoint;
use crate::constraint::ResourcePath;
use crate::context::ExecutionContext;
use crate::error::{ApiError, Result, RouteError};
use crate::reader::{
    ApiVersionReader, CombinedVersionReader, HeaderVersionReader, QueryStringVersionReader, RequestedVersion,
    RouteRequest, UrlSegmentVersionReader,
};
use crate::table::{Candidate, RouteEntry, RouteTable};
use crate::template::RouteValues;
use crate::version::ApiVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How requested versions are read and how rejections are reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersioningOptions {
    /// Treat a request without a version as a request for `default_version`
    pub assume_default_version_when_unspecified: bool,
    pub default_version: ApiVersion,
    /// Attach the supported versions to rejections
    pub report_api_versions: bool,
    /// Query string parameter carrying the version
    pub query_parameter: Option<String>,
    /// Request header carrying the version
    pub header_name: Option<String>,
    /// Prefix template parameter carrying the version
    pub url_segment_parameter: Option<String>,
}

impl Default for VersioningOptions {
    fn default() -> Self {
        Self {
            assume_default_version_when_unspecified: false,
            default_version: ApiVersion::new(1, 0),
            report_api_versions: true,
            query_parameter: Some("api-version".to_string()),
            header_name: None,
            url_segment_parameter: Some("apiVersion".to_string()),
        }
    }
}

impl VersioningOptions {
    /// Build the combined reader for the configured version sources
    pub fn reader(&self) -> CombinedVersionReader {
        let mut reader = CombinedVersionReader::new();
        if let Some(parameter) = &self.query_parameter {
            reader = reader.with(QueryStringVersionReader::new(parameter.clone()));
        }
        if let Some(header) = &self.header_name {
            reader = reader.with(HeaderVersionReader::new(header.clone()));
        }
        if let Some(parameter) = &self.url_segment_parameter {
            reader = reader.with(UrlSegmentVersionReader::new(parameter.clone()));
        }
        reader
    }
}

/// A dispatchable match
#[derive(Debug, Clone)]
pub struct MatchResult<'t> {
    pub entry: &'t RouteEntry,
    /// The version the entry is bound to, `None` for version-agnostic entries
    pub bound_version: Option<ApiVersion>,
    pub route_values: RouteValues,
    pub resource: ResourcePath,
}

impl<'t> MatchResult<'t> {
    pub fn route_name(&self) -> &'t str {
        self.entry.name()
    }

    /// The execution context to dispatch with
    pub fn context(&self) -> &'t ExecutionContext {
        self.entry.context()
    }
}

/// Why the fallback rejected a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// No version was supplied
    Unspecified,
    /// A well-formed version no entry serves
    Unsupported(ApiVersion),
    /// A value that is not a version
    Invalid(String),
    /// Several distinct values
    Ambiguous(Vec<String>),
}

impl RejectionReason {
    fn from_requested(requested: RequestedVersion, options: &VersioningOptions) -> Self {
        match requested {
            RequestedVersion::Unspecified if options.assume_default_version_when_unspecified => {
                RejectionReason::Unsupported(options.default_version.clone())
            }
            RequestedVersion::Unspecified => RejectionReason::Unspecified,
            RequestedVersion::Specified(version) => RejectionReason::Unsupported(version),
            RequestedVersion::Invalid(raw) => RejectionReason::Invalid(raw),
            RequestedVersion::Ambiguous(raws) => RejectionReason::Ambiguous(raws),
        }
    }

    /// Error code reported to the client
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::Unspecified => "ApiVersionUnspecified",
            RejectionReason::Unsupported(_) => "UnsupportedApiVersion",
            RejectionReason::Invalid(_) => "InvalidApiVersion",
            RejectionReason::Ambiguous(_) => "AmbiguousApiVersion",
        }
    }
}

/// A request the family fallback caught
#[derive(Debug, Clone)]
pub struct VersionRejection<'t> {
    pub fallback: &'t RouteEntry,
    pub reason: RejectionReason,
}

impl VersionRejection<'_> {
    /// Versions served by the rejecting family, ascending
    pub fn supported(&self) -> &[ApiVersion] {
        self.fallback.supported_versions()
    }

    /// The 400 response for this rejection
    pub fn to_api_error(&self, request_uri: &str, options: &VersioningOptions) -> ApiError {
        let message = match &self.reason {
            RejectionReason::Unspecified => "An API version is required, but was not specified.".to_string(),
            RejectionReason::Unsupported(version) => unsupported_message(request_uri, version),
            RejectionReason::Invalid(raw) => unsupported_message(request_uri, raw),
            RejectionReason::Ambiguous(raws) => format!(
                "The following API versions were requested: {}. At most, only a single API version may be \
                 specified. Please update the intended API version and retry the request.",
                raws.join(", ")
            ),
        };

        let error = ApiError::bad_request(self.reason.code(), message);
        if options.report_api_versions {
            error.with_supported_versions(self.supported().iter().cloned())
        } else {
            error
        }
    }
}

fn unsupported_message(request_uri: &str, version: impl fmt::Display) -> String {
    format!(
        "The HTTP resource that matches the request URI '{}' does not support the API version '{}'.",
        request_uri, version
    )
}

/// Outcome of resolving one request
#[derive(Debug, Clone)]
pub enum Resolution<'t> {
    /// Exactly one entry accepts the request
    Dispatch(MatchResult<'t>),
    /// The path belongs to a family but no entry accepts the version
    Rejected(VersionRejection<'t>),
    /// Nothing recognizes the path; defer to the host's 404
    NotFound,
}

impl<'t> Resolution<'t> {
    pub fn is_dispatch(&self) -> bool {
        matches!(self, Resolution::Dispatch(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Resolution::NotFound)
    }

    /// Name of the dispatched or rejecting entry
    pub fn route_name(&self) -> Option<&'t str> {
        match self {
            Resolution::Dispatch(hit) => Some(hit.entry.name()),
            Resolution::Rejected(rejection) => Some(rejection.fallback.name()),
            Resolution::NotFound => None,
        }
    }
}

/// Resolves requests against a frozen route table
pub struct Resolver {
    table: Arc<RouteTable>,
    options: VersioningOptions,
    reader: Box<dyn ApiVersionReader>,
}

impl Resolver {
    /// Create a resolver reading versions from the sources in `options`
    pub fn new(table: Arc<RouteTable>, options: VersioningOptions) -> Self {
        let reader = Box::new(options.reader());
        Self { table, options, reader }
    }

    /// Replace the version reader built from the options
    pub fn with_reader(mut self, reader: impl ApiVersionReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn options(&self) -> &VersioningOptions {
        &self.options
    }

    /// Resolve a request
    ///
    /// Fails only with [`RouteError::AmbiguousRoute`], naming the colliding
    /// entries in registration order.
    pub fn resolve<'t>(&'t self, request: &RouteRequest<'_>) -> Result<Resolution<'t>> {
        let path = request.path();
        let mut hits: Vec<(Candidate<'t>, ResourcePath)> = Vec::new();
        let mut fallback: Option<Candidate<'t>> = None;
        let mut accepted_partial = false;

        // candidates borrow the table only, never the request
        let candidates = self.table.entries().filter_map(|entry| entry.evaluate(path));
        for candidate in candidates {
            if candidate.entry.is_fallback() {
                // first recognizing fallback wins, a partial one only holds the slot
                let replace = match &fallback {
                    None => true,
                    Some(held) => held.path_match.resource().is_none() && candidate.path_match.resource().is_some(),
                };
                if replace {
                    fallback = Some(candidate);
                }
                continue;
            }

            let requested = self.read(request, &candidate.values);
            let accepted = self.accepts(candidate.entry, &requested);
            trace_trace!(
                route = candidate.entry.name(),
                requested = %requested,
                accepted,
                "Candidate evaluated"
            );
            if !accepted {
                continue;
            }
            match candidate.path_match.resource().cloned() {
                Some(resource) => hits.push((candidate, resource)),
                None => accepted_partial = true,
            }
        }

        if hits.len() > 1 {
            let names: Vec<String> = hits.iter().map(|(c, _)| c.entry.name().to_string()).collect();
            trace_warn!(path = %path, routes = ?names, "Request matched multiple versioned routes");
            return Err(RouteError::AmbiguousRoute { names });
        }

        if let Some((candidate, resource)) = hits.pop() {
            trace_debug!(path = %path, route = candidate.entry.name(), "Request dispatched");
            return Ok(Resolution::Dispatch(MatchResult {
                entry: candidate.entry,
                bound_version: candidate.entry.api_version().cloned(),
                route_values: candidate.values,
                resource,
            }));
        }

        // the version was acceptable, but no version of the family knows the resource
        let family_recognizes = fallback.as_ref().is_some_and(|c| c.path_match.resource().is_some());
        if accepted_partial && !family_recognizes {
            trace_debug!(path = %path, "Resource not found for an accepted version");
            return Ok(Resolution::NotFound);
        }

        match fallback {
            Some(candidate) => {
                let requested = self.read(request, &candidate.values);
                let reason = RejectionReason::from_requested(requested, &self.options);
                trace_debug!(
                    path = %path,
                    route = candidate.entry.name(),
                    code = reason.code(),
                    "Request rejected by unversioned fallback"
                );
                Ok(Resolution::Rejected(VersionRejection {
                    fallback: candidate.entry,
                    reason,
                }))
            }
            None => {
                trace_debug!(path = %path, "No route matched");
                Ok(Resolution::NotFound)
            }
        }
    }

    /// Resolve a request and render any rejection as an [`ApiError`]
    ///
    /// `Ok(None)` means not found.
    pub fn dispatch<'t>(&'t self, request: &RouteRequest<'_>) -> std::result::Result<Option<MatchResult<'t>>, ApiError> {
        match self.resolve(request) {
            Ok(Resolution::Dispatch(hit)) => Ok(Some(hit)),
            Ok(Resolution::Rejected(rejection)) => Err(rejection.to_api_error(&request_uri(request), &self.options)),
            Ok(Resolution::NotFound) => Ok(None),
            Err(err) => Err(ApiError::from(&err)),
        }
    }

    /// The batch endpoint consuming the request path, if any
    pub fn match_batch(&self, request: &RouteRequest<'_>) -> Option<(&BatchEndpoint, RouteValues)> {
        self.table.match_batch(request.path())
    }

    fn read(&self, request: &RouteRequest<'_>, values: &RouteValues) -> RequestedVersion {
        RequestedVersion::from_raw(self.reader.read(request, values))
    }

    fn accepts(&self, entry: &RouteEntry, requested: &RequestedVersion) -> bool {
        match requested {
            RequestedVersion::Specified(version) => entry.accepts(Some(version)),
            RequestedVersion::Unspecified => {
                entry.accepts(None)
                    || (self.options.assume_default_version_when_unspecified
                        && entry.accepts(Some(&self.options.default_version)))
            }
            RequestedVersion::Invalid(_) | RequestedVersion::Ambiguous(_) => false,
        }
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("routes", &self.table.len())
            .field("options", &self.options)
            .finish()
    }
}

fn request_uri(request: &RouteRequest<'_>) -> String {
    match request.query() {
        Some(query) => format!("{}?{}", request.path(), query),
        None => request.path().to_string(),
    }
}
