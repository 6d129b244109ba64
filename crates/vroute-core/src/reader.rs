//! Version extraction strategies
//!
//! Provides the readers that pull a requested API version out of a request.
//! Readers run per candidate because the URL segment reader needs the route
//! values captured by the candidate's prefix.

use crate::template::RouteValues;
use crate::version::ApiVersion;
use http::HeaderMap;
use std::fmt;

/// Borrowed view of an inbound request
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest<'a> {
    path: &'a str,
    query: Option<&'a str>,
    headers: Option<&'a HeaderMap>,
}

impl<'a> RouteRequest<'a> {
    /// Build a request from a path, splitting off any query string
    pub fn new(path: &'a str) -> Self {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };
        Self {
            path,
            query,
            headers: None,
        }
    }

    /// Build a request from `http` request parts
    pub fn from_parts(parts: &'a http::request::Parts) -> Self {
        Self {
            path: parts.uri.path(),
            query: parts.uri.query(),
            headers: Some(&parts.headers),
        }
    }

    /// Build a request from an `http::Request`
    pub fn from_request<B>(request: &'a http::Request<B>) -> Self {
        Self {
            path: request.uri().path(),
            query: request.uri().query(),
            headers: Some(request.headers()),
        }
    }

    pub fn with_query(mut self, query: &'a str) -> Self {
        self.query = Some(query);
        self
    }

    pub fn with_headers(mut self, headers: &'a HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn path(&self) -> &'a str {
        self.path
    }

    pub fn query(&self) -> Option<&'a str> {
        self.query
    }

    /// All values of a header, split on commas
    pub fn header_values(&self, name: &str) -> Vec<&'a str> {
        let Some(headers) = self.headers else {
            return Vec::new();
        };
        headers
            .get_all(name)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .collect()
    }
}

/// Reads raw API version values from a request
pub trait ApiVersionReader: Send + Sync + fmt::Debug {
    /// Return every raw value found, in request order
    fn read(&self, request: &RouteRequest<'_>, values: &RouteValues) -> Vec<String>;
}

/// Reads `?api-version=2.0`
///
/// Parameter names compare ASCII case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStringVersionReader {
    parameter: String,
}

impl QueryStringVersionReader {
    pub fn new(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
        }
    }
}

impl Default for QueryStringVersionReader {
    fn default() -> Self {
        Self::new("api-version")
    }
}

impl ApiVersionReader for QueryStringVersionReader {
    fn read(&self, request: &RouteRequest<'_>, _values: &RouteValues) -> Vec<String> {
        let Some(query) = request.query() else {
            return Vec::new();
        };
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
        pairs
            .into_iter()
            .filter(|(key, value)| key.eq_ignore_ascii_case(&self.parameter) && !value.trim().is_empty())
            .map(|(_, value)| value.trim().to_string())
            .collect()
    }
}

/// Reads a request header such as `x-api-version: 2.0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderVersionReader {
    header: String,
}

impl HeaderVersionReader {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
        }
    }
}

impl ApiVersionReader for HeaderVersionReader {
    fn read(&self, request: &RouteRequest<'_>, _values: &RouteValues) -> Vec<String> {
        request
            .header_values(&self.header)
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

/// Reads the value captured by a prefix template parameter, e.g. `v{apiVersion}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSegmentVersionReader {
    parameter: String,
}

impl UrlSegmentVersionReader {
    pub fn new(parameter: impl Into<String>) -> Self {
        Self {
            parameter: parameter.into(),
        }
    }

    pub fn parameter(&self) -> &str {
        &self.parameter
    }
}

impl Default for UrlSegmentVersionReader {
    fn default() -> Self {
        Self::new("apiVersion")
    }
}

impl ApiVersionReader for UrlSegmentVersionReader {
    fn read(&self, _request: &RouteRequest<'_>, values: &RouteValues) -> Vec<String> {
        values
            .get(&self.parameter)
            .map(|value| vec![value.to_string()])
            .unwrap_or_default()
    }
}

/// Concatenates the values of several readers
#[derive(Debug, Default)]
pub struct CombinedVersionReader {
    readers: Vec<Box<dyn ApiVersionReader>>,
}

impl CombinedVersionReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, reader: impl ApiVersionReader + 'static) -> Self {
        self.readers.push(Box::new(reader));
        self
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

impl ApiVersionReader for CombinedVersionReader {
    fn read(&self, request: &RouteRequest<'_>, values: &RouteValues) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|reader| reader.read(request, values))
            .collect()
    }
}

/// The API version a request asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedVersion {
    /// No reader found a value
    Unspecified,
    /// Exactly one distinct, well-formed version
    Specified(ApiVersion),
    /// Exactly one distinct value, which does not parse
    Invalid(String),
    /// More than one distinct value
    Ambiguous(Vec<String>),
}

impl RequestedVersion {
    /// Reduce raw reader output
    ///
    /// Values naming the same version (`2` and `2.0`) count once.
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distinct: Vec<(String, Result<ApiVersion, ()>)> = Vec::new();
        for value in raw {
            let value = value.as_ref().trim();
            let parsed = value.parse::<ApiVersion>().map_err(|_| ());
            let duplicate = distinct.iter().any(|(seen_raw, seen)| match (seen, &parsed) {
                (Ok(a), Ok(b)) => a == b,
                (Err(()), Err(())) => seen_raw == value,
                _ => false,
            });
            if !duplicate {
                distinct.push((value.to_string(), parsed));
            }
        }

        match distinct.len() {
            0 => RequestedVersion::Unspecified,
            1 => match distinct.remove(0) {
                (_, Ok(version)) => RequestedVersion::Specified(version),
                (raw, Err(())) => RequestedVersion::Invalid(raw),
            },
            _ => RequestedVersion::Ambiguous(distinct.into_iter().map(|(raw, _)| raw).collect()),
        }
    }

    pub fn version(&self) -> Option<&ApiVersion> {
        match self {
            RequestedVersion::Specified(version) => Some(version),
            _ => None,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, RequestedVersion::Unspecified)
    }
}

impl fmt::Display for RequestedVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestedVersion::Unspecified => f.write_str("<unspecified>"),
            RequestedVersion::Specified(version) => write!(f, "{}", version),
            RequestedVersion::Invalid(raw) => f.write_str(raw),
            RequestedVersion::Ambiguous(raws) => f.write_str(&raws.join(", ")),
        }
    }
}
