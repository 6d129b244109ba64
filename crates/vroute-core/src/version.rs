//! API version type and parsing
//!
//! Provides `major[.minor][-status]` API versions such as `2`, `2.0` or
//! `3.1-beta`. A missing minor component is zero, so `2` and `2.0` name the
//! same version. A pre-release status sorts before the release.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a string is not a valid API version
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// The input was empty or whitespace
    #[error("API version must not be empty")]
    Empty,
    /// The major component is missing or not a number
    #[error("invalid major version in \"{0}\"")]
    InvalidMajor(String),
    /// The minor component is present but not a number
    #[error("invalid minor version in \"{0}\"")]
    InvalidMinor(String),
    /// The status suffix is empty or contains invalid characters
    #[error("invalid version status in \"{0}\"; statuses start with a letter and contain only letters and digits")]
    InvalidStatus(String),
}

/// A totally ordered API version
///
/// The status is stored lowercased, so `1.0-Beta` and `1.0-beta` are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiVersion {
    major: u32,
    minor: u32,
    status: Option<String>,
}

impl ApiVersion {
    /// Create a release version
    pub const fn new(major: u32, minor: u32) -> Self {
        Self {
            major,
            minor,
            status: None,
        }
    }

    /// Attach a pre-release status such as `beta`
    pub fn with_status(mut self, status: impl Into<String>) -> Result<Self, VersionParseError> {
        let status = status.into();
        if !is_valid_status(&status) {
            return Err(VersionParseError::InvalidStatus(status));
        }
        self.status = Some(status.to_ascii_lowercase());
        Ok(self)
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Whether this version carries a pre-release status
    pub fn is_prerelease(&self) -> bool {
        self.status.is_some()
    }
}

fn is_valid_status(status: &str) -> bool {
    let mut chars = status.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars.all(|c| c.is_ascii_alphanumeric()),
        _ => false,
    }
}

impl FromStr for ApiVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        if input.is_empty() {
            return Err(VersionParseError::Empty);
        }

        let (number, status) = match input.split_once('-') {
            Some((number, status)) => (number, Some(status)),
            None => (input, None),
        };

        let (major, minor) = match number.split_once('.') {
            Some((major, minor)) => (major, Some(minor)),
            None => (number, None),
        };

        if major.is_empty() || !major.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VersionParseError::InvalidMajor(input.to_string()));
        }
        let major = major
            .parse::<u32>()
            .map_err(|_| VersionParseError::InvalidMajor(input.to_string()))?;

        let minor = match minor {
            Some(minor) if !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()) => minor
                .parse::<u32>()
                .map_err(|_| VersionParseError::InvalidMinor(input.to_string()))?,
            Some(_) => return Err(VersionParseError::InvalidMinor(input.to_string())),
            None => 0,
        };

        let version = ApiVersion::new(major, minor);
        match status {
            Some(status) if is_valid_status(status) => version.with_status(status),
            Some(_) => Err(VersionParseError::InvalidStatus(input.to_string())),
            None => Ok(version),
        }
    }
}

impl Ord for ApiVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then_with(|| match (&self.status, &other.status) {
                (None, None) => Ordering::Equal,
                // release sorts after any pre-release of the same number
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for ApiVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(status) = &self.status {
            write!(f, "-{}", status)?;
        }
        Ok(())
    }
}

impl Serialize for ApiVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
