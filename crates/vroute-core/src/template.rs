//! Route prefix templates
//!
//! A route family is registered under a prefix such as `api/v{apiVersion}`.
//! The prefix is compiled once into a [`RouteTemplate`]; at request time the
//! template consumes the leading segments of the path and hands the rest (the
//! resource path) to the family's path constraint.
//!
//! # Segment syntax
//!
//! - `api` - literal, compared ASCII case-insensitively
//! - `{tenant}` - a whole-segment parameter
//! - `v{apiVersion}` - a parameter with a literal prefix and/or suffix
//!
//! At most one parameter is allowed per segment and parameter names must be
//! unique within the template.

use std::collections::HashMap;
use thiserror::Error;

/// Error returned for a malformed route prefix
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// Nested braces are not allowed
    #[error("nested braces are not allowed in route prefix at position {position}: \"{prefix}\"")]
    NestedBraces { prefix: String, position: usize },
    /// Unmatched closing brace
    #[error("unmatched closing brace '}}' at position {position} in route prefix: \"{prefix}\"")]
    UnmatchedClosingBrace { prefix: String, position: usize },
    /// Unclosed brace
    #[error("unclosed brace '{{' in route prefix (missing closing '}}'): \"{prefix}\"")]
    UnclosedBrace { prefix: String },
    /// Empty parameter name
    #[error("empty parameter name '{{}}' at position {position} in route prefix: \"{prefix}\"")]
    EmptyParameterName { prefix: String, position: usize },
    /// Parameter name contains characters other than alphanumerics and underscores
    #[error("invalid parameter name '{{{name}}}' in route prefix: \"{prefix}\"")]
    InvalidParameterName { prefix: String, name: String },
    /// Parameter name starts with a digit
    #[error("parameter name '{{{name}}}' cannot start with a digit in route prefix: \"{prefix}\"")]
    ParameterStartsWithDigit { prefix: String, name: String },
    /// Invalid character outside a parameter
    #[error("invalid character '{character}' at position {position} in route prefix: \"{prefix}\"")]
    InvalidCharacter {
        prefix: String,
        character: char,
        position: usize,
    },
    /// More than one parameter in the same segment
    #[error("segment \"{segment}\" declares more than one parameter in route prefix: \"{prefix}\"")]
    MultipleParameters { prefix: String, segment: String },
    /// Same parameter name used twice
    #[error("parameter '{{{name}}}' is declared more than once in route prefix: \"{prefix}\"")]
    DuplicateParameter { prefix: String, name: String },
}

/// Values captured from template parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteValues {
    values: HashMap<String, String>,
}

impl RouteValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a captured value by parameter name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Result of matching a path against a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMatch<'p> {
    /// Captured parameter values
    pub values: RouteValues,
    /// Unconsumed part of the path, without a leading slash
    pub remainder: &'p str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param {
        prefix: String,
        name: String,
        suffix: String,
    },
}

impl Segment {
    fn capture<'s>(&self, segment: &'s str) -> Option<Option<(&str, &'s str)>> {
        match self {
            Segment::Literal(text) => segment.eq_ignore_ascii_case(text).then_some(None),
            Segment::Param {
                prefix,
                name,
                suffix,
            } => {
                if segment.len() <= prefix.len() + suffix.len() {
                    return None;
                }
                let head = segment.get(..prefix.len())?;
                let tail = segment.get(segment.len() - suffix.len()..)?;
                if !head.eq_ignore_ascii_case(prefix) || !tail.eq_ignore_ascii_case(suffix) {
                    return None;
                }
                let value = segment.get(prefix.len()..segment.len() - suffix.len())?;
                Some(Some((name.as_str(), value)))
            }
        }
    }
}

/// A compiled route prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl RouteTemplate {
    /// Parse and validate a route prefix
    ///
    /// Leading, trailing and repeated slashes are ignored, so `"/api/"` and
    /// `"api"` compile to the same template. An empty prefix matches every path
    /// and passes the whole path through as the remainder.
    ///
    /// # Examples
    ///
    /// ```
    /// use vroute_core::RouteTemplate;
    ///
    /// let template = RouteTemplate::parse("api/v{apiVersion}").unwrap();
    /// let matched = template.match_path("/api/v2.0/Orders(1)").unwrap();
    /// assert_eq!(matched.values.get("apiVersion"), Some("2.0"));
    /// assert_eq!(matched.remainder, "Orders(1)");
    ///
    /// assert!(RouteTemplate::parse("api/{").is_err());
    /// ```
    pub fn parse(prefix: &str) -> Result<Self, TemplateError> {
        let source = normalize_prefix(prefix);
        let mut segments = Vec::new();
        let mut seen: Vec<String> = Vec::new();

        // positions in errors refer to the normalized prefix
        let mut offset = 0;
        for raw in source.split('/').filter(|s| !s.is_empty()) {
            let segment = parse_segment(&source, raw, offset)?;
            if let Segment::Param { name, .. } = &segment {
                if seen.contains(name) {
                    return Err(TemplateError::DuplicateParameter {
                        prefix: source.clone(),
                        name: name.clone(),
                    });
                }
                seen.push(name.clone());
            }
            segments.push(segment);
            offset += raw.len() + 1;
        }

        Ok(Self { source, segments })
    }

    /// The normalized prefix text, without leading or trailing slashes
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of the parameters declared by this template, in order
    pub fn parameters(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Whether the template declares the given parameter
    pub fn has_parameter(&self, name: &str) -> bool {
        self.parameters().any(|p| p == name)
    }

    /// Match the leading segments of `path`
    ///
    /// Returns `None` when the path is shorter than the template or a segment
    /// does not match. A query string must be stripped by the caller.
    pub fn match_path<'p>(&self, path: &'p str) -> Option<TemplateMatch<'p>> {
        let mut rest = path.trim_start_matches('/');
        let mut values = RouteValues::new();

        for segment in &self.segments {
            if rest.is_empty() {
                return None;
            }
            let (head, tail) = match rest.split_once('/') {
                Some((head, tail)) => (head, tail),
                None => (rest, ""),
            };
            if let Some(captured) = segment.capture(head)? {
                values.insert(captured.0, captured.1);
            }
            rest = tail.trim_start_matches('/');
        }

        Some(TemplateMatch {
            values,
            remainder: rest,
        })
    }

    /// Append a literal path (such as `$batch`) to this template
    pub fn join(&self, literal: &str) -> Result<Self, TemplateError> {
        if self.source.is_empty() {
            Self::parse(literal)
        } else {
            Self::parse(&format!("{}/{}", self.source, literal))
        }
    }
}

impl std::fmt::Display for RouteTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segment(prefix: &str, raw: &str, offset: usize) -> Result<Segment, TemplateError> {
    let mut depth = 0;
    let mut param: Option<(usize, usize)> = None;
    let mut open = 0;

    for (i, ch) in raw.char_indices() {
        match ch {
            '{' => {
                if depth > 0 {
                    return Err(TemplateError::NestedBraces {
                        prefix: prefix.to_string(),
                        position: offset + i,
                    });
                }
                depth += 1;
                open = i;
            }
            '}' => {
                if depth == 0 {
                    return Err(TemplateError::UnmatchedClosingBrace {
                        prefix: prefix.to_string(),
                        position: offset + i,
                    });
                }
                depth -= 1;
                if param.is_some() {
                    return Err(TemplateError::MultipleParameters {
                        prefix: prefix.to_string(),
                        segment: raw.to_string(),
                    });
                }
                param = Some((open, i));
            }
            _ if depth == 0 => {
                if !ch.is_alphanumeric() && !"-_.$~".contains(ch) {
                    return Err(TemplateError::InvalidCharacter {
                        prefix: prefix.to_string(),
                        character: ch,
                        position: offset + i,
                    });
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        return Err(TemplateError::UnclosedBrace {
            prefix: prefix.to_string(),
        });
    }

    let Some((start, end)) = param else {
        return Ok(Segment::Literal(raw.to_string()));
    };

    let name = &raw[start + 1..end];
    if name.is_empty() {
        return Err(TemplateError::EmptyParameterName {
            prefix: prefix.to_string(),
            position: offset + start,
        });
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(TemplateError::InvalidParameterName {
            prefix: prefix.to_string(),
            name: name.to_string(),
        });
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(TemplateError::ParameterStartsWithDigit {
            prefix: prefix.to_string(),
            name: name.to_string(),
        });
    }

    Ok(Segment::Param {
        prefix: raw[..start].to_string(),
        name: name.to_string(),
        suffix: raw[end + 1..].to_string(),
    })
}

/// Collapse leading, trailing and repeated slashes
///
/// ```ignore
/// assert_eq!(normalize_prefix("/api//v1/"), "api/v1");
/// assert_eq!(normalize_prefix("///"), "");
/// ```
pub(crate) fn normalize_prefix(prefix: &str) -> String {
    prefix
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
