//! Route table
//!
//! The [`RouteTable`] holds every registered [`RouteEntry`] in insertion order
//! together with the batch endpoints. It is append-only while the application
//! starts and read-only afterwards: wrap it in an `Arc` and hand it to a
//! [`Resolver`](crate::Resolver).
//!
//! The table also owns the per-route context registry. A host that needs the
//! execution context of a named route looks it up with [`RouteTable::context`]
//! instead of consulting process-wide state.

use crate::batch::{BatchEndpoint, BatchHandler};
use crate::constraint::{PathConstraint, PathMatch, VersionConstraint};
use crate::context::ExecutionContext;
use crate::error::{Result, RouteError};
use crate::template::{RouteTemplate, RouteValues};
use crate::version::ApiVersion;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// The part an entry plays during resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryRole {
    /// Bound to one API version
    Versioned,
    /// No version constraint; accepts only requests without a version
    VersionAgnostic,
    /// Catches structurally matching requests no versioned entry accepts
    UnversionedFallback,
}

/// One registered route
pub struct RouteEntry {
    name: String,
    template: RouteTemplate,
    path_constraint: Arc<dyn PathConstraint>,
    version_constraint: Option<Arc<dyn VersionConstraint>>,
    context: ExecutionContext,
    role: EntryRole,
    supported_versions: Vec<ApiVersion>,
}

impl RouteEntry {
    /// Create a version-agnostic entry
    pub fn new(
        name: impl Into<String>,
        template: RouteTemplate,
        path_constraint: Arc<dyn PathConstraint>,
        context: ExecutionContext,
    ) -> Self {
        Self {
            name: name.into(),
            template,
            path_constraint,
            version_constraint: None,
            context,
            role: EntryRole::VersionAgnostic,
            supported_versions: Vec::new(),
        }
    }

    /// Bind a version constraint, making this a versioned entry
    pub fn with_version_constraint(mut self, constraint: Arc<dyn VersionConstraint>) -> Self {
        self.supported_versions = constraint.version().cloned().into_iter().collect();
        self.version_constraint = Some(constraint);
        self.role = EntryRole::Versioned;
        self
    }

    /// Create the unversioned fallback of a route family
    pub(crate) fn fallback(
        name: impl Into<String>,
        template: RouteTemplate,
        path_constraint: Arc<dyn PathConstraint>,
        context: ExecutionContext,
        supported_versions: Vec<ApiVersion>,
    ) -> Self {
        Self {
            name: name.into(),
            template,
            path_constraint,
            version_constraint: None,
            context,
            role: EntryRole::UnversionedFallback,
            supported_versions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &RouteTemplate {
        &self.template
    }

    pub fn path_constraint(&self) -> &Arc<dyn PathConstraint> {
        &self.path_constraint
    }

    pub fn version_constraint(&self) -> Option<&Arc<dyn VersionConstraint>> {
        self.version_constraint.as_ref()
    }

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn role(&self) -> EntryRole {
        self.role
    }

    pub fn is_fallback(&self) -> bool {
        self.role == EntryRole::UnversionedFallback
    }

    /// The version bound by the version constraint
    pub fn api_version(&self) -> Option<&ApiVersion> {
        self.version_constraint.as_ref().and_then(|c| c.version())
    }

    /// Versions served by this entry, or by the whole family for a fallback
    pub fn supported_versions(&self) -> &[ApiVersion] {
        &self.supported_versions
    }

    /// Version predicate
    ///
    /// Without a constraint only an unspecified version is accepted.
    pub fn accepts(&self, requested: Option<&ApiVersion>) -> bool {
        match &self.version_constraint {
            Some(constraint) => constraint.accepts(requested),
            None => requested.is_none(),
        }
    }

    /// Structural evaluation: prefix template, then path constraint
    ///
    /// Returns `None` unless the path structurally matches this entry.
    pub fn evaluate(&self, path: &str) -> Option<Candidate<'_>> {
        let matched = self.template.match_path(path)?;
        let path_match = self.path_constraint.evaluate(matched.remainder);
        path_match.is_structural().then(|| Candidate {
            entry: self,
            values: matched.values,
            path_match,
        })
    }

    fn describe(&self) -> RegisteredRoute {
        RegisteredRoute {
            name: self.name.clone(),
            template: self.template.to_string(),
            role: self.role,
            api_version: self.api_version().cloned(),
        }
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("name", &self.name)
            .field("template", &self.template.as_str())
            .field("role", &self.role)
            .field("api_version", &self.api_version())
            .finish()
    }
}

/// An entry whose template and path constraint matched a request path
#[derive(Debug, Clone)]
pub struct Candidate<'t> {
    pub entry: &'t RouteEntry,
    /// Values captured by the prefix template
    pub values: RouteValues,
    /// Recognized or partial, never unrecognized
    pub path_match: PathMatch,
}

/// Description of a registered route returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredRoute {
    pub name: String,
    pub template: String,
    pub role: EntryRole,
    pub api_version: Option<ApiVersion>,
}

/// Ordered collection of route entries
#[derive(Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    index: HashMap<String, usize>,
    batch_endpoints: Vec<BatchEndpoint>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry
    ///
    /// Fails with [`RouteError::DuplicateName`] if the name is taken by an
    /// entry or a batch endpoint; the table is unchanged on failure.
    pub fn register(&mut self, entry: RouteEntry) -> Result<RegisteredRoute> {
        if self.contains(&entry.name) {
            return Err(RouteError::DuplicateName { name: entry.name });
        }
        Ok(self.push(entry))
    }

    /// Append several entries atomically, in order
    ///
    /// Either every entry is registered or none is.
    pub fn register_all(&mut self, entries: Vec<RouteEntry>) -> Result<Vec<RegisteredRoute>> {
        let mut staged: HashSet<&str> = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if self.contains(&entry.name) || !staged.insert(entry.name.as_str()) {
                return Err(RouteError::DuplicateName {
                    name: entry.name.clone(),
                });
            }
        }

        Ok(entries.into_iter().map(|entry| self.push(entry)).collect())
    }

    fn push(&mut self, entry: RouteEntry) -> RegisteredRoute {
        let registered = entry.describe();
        trace_debug!(
            route = %registered.name,
            template = %registered.template,
            role = ?registered.role,
            "Route registered"
        );
        self.index.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
        registered
    }

    /// Register a `$batch` endpoint
    pub fn register_batch_endpoint(
        &mut self,
        name: impl Into<String>,
        template: RouteTemplate,
        handler: Arc<dyn BatchHandler>,
    ) -> Result<()> {
        let name = name.into();
        if self.contains(&name) {
            return Err(RouteError::DuplicateName { name });
        }
        trace_debug!(route = %name, template = %template, handler = handler.name(), "Batch endpoint registered");
        self.batch_endpoints.push(BatchEndpoint::new(name, template, handler));
        Ok(())
    }

    /// Whether a route entry or batch endpoint uses `name`
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name) || self.batch_endpoints.iter().any(|b| b.name() == name)
    }

    /// Entries structurally matching `path`, lazily, in registration order
    ///
    /// Version constraints are not evaluated here.
    pub fn matching_candidates<'a>(&'a self, path: &'a str) -> impl Iterator<Item = Candidate<'a>> + 'a {
        self.entries.iter().filter_map(move |entry| entry.evaluate(path))
    }

    /// The first batch endpoint whose template consumes `path`
    pub fn match_batch(&self, path: &str) -> Option<(&BatchEndpoint, RouteValues)> {
        self.batch_endpoints
            .iter()
            .find_map(|endpoint| endpoint.match_path(path).map(|values| (endpoint, values)))
    }

    pub fn get(&self, name: &str) -> Option<&RouteEntry> {
        self.index.get(name).and_then(|&i| self.entries.get(i))
    }

    /// Execution context of the named route
    pub fn context(&self, name: &str) -> Option<&ExecutionContext> {
        self.get(name).map(RouteEntry::context)
    }

    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    pub fn batch_endpoints(&self) -> &[BatchEndpoint] {
        &self.batch_endpoints
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of the named entry in registration order
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("entries", &self.entries)
            .field("batch_endpoints", &self.batch_endpoints.len())
            .finish()
    }
}
