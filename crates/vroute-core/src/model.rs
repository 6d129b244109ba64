//! Service models
//!
//! A [`Model`] describes the resources one API version exposes: entity sets,
//! singletons and operation imports. Each model may carry the [`ApiVersion`]
//! it belongs to; versioned route registration reads that annotation to name
//! and constrain the route it creates.
//!
//! # Example
//!
//! ```
//! use vroute_core::{ApiVersion, EntitySet, Model};
//!
//! let model = Model::builder("sales")
//!     .version(ApiVersion::new(1, 0))
//!     .entity_set(EntitySet::new("Orders").property("Total").navigation("Lines"))
//!     .singleton_with_properties("Me", ["Name"])
//!     .operation("TopSellers")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(model.api_version(), Some(&ApiVersion::new(1, 0)));
//! assert!(model.has_root("Orders"));
//! ```

use crate::error::RouteError;
use crate::version::ApiVersion;

/// A collection of addressable entities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySet {
    name: String,
    properties: Vec<String>,
    navigations: Vec<String>,
}

impl EntitySet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
            navigations: Vec::new(),
        }
    }

    /// Add a structural property addressable as `Set(key)/Property`
    pub fn property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(name.into());
        self
    }

    /// Add a navigation property addressable as `Set(key)/Navigation`
    pub fn navigation(mut self, name: impl Into<String>) -> Self {
        self.navigations.push(name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }
}

/// A single named entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Singleton {
    name: String,
    properties: Vec<String>,
}

impl Singleton {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }
}

/// The resource model of one API version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    name: String,
    api_version: Option<ApiVersion>,
    entity_sets: Vec<EntitySet>,
    singletons: Vec<Singleton>,
    operations: Vec<String>,
}

impl Model {
    /// Start building a model
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            model: Model {
                name: name.into(),
                api_version: None,
                entity_sets: Vec::new(),
                singletons: Vec::new(),
                operations: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The API version annotation, if any
    pub fn api_version(&self) -> Option<&ApiVersion> {
        self.api_version.as_ref()
    }

    pub fn entity_sets(&self) -> &[EntitySet] {
        &self.entity_sets
    }

    pub fn singletons(&self) -> &[Singleton] {
        &self.singletons
    }

    pub fn operations(&self) -> &[String] {
        &self.operations
    }

    /// Whether `name` is an entity set, singleton or operation import
    pub fn has_root(&self, name: &str) -> bool {
        self.root_names().any(|root| root == name)
    }

    pub(crate) fn root_names(&self) -> impl Iterator<Item = &str> {
        self.entity_sets
            .iter()
            .map(|s| s.name.as_str())
            .chain(self.singletons.iter().map(|s| s.name.as_str()))
            .chain(self.operations.iter().map(String::as_str))
    }

    /// Return a copy of this model annotated with `version`
    pub fn with_version(mut self, version: ApiVersion) -> Self {
        self.api_version = Some(version);
        self
    }
}

/// Builder for [`Model`]
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    /// Annotate the model with the API version it serves
    pub fn version(mut self, version: ApiVersion) -> Self {
        self.model.api_version = Some(version);
        self
    }

    pub fn entity_set(mut self, set: EntitySet) -> Self {
        self.model.entity_sets.push(set);
        self
    }

    pub fn singleton(self, name: impl Into<String>) -> Self {
        self.singleton_with_properties(name, std::iter::empty::<String>())
    }

    pub fn singleton_with_properties<I, S>(mut self, name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.model.singletons.push(Singleton {
            name: name.into(),
            properties: properties.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Add an unbound function or action import
    pub fn operation(mut self, name: impl Into<String>) -> Self {
        self.model.operations.push(name.into());
        self
    }

    /// Validate identifiers and root-name uniqueness
    pub fn build(self) -> Result<Model, RouteError> {
        let model = self.model;
        let invalid = |reason: String| RouteError::InvalidModel {
            model: model.name.clone(),
            reason,
        };

        let mut roots: Vec<&str> = Vec::new();
        for root in model.root_names() {
            if !is_identifier(root) {
                return Err(invalid(format!("\"{}\" is not a valid identifier", root)));
            }
            if roots.contains(&root) {
                return Err(invalid(format!("\"{}\" is declared more than once", root)));
            }
            roots.push(root);
        }

        let members = model
            .entity_sets
            .iter()
            .flat_map(|s| s.properties.iter().chain(&s.navigations))
            .chain(model.singletons.iter().flat_map(|s| &s.properties));
        for member in members {
            if !is_identifier(member) {
                return Err(invalid(format!("\"{}\" is not a valid identifier", member)));
            }
        }

        for set in &model.entity_sets {
            let mut seen: Vec<&str> = Vec::new();
            for member in set.properties.iter().chain(&set.navigations) {
                if seen.contains(&member.as_str()) {
                    return Err(invalid(format!(
                        "\"{}\" is declared more than once on \"{}\"",
                        member, set.name
                    )));
                }
                seen.push(member);
            }
        }

        Ok(model)
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
