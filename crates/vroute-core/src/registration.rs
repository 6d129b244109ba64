//! Versioned route families
//!
//! A route family is every versioned entry registered under one route name and
//! prefix, followed by one unversioned fallback entry. Registration is staged:
//! templates are parsed, models compiled and contexts built before anything is
//! written to the table, and the entries are then committed atomically. Any
//! failure leaves the table exactly as it was.
//!
//! # Example
//!
//! ```
//! use vroute_core::{ApiVersion, EntitySet, Model, RouteTable, VersionedRouteFamily};
//!
//! let model = |v| {
//!     Model::builder("orders")
//!         .version(v)
//!         .entity_set(EntitySet::new("Orders"))
//!         .build()
//!         .unwrap()
//! };
//!
//! let mut table = RouteTable::new();
//! let routes = VersionedRouteFamily::new("orders", "api/v{apiVersion}")
//!     .models([model(ApiVersion::new(1, 0)), model(ApiVersion::new(2, 0))])
//!     .register(&mut table)
//!     .unwrap();
//!
//! let names: Vec<_> = routes.iter().map(|r| r.name.as_str()).collect();
//! assert_eq!(names, ["orders-1.0", "orders-2.0", "orders-Unversioned"]);
//! ```

use crate::batch::{BatchHandler, BatchHandlerService};
use crate::constraint::{compile_path_constraint, ExactVersionConstraint, PathConstraint, UnionPathConstraint};
use crate::context::{ContextBuilder, ContextFactory, DefaultContextFactory, ExecutionContext, RouteName};
use crate::error::{Result, RouteError};
use crate::model::Model;
use crate::table::{EntryRole, RegisteredRoute, RouteEntry, RouteTable};
use crate::template::RouteTemplate;
use crate::version::ApiVersion;
use std::sync::Arc;

/// Suffix of the fallback entry's name
pub const UNVERSIONED_SUFFIX: &str = "Unversioned";

/// Suffix of the batch endpoint's name
pub const BATCH_SUFFIX: &str = "Batch";

type ConfigureFn = dyn Fn(&mut ContextBuilder, &ApiVersion) + Send + Sync;

/// Builder for one route family
pub struct VersionedRouteFamily {
    route_name: String,
    route_prefix: String,
    models: Vec<Model>,
    version: Option<ApiVersion>,
    configure: Option<Box<ConfigureFn>>,
    context_factory: Box<dyn ContextFactory>,
    batch_handler: Option<Arc<dyn BatchHandler>>,
}

impl VersionedRouteFamily {
    pub fn new(route_name: impl Into<String>, route_prefix: impl Into<String>) -> Self {
        Self {
            route_name: route_name.into(),
            route_prefix: route_prefix.into(),
            models: Vec::new(),
            version: None,
            configure: None,
            context_factory: Box::new(DefaultContextFactory),
            batch_handler: None,
        }
    }

    /// Add a model; its version annotation names the entry
    pub fn model(mut self, model: Model) -> Self {
        self.models.push(model);
        self
    }

    pub fn models(mut self, models: impl IntoIterator<Item = Model>) -> Self {
        self.models.extend(models);
        self
    }

    /// Register the model under an explicit version
    ///
    /// The entry is then named after the route itself and the model's own
    /// annotation is replaced.
    pub fn version(mut self, version: ApiVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Per-version configuration, run after the default services are registered
    pub fn configure<F>(mut self, configure: F) -> Self
    where
        F: Fn(&mut ContextBuilder, &ApiVersion) + Send + Sync + 'static,
    {
        self.configure = Some(Box::new(configure));
        self
    }

    pub fn context_factory(mut self, factory: impl ContextFactory + 'static) -> Self {
        self.context_factory = Box::new(factory);
        self
    }

    /// Also register `"{routeName}Batch"` at `"{routePrefix}/$batch"`
    pub fn batch_handler(mut self, handler: Arc<dyn BatchHandler>) -> Self {
        self.batch_handler = Some(handler);
        self
    }

    /// Stage and commit the family
    ///
    /// Returns the registered entries in table order: the versioned entries in
    /// model order, then the fallback.
    pub fn register(self, table: &mut RouteTable) -> Result<Vec<RegisteredRoute>> {
        let template = RouteTemplate::parse(&self.route_prefix)?;
        if self.models.is_empty() {
            return Err(RouteError::EmptyFamily {
                route_name: self.route_name,
            });
        }

        let mut staged = Vec::with_capacity(self.models.len() + 1);
        let mut constraints: Vec<Arc<dyn PathConstraint>> = Vec::with_capacity(self.models.len());
        let mut versions = Vec::with_capacity(self.models.len());

        for model in &self.models {
            let version = self.version_of(model)?;
            let name = match self.version {
                Some(_) => self.route_name.clone(),
                None => format!("{}-{}", self.route_name, version),
            };

            let constraint: Arc<dyn PathConstraint> = Arc::new(compile_path_constraint(model)?);
            let model = Arc::new(model.clone().with_version(version.clone()));
            let context = self.versioned_context(&name, model, &version)?;

            staged.push(
                RouteEntry::new(name, template.clone(), Arc::clone(&constraint), context)
                    .with_version_constraint(Arc::new(ExactVersionConstraint::new(version.clone()))),
            );
            constraints.push(constraint);
            versions.push(version);
        }

        versions.sort();
        versions.dedup();

        let fallback_name = format!("{}-{}", self.route_name, UNVERSIONED_SUFFIX);
        let mut fallback_context = self.create_context(&fallback_name)?;
        fallback_context.insert(RouteName(fallback_name.clone()));
        staged.push(RouteEntry::fallback(
            fallback_name,
            template.clone(),
            Arc::new(UnionPathConstraint::new(constraints)),
            fallback_context.build(),
            versions.clone(),
        ));

        let batch = match &self.batch_handler {
            Some(handler) => {
                let name = format!("{}{}", self.route_name, BATCH_SUFFIX);
                if table.contains(&name) || staged.iter().any(|entry| entry.name() == name) {
                    return Err(RouteError::DuplicateName { name });
                }
                Some((name, template.join("$batch")?, Arc::clone(handler)))
            }
            None => None,
        };

        let registered = table.register_all(staged)?;
        if let Some((name, batch_template, handler)) = batch {
            table.register_batch_endpoint(name, batch_template, handler)?;
        }

        trace_info!(
            route = %self.route_name,
            prefix = %template,
            versions = %versions.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
            batch = self.batch_handler.is_some(),
            "Versioned route family registered"
        );

        Ok(registered)
    }

    fn version_of(&self, model: &Model) -> Result<ApiVersion> {
        self.version
            .clone()
            .or_else(|| model.api_version().cloned())
            .ok_or_else(|| RouteError::MissingModelVersion {
                route_name: self.route_name.clone(),
                model: model.name().to_string(),
            })
    }

    fn create_context(&self, name: &str) -> Result<ContextBuilder> {
        let mut builder = self
            .context_factory
            .create(name)
            .ok_or_else(|| RouteError::NullContainer {
                route_name: name.to_string(),
            })?;
        builder.set_route_name(name);
        Ok(builder)
    }

    fn versioned_context(&self, name: &str, model: Arc<Model>, version: &ApiVersion) -> Result<ExecutionContext> {
        let mut builder = self.create_context(name)?;
        builder.set_api_version(Some(version.clone()));
        builder.set_model(Arc::clone(&model));

        builder.insert(model);
        builder.insert(version.clone());
        builder.insert(RouteName(name.to_string()));
        if let Some(handler) = &self.batch_handler {
            builder.insert(BatchHandlerService(Arc::clone(handler)));
        }

        if let Some(configure) = &self.configure {
            configure(&mut builder, version);
        }
        Ok(builder.build())
    }
}

impl std::fmt::Debug for VersionedRouteFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedRouteFamily")
            .field("route_name", &self.route_name)
            .field("route_prefix", &self.route_prefix)
            .field("models", &self.models.iter().map(Model::name).collect::<Vec<_>>())
            .field("version", &self.version)
            .field("batch", &self.batch_handler.is_some())
            .finish()
    }
}

impl RouteTable {
    /// Register one versioned entry per model, named `"{routeName}-{apiVersion}"`,
    /// followed by `"{routeName}-Unversioned"`
    pub fn register_versioned_routes(
        &mut self,
        route_name: impl Into<String>,
        route_prefix: impl Into<String>,
        models: impl IntoIterator<Item = Model>,
    ) -> Result<Vec<RegisteredRoute>> {
        VersionedRouteFamily::new(route_name, route_prefix)
            .models(models)
            .register(self)
    }

    /// Register `model` as `routeName` under `version`, plus its fallback
    ///
    /// Returns the versioned entry.
    pub fn register_versioned_route(
        &mut self,
        route_name: impl Into<String>,
        route_prefix: impl Into<String>,
        model: Model,
        version: ApiVersion,
    ) -> Result<RegisteredRoute> {
        let route_name = route_name.into();
        let routes = VersionedRouteFamily::new(route_name.clone(), route_prefix)
            .model(model)
            .version(version)
            .register(self)?;
        routes
            .into_iter()
            .find(|route| route.role == EntryRole::Versioned)
            .ok_or(RouteError::EmptyFamily { route_name })
    }
}
