//! Per-route execution contexts
//!
//! Each (route, API version) pair owns an isolated [`ExecutionContext`]: the
//! model it serves plus a typed set of services the host looked up when
//! dispatching. Contexts are built once at registration and never mutated, so
//! handling a request for one version can never affect another version's
//! services.
//!
//! # Example
//!
//! ```
//! use vroute_core::{ContextBuilder, ContextFactory, DefaultContextFactory};
//!
//! #[derive(Clone)]
//! struct PageSize(usize);
//!
//! let builder = DefaultContextFactory.create("orders").unwrap();
//! let context = builder.service(PageSize(50)).build();
//!
//! assert_eq!(context.get::<PageSize>().map(|p| p.0), Some(50));
//! assert_eq!(context.route_name(), "orders");
//! ```

use crate::model::Model;
use crate::version::ApiVersion;
use http::Extensions;
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// The registered name of the route a context belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteName(pub String);

/// Immutable capability set bound to one route entry
#[derive(Clone)]
pub struct ExecutionContext {
    route_name: String,
    api_version: Option<ApiVersion>,
    model: Option<Arc<Model>>,
    services: Arc<Extensions>,
    service_types: Arc<[TypeId]>,
}

impl ExecutionContext {
    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    /// The API version this context serves, if it is versioned
    pub fn api_version(&self) -> Option<&ApiVersion> {
        self.api_version.as_ref()
    }

    /// The model this context serves
    pub fn model(&self) -> Option<&Arc<Model>> {
        self.model.as_ref()
    }

    /// Look up a service by type
    pub fn get<S: Send + Sync + 'static>(&self) -> Option<&S> {
        self.services.get::<S>()
    }

    /// Check if a service of a given type is registered
    pub fn contains<S: 'static>(&self) -> bool {
        self.service_types.contains(&TypeId::of::<S>())
    }

    /// Number of registered services
    pub fn service_count(&self) -> usize {
        self.service_types.len()
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("route_name", &self.route_name)
            .field("api_version", &self.api_version)
            .field("model", &self.model.as_ref().map(|m| m.name()))
            .field("services", &self.service_types.len())
            .finish()
    }
}

/// Mutable builder for an [`ExecutionContext`]
///
/// Registering a service of a type that is already present replaces it; this
/// is how per-version configuration overrides the defaults.
pub struct ContextBuilder {
    route_name: String,
    api_version: Option<ApiVersion>,
    model: Option<Arc<Model>>,
    services: Extensions,
    service_types: Vec<TypeId>,
}

impl ContextBuilder {
    pub fn new(route_name: impl Into<String>) -> Self {
        Self {
            route_name: route_name.into(),
            api_version: None,
            model: None,
            services: Extensions::new(),
            service_types: Vec::new(),
        }
    }

    /// Register or replace a service
    pub fn service<S: Clone + Send + Sync + 'static>(mut self, service: S) -> Self {
        self.insert(service);
        self
    }

    /// Register or replace a service in place
    pub fn insert<S: Clone + Send + Sync + 'static>(&mut self, service: S) {
        let type_id = TypeId::of::<S>();
        self.services.insert(service);
        if !self.service_types.contains(&type_id) {
            self.service_types.push(type_id);
        }
    }

    /// Check if a service of a given type is registered
    pub fn contains<S: 'static>(&self) -> bool {
        self.service_types.contains(&TypeId::of::<S>())
    }

    pub fn route_name(&self) -> &str {
        &self.route_name
    }

    pub(crate) fn set_route_name(&mut self, route_name: impl Into<String>) {
        self.route_name = route_name.into();
    }

    pub(crate) fn set_api_version(&mut self, version: Option<ApiVersion>) {
        self.api_version = version;
    }

    pub(crate) fn set_model(&mut self, model: Arc<Model>) {
        self.model = Some(model);
    }

    /// Freeze the builder
    pub fn build(self) -> ExecutionContext {
        ExecutionContext {
            route_name: self.route_name,
            api_version: self.api_version,
            model: self.model,
            services: Arc::new(self.services),
            service_types: self.service_types.into(),
        }
    }
}

impl fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBuilder")
            .field("route_name", &self.route_name)
            .field("api_version", &self.api_version)
            .field("services", &self.service_types.len())
            .finish()
    }
}

/// Creates the container for a route entry
///
/// Returning `None` aborts registration of the whole route family with
/// [`RouteError::NullContainer`](crate::RouteError::NullContainer).
pub trait ContextFactory: Send + Sync {
    fn create(&self, route_name: &str) -> Option<ContextBuilder>;
}

impl<F> ContextFactory for F
where
    F: Fn(&str) -> Option<ContextBuilder> + Send + Sync,
{
    fn create(&self, route_name: &str) -> Option<ContextBuilder> {
        self(route_name)
    }
}

/// Factory producing empty builders
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultContextFactory;

impl ContextFactory for DefaultContextFactory {
    fn create(&self, route_name: &str) -> Option<ContextBuilder> {
        Some(ContextBuilder::new(route_name))
    }
}
