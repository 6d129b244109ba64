//! `$batch` endpoints
//!
//! When a route family is registered with a batch handler, one batch endpoint
//! named `"{routeName}Batch"` is registered at `"{routePrefix}/$batch"`. Batch
//! endpoints sit beside the versioned entries and are matched independently of
//! version resolution; processing the batch is the host's business.

use crate::template::{RouteTemplate, RouteValues};
use std::fmt;
use std::sync::Arc;

/// Host-supplied handler for `$batch` requests
pub trait BatchHandler: Send + Sync + fmt::Debug {
    /// Name used in logs and diagnostics
    fn name(&self) -> &str;
}

/// A batch handler registered as a context service
#[derive(Debug, Clone)]
pub struct BatchHandlerService(pub Arc<dyn BatchHandler>);

/// A registered `$batch` endpoint
#[derive(Debug, Clone)]
pub struct BatchEndpoint {
    name: String,
    template: RouteTemplate,
    handler: Arc<dyn BatchHandler>,
}

impl BatchEndpoint {
    pub fn new(name: impl Into<String>, template: RouteTemplate, handler: Arc<dyn BatchHandler>) -> Self {
        Self {
            name: name.into(),
            template,
            handler,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &RouteTemplate {
        &self.template
    }

    pub fn handler(&self) -> &Arc<dyn BatchHandler> {
        &self.handler
    }

    /// Match a full request path; the template must consume it entirely
    pub fn match_path(&self, path: &str) -> Option<RouteValues> {
        self.template
            .match_path(path)
            .filter(|m| m.remainder.is_empty())
            .map(|m| m.values)
    }
}
