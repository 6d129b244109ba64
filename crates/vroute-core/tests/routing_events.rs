//! Routing events reach a tracing subscriber under the `vroute` target

#![cfg(feature = "tracing")]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt;
use vroute_core::{
    ApiVersion, EntitySet, Model, Resolver, RouteError, RouteRequest, RouteTable, VersioningOptions,
};

#[derive(Debug, Clone)]
struct CapturedEvent {
    target: String,
    level: tracing::Level,
    fields: HashMap<String, String>,
}

/// A test layer that records every event
#[derive(Clone, Default)]
struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl EventCapture {
    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn messages(&self, level: tracing::Level) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.target == "vroute" && e.level == level)
            .filter_map(|e| e.fields.get("message").cloned())
            .collect()
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for EventCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut fields = HashMap::new();
        event.record(&mut FieldVisitor { fields: &mut fields });
        self.events.lock().unwrap().push(CapturedEvent {
            target: event.metadata().target().to_string(),
            level: *event.metadata().level(),
            fields,
        });
    }
}

struct FieldVisitor<'a> {
    fields: &'a mut HashMap<String, String>,
}

impl tracing::field::Visit for FieldVisitor<'_> {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.fields.insert(field.name().to_string(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.fields.insert(field.name().to_string(), value.to_string());
    }
}

fn orders_model(version: ApiVersion) -> Model {
    Model::builder("orders")
        .version(version)
        .entity_set(EntitySet::new("Orders"))
        .build()
        .unwrap()
}

#[test]
fn test_registration_logs_family() {
    let capture = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());

    tracing::subscriber::with_default(subscriber, || {
        let mut table = RouteTable::new();
        table
            .register_versioned_routes(
                "orders",
                "api",
                vec![orders_model(ApiVersion::new(1, 0)), orders_model(ApiVersion::new(2, 0))],
            )
            .unwrap();
    });

    let info = capture.messages(tracing::Level::INFO);
    assert_eq!(info, vec!["Versioned route family registered".to_string()]);

    let family = capture
        .events()
        .into_iter()
        .find(|e| e.level == tracing::Level::INFO)
        .unwrap();
    assert_eq!(family.fields.get("route").map(String::as_str), Some("orders"));
    assert_eq!(family.fields.get("versions").map(String::as_str), Some("1.0, 2.0"));

    // one debug event per registered entry
    assert_eq!(capture.messages(tracing::Level::DEBUG).len(), 3);
}

#[test]
fn test_ambiguity_logs_warning() {
    let mut table = RouteTable::new();
    table
        .register_versioned_route("orders", "api", orders_model(ApiVersion::new(2, 0)), ApiVersion::new(2, 0))
        .unwrap();
    table
        .register_versioned_route("legacy", "api", orders_model(ApiVersion::new(2, 0)), ApiVersion::new(2, 0))
        .unwrap();
    let resolver = Resolver::new(Arc::new(table), VersioningOptions::default());

    let capture = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let result = tracing::subscriber::with_default(subscriber, || {
        resolver.resolve(&RouteRequest::new("/api/Orders?api-version=2.0")).map(|r| r.is_dispatch())
    });

    assert!(matches!(result, Err(RouteError::AmbiguousRoute { .. })));
    assert_eq!(
        capture.messages(tracing::Level::WARN),
        vec!["Request matched multiple versioned routes".to_string()]
    );
}

#[test]
fn test_rejection_logs_debug_outcome() {
    let mut table = RouteTable::new();
    table
        .register_versioned_routes("orders", "api", vec![orders_model(ApiVersion::new(1, 0))])
        .unwrap();
    let resolver = Resolver::new(Arc::new(table), VersioningOptions::default());

    let capture = EventCapture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    tracing::subscriber::with_default(subscriber, || {
        resolver.resolve(&RouteRequest::new("/api/Orders?api-version=7.0")).unwrap();
    });

    let rejected = capture
        .events()
        .into_iter()
        .find(|e| e.fields.get("message").map(String::as_str) == Some("Request rejected by unversioned fallback"))
        .unwrap();
    assert_eq!(rejected.fields.get("code").map(String::as_str), Some("UnsupportedApiVersion"));
    assert_eq!(rejected.fields.get("route").map(String::as_str), Some("orders-Unversioned"));
}
