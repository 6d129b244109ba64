//! Route constraints
//!
//! Every route entry carries two predicates:
//!
//! - a [`PathConstraint`] that parses the resource path (what is left after
//!   the route prefix) against a compiled model, and
//! - an optional [`VersionConstraint`] that accepts or rejects the requested
//!   API version.
//!
//! Both are pure functions of their input. Entries evaluate them in a fixed
//! order: prefix template, then path, then version.
//!
//! # Structural matches
//!
//! Path evaluation is three-valued. A path whose first segment names a known
//! resource but whose remainder does not parse is [`PathMatch::Partial`]: it
//! still belongs to the family for the purpose of choosing the unversioned
//! fallback, but it can never be dispatched.

use crate::error::RouteError;
use crate::model::Model;
use crate::version::ApiVersion;
use matchit::Router as MatchitRouter;
use std::fmt;
use std::sync::Arc;

const METADATA: &str = "$metadata";
const BATCH: &str = "$batch";
const COUNT: &str = "$count";
const VALUE: &str = "$value";

/// What a recognized resource path addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    /// The service root (empty resource path)
    ServiceDocument,
    /// `$metadata`
    Metadata,
    /// `$batch`
    Batch,
    /// `Orders`
    EntitySet,
    /// `Orders/$count`
    Count,
    /// `Orders(1)` or `Orders/1`
    Entity,
    /// `Orders(1)/Total`
    Property,
    /// `Orders(1)/Total/$value`
    PropertyValue,
    /// `Orders(1)/Lines`
    Navigation,
    /// `Me`
    Singleton,
    /// `Me/Name`
    SingletonProperty,
    /// `TopSellers` or `TopSellers(n=5)`
    OperationImport,
}

/// A successfully parsed resource path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    pub kind: PathKind,
    /// Entity set, singleton or operation named by the first segment
    pub root: Option<String>,
    /// Entity key or operation parameters, as written in the request
    pub key: Option<String>,
    /// Property or navigation name
    pub member: Option<String>,
}

/// Outcome of evaluating a path constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatch {
    /// The whole path parses against the model
    Recognized(ResourcePath),
    /// The first segment names a known resource, the rest does not parse
    Partial { root: String },
    /// Nothing about the path belongs to the model
    Unrecognized,
}

impl PathMatch {
    /// Whether the path structurally belongs to the model
    pub fn is_structural(&self) -> bool {
        !matches!(self, PathMatch::Unrecognized)
    }

    pub fn resource(&self) -> Option<&ResourcePath> {
        match self {
            PathMatch::Recognized(resource) => Some(resource),
            _ => None,
        }
    }
}

/// Structural predicate over resource paths
pub trait PathConstraint: Send + Sync + fmt::Debug {
    /// Parse `path` (no leading slash, no query string)
    fn evaluate(&self, path: &str) -> PathMatch;

    /// True for both recognized and partial paths
    fn matches(&self, path: &str) -> bool {
        self.evaluate(path).is_structural()
    }
}

/// Version predicate bound to a route entry
pub trait VersionConstraint: Send + Sync + fmt::Debug {
    /// Whether a request for `requested` may be dispatched to the entry
    fn accepts(&self, requested: Option<&ApiVersion>) -> bool;

    /// The version this constraint is bound to, for reporting
    fn version(&self) -> Option<&ApiVersion>;
}

/// Accepts exactly one version
///
/// No ranges and no negotiation: `2.1` is not accepted by a `2.0` constraint
/// and an unspecified version is never accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactVersionConstraint {
    version: ApiVersion,
}

impl ExactVersionConstraint {
    pub fn new(version: ApiVersion) -> Self {
        Self { version }
    }
}

impl VersionConstraint for ExactVersionConstraint {
    fn accepts(&self, requested: Option<&ApiVersion>) -> bool {
        requested == Some(&self.version)
    }

    fn version(&self) -> Option<&ApiVersion> {
        Some(&self.version)
    }
}

#[derive(Debug, Clone)]
struct Shape {
    kind: PathKind,
    root: Option<String>,
    member: Option<String>,
}

impl Shape {
    fn new(kind: PathKind, root: Option<&str>, member: Option<&str>) -> Self {
        Self {
            kind,
            root: root.map(str::to_string),
            member: member.map(str::to_string),
        }
    }
}

/// Path constraint compiled from a [`Model`]
///
/// Resource path shapes are inserted into a radix tree; lookups normalize key
/// syntax (`Orders(5)` becomes `Orders/5`) before matching.
pub struct ModelPathConstraint {
    model_name: String,
    tree: MatchitRouter<Shape>,
    roots: Vec<String>,
}

impl fmt::Debug for ModelPathConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelPathConstraint")
            .field("model", &self.model_name)
            .field("roots", &self.roots)
            .finish()
    }
}

/// Compile a model into a path constraint
pub fn compile_path_constraint(model: &Model) -> Result<ModelPathConstraint, RouteError> {
    let mut tree = MatchitRouter::new();
    let mut insert = |route: String, shape: Shape| {
        tree.insert(route.clone(), shape)
            .map_err(|e| RouteError::InvalidModel {
                model: model.name().to_string(),
                reason: format!("resource path \"{}\" cannot be compiled: {}", route, e),
            })
    };

    insert("/".to_string(), Shape::new(PathKind::ServiceDocument, None, None))?;
    insert(format!("/{}", METADATA), Shape::new(PathKind::Metadata, None, None))?;
    insert(format!("/{}", BATCH), Shape::new(PathKind::Batch, None, None))?;

    for set in model.entity_sets() {
        let name = set.name();
        let root = Some(name);
        insert(format!("/{}", name), Shape::new(PathKind::EntitySet, root, None))?;
        // `$count` lands on the key parameter and is told apart after lookup
        insert(format!("/{}/:key", name), Shape::new(PathKind::Entity, root, None))?;
        for property in set.properties() {
            let member = Some(property.as_str());
            insert(
                format!("/{}/:key/{}", name, property),
                Shape::new(PathKind::Property, root, member),
            )?;
            insert(
                format!("/{}/:key/{}/{}", name, property, VALUE),
                Shape::new(PathKind::PropertyValue, root, member),
            )?;
        }
        for navigation in set.navigations() {
            insert(
                format!("/{}/:key/{}", name, navigation),
                Shape::new(PathKind::Navigation, root, Some(navigation.as_str())),
            )?;
        }
    }

    for singleton in model.singletons() {
        let root = Some(singleton.name());
        insert(format!("/{}", singleton.name()), Shape::new(PathKind::Singleton, root, None))?;
        for property in singleton.properties() {
            insert(
                format!("/{}/{}", singleton.name(), property),
                Shape::new(PathKind::SingletonProperty, root, Some(property.as_str())),
            )?;
        }
    }

    for operation in model.operations() {
        let root = Some(operation.as_str());
        insert(format!("/{}", operation), Shape::new(PathKind::OperationImport, root, None))?;
        insert(
            format!("/{}/:key", operation),
            Shape::new(PathKind::OperationImport, root, None),
        )?;
    }

    Ok(ModelPathConstraint {
        model_name: model.name().to_string(),
        tree,
        roots: model.root_names().map(str::to_string).collect(),
    })
}

impl ModelPathConstraint {
    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn partial_or_unrecognized(&self, path: &str) -> PathMatch {
        let first = path.split('/').find(|s| !s.is_empty()).unwrap_or("");
        let name = split_key(first).map(|(name, _)| name).unwrap_or(first);
        let known = name == METADATA || name == BATCH || self.roots.iter().any(|r| r == name);
        if known {
            PathMatch::Partial {
                root: name.to_string(),
            }
        } else {
            PathMatch::Unrecognized
        }
    }
}

impl PathConstraint for ModelPathConstraint {
    fn evaluate(&self, path: &str) -> PathMatch {
        let normalized = normalize_resource_path(path);
        let Ok(matched) = self.tree.at(&normalized) else {
            return self.partial_or_unrecognized(path);
        };

        let shape = matched.value;
        let key = matched.params.get("key").map(str::to_string);
        let kind = match (&key, shape.kind) {
            (Some(key), PathKind::Entity) if key == COUNT => PathKind::Count,
            // system segments are only meaningful where the tree put them
            (Some(key), kind) if key.starts_with('$') && kind != PathKind::OperationImport => {
                return self.partial_or_unrecognized(path);
            }
            (_, kind) => kind,
        };
        let key = if kind == PathKind::Count { None } else { key };

        PathMatch::Recognized(ResourcePath {
            kind,
            root: shape.root.clone(),
            key,
            member: shape.member.clone(),
        })
    }
}

/// OR of several path constraints
///
/// The first recognized evaluation wins; otherwise the first partial one.
#[derive(Debug, Clone, Default)]
pub struct UnionPathConstraint {
    members: Vec<Arc<dyn PathConstraint>>,
}

impl UnionPathConstraint {
    pub fn new(members: Vec<Arc<dyn PathConstraint>>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl PathConstraint for UnionPathConstraint {
    fn evaluate(&self, path: &str) -> PathMatch {
        let mut partial = None;
        for member in &self.members {
            match member.evaluate(path) {
                PathMatch::Recognized(resource) => return PathMatch::Recognized(resource),
                found @ PathMatch::Partial { .. } if partial.is_none() => partial = Some(found),
                _ => {}
            }
        }
        partial.unwrap_or(PathMatch::Unrecognized)
    }
}

/// Split `Name(inner)` into `("Name", "inner")`
fn split_key(segment: &str) -> Option<(&str, &str)> {
    let open = segment.find('(')?;
    let inner = segment.strip_suffix(')')?.get(open + 1..)?;
    let name = &segment[..open];
    (!name.is_empty()).then_some((name, inner))
}

/// Rewrite key syntax into segments: `Orders(5)/Lines` -> `/Orders/5/Lines`
fn normalize_resource_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 2);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        match split_key(segment) {
            Some((name, key)) => {
                normalized.push('/');
                normalized.push_str(name);
                if !key.is_empty() {
                    normalized.push('/');
                    normalized.push_str(key);
                }
            }
            None => {
                normalized.push('/');
                normalized.push_str(segment);
            }
        }
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntitySet;
    use proptest::prelude::*;

    fn sales_model() -> Model {
        Model::builder("sales")
            .version(ApiVersion::new(1, 0))
            .entity_set(EntitySet::new("Orders").property("Total").navigation("Lines"))
            .singleton_with_properties("Me", ["Name"])
            .operation("TopSellers")
            .build()
            .unwrap()
    }

    fn kind_of(constraint: &ModelPathConstraint, path: &str) -> Option<PathKind> {
        constraint.evaluate(path).resource().map(|r| r.kind)
    }

    #[test]
    fn test_normalize_resource_path() {
        assert_eq!(normalize_resource_path(""), "/");
        assert_eq!(normalize_resource_path("Orders"), "/Orders");
        assert_eq!(normalize_resource_path("Orders(5)"), "/Orders/5");
        assert_eq!(normalize_resource_path("Orders(5)/Lines"), "/Orders/5/Lines");
        assert_eq!(normalize_resource_path("Orders('a')/"), "/Orders/'a'");
        assert_eq!(normalize_resource_path("TopSellers()"), "/TopSellers");
    }

    #[test]
    fn test_split_key() {
        assert_eq!(split_key("Orders(5)"), Some(("Orders", "5")));
        assert_eq!(split_key("Orders"), None);
        assert_eq!(split_key("(5)"), None);
        assert_eq!(split_key("Orders(5"), None);
    }

    #[test]
    fn test_recognized_shapes() {
        let constraint = compile_path_constraint(&sales_model()).unwrap();

        assert_eq!(kind_of(&constraint, ""), Some(PathKind::ServiceDocument));
        assert_eq!(kind_of(&constraint, "$metadata"), Some(PathKind::Metadata));
        assert_eq!(kind_of(&constraint, "$batch"), Some(PathKind::Batch));
        assert_eq!(kind_of(&constraint, "Orders"), Some(PathKind::EntitySet));
        assert_eq!(kind_of(&constraint, "Orders/$count"), Some(PathKind::Count));
        assert_eq!(kind_of(&constraint, "Orders(7)"), Some(PathKind::Entity));
        assert_eq!(kind_of(&constraint, "Orders/7"), Some(PathKind::Entity));
        assert_eq!(kind_of(&constraint, "Orders(7)/Total"), Some(PathKind::Property));
        assert_eq!(kind_of(&constraint, "Orders(7)/Total/$value"), Some(PathKind::PropertyValue));
        assert_eq!(kind_of(&constraint, "Orders(7)/Lines"), Some(PathKind::Navigation));
        assert_eq!(kind_of(&constraint, "Me"), Some(PathKind::Singleton));
        assert_eq!(kind_of(&constraint, "Me/Name"), Some(PathKind::SingletonProperty));
        assert_eq!(kind_of(&constraint, "TopSellers"), Some(PathKind::OperationImport));
        assert_eq!(kind_of(&constraint, "TopSellers(n=5)"), Some(PathKind::OperationImport));
    }

    #[test]
    fn test_resource_details() {
        let constraint = compile_path_constraint(&sales_model()).unwrap();
        let PathMatch::Recognized(resource) = constraint.evaluate("Orders(42)/Total") else {
            panic!("expected a recognized path");
        };
        assert_eq!(resource.root.as_deref(), Some("Orders"));
        assert_eq!(resource.key.as_deref(), Some("42"));
        assert_eq!(resource.member.as_deref(), Some("Total"));

        let PathMatch::Recognized(count) = constraint.evaluate("Orders/$count") else {
            panic!("expected a recognized path");
        };
        assert_eq!(count.key, None);
    }

    #[test]
    fn test_partial_paths() {
        let constraint = compile_path_constraint(&sales_model()).unwrap();

        assert_eq!(
            constraint.evaluate("Orders(7)/Unknown"),
            PathMatch::Partial {
                root: "Orders".to_string()
            }
        );
        assert!(matches!(constraint.evaluate("Orders/$value"), PathMatch::Partial { .. }));
        assert!(matches!(constraint.evaluate("Me/Age"), PathMatch::Partial { .. }));
        assert!(matches!(constraint.evaluate("$metadata/extra"), PathMatch::Partial { .. }));
        assert!(constraint.matches("Orders(7)/Unknown"));
    }

    #[test]
    fn test_unrecognized_paths() {
        let constraint = compile_path_constraint(&sales_model()).unwrap();
        assert_eq!(constraint.evaluate("Customers"), PathMatch::Unrecognized);
        assert_eq!(constraint.evaluate("orders"), PathMatch::Unrecognized);
        assert!(!constraint.matches("Customers(1)"));
    }

    #[test]
    fn test_union_prefers_recognized() {
        let v1 = Model::builder("v1")
            .entity_set(EntitySet::new("Orders"))
            .build()
            .unwrap();
        let v2 = Model::builder("v2")
            .entity_set(EntitySet::new("Orders").property("Total"))
            .build()
            .unwrap();
        let union = UnionPathConstraint::new(vec![
            Arc::new(compile_path_constraint(&v1).unwrap()),
            Arc::new(compile_path_constraint(&v2).unwrap()),
        ]);

        assert_eq!(union.len(), 2);
        // v1 only knows the root, v2 knows the property
        assert!(matches!(union.evaluate("Orders(1)/Total"), PathMatch::Recognized(_)));
        assert!(matches!(union.evaluate("Orders(1)/Nope"), PathMatch::Partial { .. }));
        assert_eq!(union.evaluate("Customers"), PathMatch::Unrecognized);
        assert_eq!(UnionPathConstraint::default().evaluate("Orders"), PathMatch::Unrecognized);
    }

    #[test]
    fn test_exact_version_constraint() {
        let constraint = ExactVersionConstraint::new(ApiVersion::new(2, 0));
        assert!(constraint.accepts(Some(&ApiVersion::new(2, 0))));
        assert!(!constraint.accepts(Some(&ApiVersion::new(2, 1))));
        assert!(!constraint.accepts(Some(&ApiVersion::new(2, 0).with_status("beta").unwrap())));
        assert!(!constraint.accepts(None));
        assert_eq!(constraint.version(), Some(&ApiVersion::new(2, 0)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Any key value addresses an entity, in either key syntax
        #[test]
        fn prop_any_key_addresses_entity(key in "[A-Za-z0-9][A-Za-z0-9_=']{0,8}") {
            let constraint = compile_path_constraint(&sales_model()).unwrap();
            let paren = format!("Orders({})", key);
            let slash = format!("Orders/{}", key);
            prop_assert_eq!(constraint.evaluate(&paren), constraint.evaluate(&slash));
            let resource = constraint.evaluate(&paren).resource().cloned();
            prop_assert_eq!(resource.map(|r| r.kind), Some(PathKind::Entity));
        }

        /// Paths rooted outside the model are never structural
        #[test]
        fn prop_foreign_roots_unrecognized(root in "[a-z][a-z0-9]{0,8}", rest in "[A-Za-z0-9/]{0,12}") {
            let constraint = compile_path_constraint(&sales_model()).unwrap();
            let path = format!("{}/{}", root, rest);
            prop_assert!(!constraint.matches(&path));
        }
    }
}
