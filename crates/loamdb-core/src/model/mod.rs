//! Resource metadata vocabulary: identities, relationship paths, and the
//! provider seams the planner and validator consume.
//!
//! Providers are passed explicitly wherever they are needed. Nothing in this
//! crate reaches into an ambient registry.

pub mod relation;

pub use relation::{RelationshipDescriptor, RelationshipKind};

use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::value::FieldType;

///
/// ResourceId
///
/// Opaque identity of a resource as declared by the metadata system.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ResourceId(pub &'static str);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// StoreId
///
/// Opaque identity of the backing engine a resource is persisted in.
/// Compared for equality when a relationship path crosses resources.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct StoreId(pub &'static str);

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

///
/// RelationshipPath
///
/// Ordered relationship names describing a traversal from an owning resource
/// to a related resource. Empty for a local aggregate.
///

#[derive(
    Clone,
    Debug,
    Default,
    Deref,
    Eq,
    Hash,
    IntoIterator,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    Deserialize,
)]
#[into_iterator(owned, ref)]
pub struct RelationshipPath(Vec<String>);

impl RelationshipPath {
    #[must_use]
    pub const fn new(names: Vec<String>) -> Self {
        Self(names)
    }

    /// Build a path from relationship name literals.
    #[must_use]
    pub fn of(names: &[&str]) -> Self {
        Self(names.iter().map(ToString::to_string).collect())
    }

    /// Split off the first hop, if any.
    #[must_use]
    pub fn split_first(&self) -> Option<(&str, Self)> {
        let (first, rest) = self.0.split_first()?;

        Some((first.as_str(), Self(rest.to_vec())))
    }

    /// Dotted rendering used in node paths and diagnostics.
    #[must_use]
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Display for RelationshipPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())
    }
}

///
/// ResourceMetadata
///
/// Read surface of the external metadata/DSL system. Lookups are by opaque
/// resource identity; a `None` answer means the metadata system does not
/// know the relationship or attribute.
///

pub trait ResourceMetadata {
    /// Resolve a relationship declared on `resource` by name.
    fn relationship(&self, resource: ResourceId, name: &str) -> Option<RelationshipDescriptor>;

    /// Whether `resource` exposes a primary read action.
    fn has_primary_read(&self, resource: ResourceId) -> bool;

    /// Ordered primary key field set of `resource`.
    fn primary_key(&self, resource: ResourceId) -> Vec<String>;

    /// Resolved type of an attribute on `resource`, if the attribute exists.
    fn attribute_type(&self, resource: ResourceId, field: &str) -> Option<FieldType>;
}

///
/// StoreIdentity
///
/// Maps a resource to the identity of its backing store.
///

pub trait StoreIdentity {
    fn store_of(&self, resource: ResourceId) -> StoreId;
}
