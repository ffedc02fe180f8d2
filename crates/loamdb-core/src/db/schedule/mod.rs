//! Dependency-node scheduling primitives.
//!
//! A node is a unit of deferred computation addressed by a unique path,
//! resolved exactly once after all of its declared dependency paths hold
//! values. The planner emits nodes; a scheduler resolves them. The runner
//! in this module is a minimal deterministic reference implementation of
//! the scheduler contract; production engines may substitute their own as
//! long as they keep dependency-before-dependent ordering, single
//! resolution per node, and first-error propagation per node chain.

mod runner;

pub use runner::{NodeFailure, ResolutionOutcome, ScheduleError, Scheduler};

use crate::{
    db::{
        aggregate::ResolveError,
        query::Predicate,
        store::{AggregateValueMap, Record},
    },
    model::RelationshipPath,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

///
/// NodePath
///
/// Unique address of a dependency node.
///

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct NodePath(Vec<String>);

impl NodePath {
    #[must_use]
    pub const fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Build a path from segment literals.
    #[must_use]
    pub fn of(segments: &[&str]) -> Self {
        Self(segments.iter().map(ToString::to_string).collect())
    }

    /// Output path of the authorization node for one aggregate group.
    #[must_use]
    pub fn aggregate_auth(path: &RelationshipPath) -> Self {
        Self(vec!["aggregate-auth".to_string(), path.dotted()])
    }

    /// Output path of the value node for one aggregate group.
    #[must_use]
    pub fn aggregate_values(path: &RelationshipPath) -> Self {
        Self(vec!["aggregate-values".to_string(), path.dotted()])
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

///
/// NodeValue
///
/// Payload held at a resolved node path. Dependents read these through the
/// snapshot; the snapshot is written only by the scheduler, exactly once
/// per node.
///

#[derive(Clone, Debug, PartialEq)]
pub enum NodeValue {
    /// Fetched records of a resource (e.g. the primary fetch's data).
    Records(Vec<Record>),
    /// A resolved (possibly absent) filter expression.
    Filter(Option<Predicate>),
    /// Resolved per-owner aggregate values.
    Values(AggregateValueMap),
}

///
/// DependencySnapshot
///
/// Immutable view of resolved node values handed to a resolver. Typed
/// accessors fail with an execution error when a dependency holds a value
/// of the wrong shape.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DependencySnapshot {
    values: BTreeMap<NodePath, NodeValue>,
}

impl DependencySnapshot {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Seed or record one resolved value. Returns the previous value when
    /// the path was already resolved, which schedulers must treat as a
    /// contract violation.
    pub fn insert(&mut self, path: NodePath, value: NodeValue) -> Option<NodeValue> {
        self.values.insert(path, value)
    }

    #[must_use]
    pub fn contains(&self, path: &NodePath) -> bool {
        self.values.contains_key(path)
    }

    #[must_use]
    pub fn get(&self, path: &NodePath) -> Option<&NodeValue> {
        self.values.get(path)
    }

    /// Read a dependency as fetched records.
    pub fn records(&self, path: &NodePath) -> Result<&[Record], ResolveError> {
        match self.get(path) {
            Some(NodeValue::Records(records)) => Ok(records),
            other => Err(snapshot_mismatch(path, "records", other)),
        }
    }

    /// Read a dependency as a resolved filter.
    pub fn filter(&self, path: &NodePath) -> Result<Option<&Predicate>, ResolveError> {
        match self.get(path) {
            Some(NodeValue::Filter(filter)) => Ok(filter.as_ref()),
            other => Err(snapshot_mismatch(path, "filter", other)),
        }
    }

    /// Read a dependency as resolved aggregate values.
    pub fn values(&self, path: &NodePath) -> Result<&AggregateValueMap, ResolveError> {
        match self.get(path) {
            Some(NodeValue::Values(values)) => Ok(values),
            other => Err(snapshot_mismatch(path, "values", other)),
        }
    }
}

fn snapshot_mismatch(path: &NodePath, wanted: &str, found: Option<&NodeValue>) -> ResolveError {
    match found {
        Some(value) => ResolveError::execution(format!(
            "dependency {path} holds {value:?} where {wanted} were expected"
        )),
        None => ResolveError::execution(format!("dependency {path} holds no value")),
    }
}

/// Deferred computation stored on a node: an explicit function from the
/// dependency snapshot to the node's value.
pub type NodeResolver = Box<dyn FnOnce(&DependencySnapshot) -> Result<NodeValue, ResolveError>>;

///
/// DependencyNode
///
/// One unit of deferred computation. `synchronous` marks nodes that must
/// not run concurrently with other work (strict-check-only authorization);
/// asynchronous nodes are eligible for parallel execution with unrelated
/// nodes.
///

pub struct DependencyNode {
    path: NodePath,
    dependencies: Vec<NodePath>,
    synchronous: bool,
    resolver: NodeResolver,
}

impl DependencyNode {
    #[must_use]
    pub fn new(
        path: NodePath,
        dependencies: Vec<NodePath>,
        synchronous: bool,
        resolver: NodeResolver,
    ) -> Self {
        Self {
            path,
            dependencies,
            synchronous,
            resolver,
        }
    }

    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    #[must_use]
    pub fn dependencies(&self) -> &[NodePath] {
        &self.dependencies
    }

    #[must_use]
    pub const fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    /// Run the resolver against a snapshot in which every declared
    /// dependency holds a value. Consumes the node: a node resolves at
    /// most once.
    pub fn resolve(self, snapshot: &DependencySnapshot) -> Result<NodeValue, ResolveError> {
        (self.resolver)(snapshot)
    }
}

impl fmt::Debug for DependencyNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyNode")
            .field("path", &self.path)
            .field("dependencies", &self.dependencies)
            .field("synchronous", &self.synchronous)
            .finish_non_exhaustive()
    }
}
