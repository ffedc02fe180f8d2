//! Module: db::schedule::runner
//! Responsibility: deterministic reference scheduler for dependency nodes.
//! Does not own: node construction or resolver semantics.
//! Boundary: upholds the scheduler contract (dependency-before-dependent,
//! single resolution, per-chain error propagation) single-threaded.

use crate::db::{
    aggregate::ResolveError,
    schedule::{DependencyNode, DependencySnapshot, NodePath},
};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use thiserror::Error as ThisError;

///
/// ScheduleError
///
/// Structural and per-node scheduling failures. Structural variants abort
/// the run; per-node variants are reported in the outcome so unrelated
/// node chains keep resolving.
///

#[derive(Clone, Debug, PartialEq, ThisError)]
pub enum ScheduleError {
    #[error("dependency node already declared: {path}")]
    DuplicatePath { path: NodePath },

    #[error("node {path} depends on {dependency}, which is neither declared nor seeded")]
    MissingDependency { path: NodePath, dependency: NodePath },

    #[error("dependency cycle among unresolved nodes: {remaining:?}")]
    DependencyCycle { remaining: Vec<NodePath> },

    #[error("node {path} failed to resolve: {source}")]
    ResolverFailed {
        path: NodePath,
        #[source]
        source: ResolveError,
    },

    #[error("node {path} skipped: dependency {dependency} failed")]
    DependencyFailed { path: NodePath, dependency: NodePath },
}

///
/// NodeFailure
///

#[derive(Clone, Debug, PartialEq)]
pub struct NodeFailure {
    pub path: NodePath,
    pub error: ScheduleError,
}

///
/// ResolutionOutcome
///
/// Snapshot of everything that resolved, plus the failures of nodes whose
/// own resolver failed or whose dependency chain did.
///

#[derive(Debug, Default)]
pub struct ResolutionOutcome {
    pub snapshot: DependencySnapshot,
    pub failures: Vec<NodeFailure>,
}

impl ResolutionOutcome {
    /// Failure recorded for `path`, if its chain failed.
    #[must_use]
    pub fn failure(&self, path: &NodePath) -> Option<&NodeFailure> {
        self.failures.iter().find(|failure| &failure.path == path)
    }
}

///
/// Scheduler
///
/// Insertion-ordered node registry with a deterministic run loop. Ready
/// synchronous nodes resolve before ready asynchronous ones; a node's
/// value is written into the snapshot exactly once, by the runner, when
/// its resolver returns.
///

#[derive(Debug, Default)]
pub struct Scheduler {
    nodes: IndexMap<NodePath, DependencyNode>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
        }
    }

    /// Declare one node. Paths are unique across a run.
    pub fn declare(&mut self, node: DependencyNode) -> Result<(), ScheduleError> {
        if self.nodes.contains_key(node.path()) {
            return Err(ScheduleError::DuplicatePath {
                path: node.path().clone(),
            });
        }

        self.nodes.insert(node.path().clone(), node);
        Ok(())
    }

    /// Declare a batch of nodes, stopping at the first duplicate.
    pub fn declare_all(
        &mut self,
        nodes: impl IntoIterator<Item = DependencyNode>,
    ) -> Result<(), ScheduleError> {
        for node in nodes {
            self.declare(node)?;
        }

        Ok(())
    }

    /// Resolve every declared node against the seeded snapshot.
    ///
    /// Structural problems (unknown dependency, cycle) abort with an error.
    /// A resolver failure is terminal for that node and its dependents
    /// only; all other nodes resolve normally and appear in the outcome
    /// snapshot.
    pub fn run(self, seed: DependencySnapshot) -> Result<ResolutionOutcome, ScheduleError> {
        let mut nodes = self.nodes;
        let mut snapshot = seed;
        let mut failures: Vec<NodeFailure> = Vec::new();
        let mut failed: BTreeSet<NodePath> = BTreeSet::new();

        while !nodes.is_empty() {
            // Nodes blocked by a failed dependency are skipped, not run.
            if let Some((path, dependency)) = find_blocked(&nodes, &failed) {
                nodes.shift_remove(&path);
                failed.insert(path.clone());
                failures.push(NodeFailure {
                    path: path.clone(),
                    error: ScheduleError::DependencyFailed { path, dependency },
                });
                continue;
            }

            let Some(path) = pick_ready(&nodes, &snapshot) else {
                return Err(stall_error(&nodes, &snapshot, &failed));
            };

            let Some(node) = nodes.shift_remove(&path) else {
                continue;
            };
            match node.resolve(&snapshot) {
                Ok(value) => {
                    let previous = snapshot.insert(path.clone(), value);
                    debug_assert!(previous.is_none(), "node {path} resolved twice");
                }
                Err(source) => {
                    failed.insert(path.clone());
                    failures.push(NodeFailure {
                        path: path.clone(),
                        error: ScheduleError::ResolverFailed { path, source },
                    });
                }
            }
        }

        Ok(ResolutionOutcome { snapshot, failures })
    }
}

// First node all of whose dependencies hold values, synchronous nodes
// first, insertion order otherwise.
fn pick_ready(
    nodes: &IndexMap<NodePath, DependencyNode>,
    snapshot: &DependencySnapshot,
) -> Option<NodePath> {
    let mut ready_async: Option<NodePath> = None;

    for (path, node) in nodes {
        let ready = node
            .dependencies()
            .iter()
            .all(|dependency| snapshot.contains(dependency));
        if !ready {
            continue;
        }
        if node.is_synchronous() {
            return Some(path.clone());
        }
        if ready_async.is_none() {
            ready_async = Some(path.clone());
        }
    }

    ready_async
}

// No node is ready: distinguish an undeclared dependency from a cycle.
fn stall_error(
    nodes: &IndexMap<NodePath, DependencyNode>,
    snapshot: &DependencySnapshot,
    failed: &BTreeSet<NodePath>,
) -> ScheduleError {
    for (path, node) in nodes {
        for dependency in node.dependencies() {
            let known = snapshot.contains(dependency)
                || nodes.contains_key(dependency)
                || failed.contains(dependency);
            if !known {
                return ScheduleError::MissingDependency {
                    path: path.clone(),
                    dependency: dependency.clone(),
                };
            }
        }
    }

    ScheduleError::DependencyCycle {
        remaining: nodes.keys().cloned().collect(),
    }
}

// First node waiting on a dependency that already failed.
fn find_blocked(
    nodes: &IndexMap<NodePath, DependencyNode>,
    failed: &BTreeSet<NodePath>,
) -> Option<(NodePath, NodePath)> {
    for (path, node) in nodes {
        for dependency in node.dependencies() {
            if failed.contains(dependency) {
                return Some((path.clone(), dependency.clone()));
            }
        }
    }

    None
}
