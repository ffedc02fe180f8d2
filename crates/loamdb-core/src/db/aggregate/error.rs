//! Module: db::aggregate::error
//! Responsibility: construction-time and resolution-time error taxonomy for
//! relationship-path aggregates.
//! Does not own: planner or scheduler failure bookkeeping.
//! Boundary: typed errors surfaced to callers as validation/execution
//! failures; nothing here is retried.

use crate::{
    db::aggregate::AggregateKind,
    model::{ResourceId, StoreId},
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// PathError
///
/// Relationship-path validation taxonomy. Validation is fail-fast: the first
/// violating hop produces the error and later hops are never inspected.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum PathError {
    #[error("no relationship named `{name}` on {resource}")]
    NoSuchRelationship { resource: ResourceId, name: String },

    #[error("resource {resource} exposes no primary read action")]
    NoReadAction { resource: ResourceId },

    #[error(
        "relationship `{name}` on {resource} crosses a store boundary ({expected} -> {found})"
    )]
    CrossStoreBoundary {
        resource: ResourceId,
        name: String,
        expected: StoreId,
        found: StoreId,
    },
}

///
/// KindViolation
///
/// Reason detail for an invalid aggregate kind/field pairing.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum KindViolation {
    MissingField,
    UnknownFieldType { resource: ResourceId, field: String },
}

impl fmt::Display for KindViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField => write!(f, "a target field is required"),
            Self::UnknownFieldType { resource, field } => {
                write!(f, "{resource}.{field} has no known attribute type")
            }
        }
    }
}

///
/// SubQueryViolation
///
/// Disallowed clause found on an aggregate sub-query. Aggregation
/// sub-queries are flat by construction.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SubQueryViolation {
    SideLoads,
    NestedAggregates,
    Limit,
    Offset,
}

impl fmt::Display for SubQueryViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SideLoads => write!(f, "side-load set must be empty"),
            Self::NestedAggregates => write!(f, "nested aggregates are not allowed"),
            Self::Limit => write!(f, "limit is not allowed"),
            Self::Offset => write!(f, "offset must be zero"),
        }
    }
}

///
/// AggregateError
///
/// Construction-time taxonomy. All variants are fully recoverable: no
/// aggregate value is produced and the caller may retry with corrected
/// input.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum AggregateError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("invalid aggregate kind {kind}: {violation}")]
    InvalidAggregateKind {
        kind: AggregateKind,
        violation: KindViolation,
    },

    #[error("invalid aggregate sub-query: {violation}")]
    InvalidSubQuery { violation: SubQueryViolation },
}

///
/// ResolveError
///
/// Resolution-time taxonomy. A resolution failure is terminal for the
/// owning aggregate group only; sibling groups proceed normally.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ResolveError {
    #[error("backing store rejected aggregate `{name}`: {reason}")]
    AggregateRejected { name: String, reason: String },

    #[error("query compilation failed: {reason}")]
    QueryCompilation { reason: String },

    #[error("aggregate query execution failed: {reason}")]
    Execution { reason: String },
}

impl ResolveError {
    /// Construct a store-rejection error for one aggregate shape.
    #[must_use]
    pub fn rejected(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AggregateRejected {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Construct a compilation error.
    #[must_use]
    pub fn compilation(reason: impl Into<String>) -> Self {
        Self::QueryCompilation {
            reason: reason.into(),
        }
    }

    /// Construct an execution error.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }
}

///
/// ReversePathError
///
/// Failure to express a relationship path from the related side back to the
/// owner. Never fatal: it forces out-of-query placement for the group.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
#[error("no reverse path through `{relationship}` from {resource}")]
pub struct ReversePathError {
    pub resource: ResourceId,
    pub relationship: String,
}
