//! Relationship-path aggregates: validated specs, execution planning, and
//! deferred value resolution.
//!
//! Construction validates traversals against explicit metadata/store
//! providers; the planner decides in-query vs. out-of-query placement and
//! emits dependency nodes; the resolver runs once its inputs hold values.

mod error;
mod path;
mod planner;
mod resolver;
mod spec;

#[cfg(test)]
mod tests;

pub use error::{
    AggregateError, KindViolation, PathError, ResolveError, ReversePathError, SubQueryViolation,
};
pub use path::validate_path;
pub use planner::{AggregatePlan, PlanContext, plan};
pub use spec::{Aggregate, AggregateBuilder, AggregateKind};

use crate::{
    db::query::{Predicate, Query},
    model::{RelationshipDescriptor, RelationshipPath, ResourceId},
};

///
/// ReversePathResolver
///
/// Side-load collaborator that expresses a relationship path from the
/// related resource back to the owner. A failed lookup is an answer, not an
/// error: the planner falls back to out-of-query placement.
///

pub trait ReversePathResolver {
    fn reverse_path(
        &self,
        descriptor: &RelationshipDescriptor,
        remaining: &RelationshipPath,
    ) -> Result<RelationshipPath, ReversePathError>;
}

///
/// Authorizer
///
/// Strict-check-only policy seam: produces a filter expression scoping what
/// the actor may see of `resource`, without materializing data. Policy
/// evaluation itself lives outside this core.
///

pub trait Authorizer {
    fn strict_filter(
        &self,
        resource: ResourceId,
        query: &Query,
    ) -> Result<Option<Predicate>, ResolveError>;
}
