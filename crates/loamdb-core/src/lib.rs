//! Core runtime for LoamDB's relationship-path aggregates: spec validation,
//! execution planning, dependency-node scheduling, and value resolution.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod db;
pub mod model;
pub mod obs;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_support;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, schedulers, stores, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::{
            aggregate::{Aggregate, AggregateBuilder, AggregateKind},
            query::{Direction, Predicate, Query},
        },
        model::{RelationshipKind, RelationshipPath, ResourceId, StoreId},
        value::{FieldType, Value},
    };
}
