//! Query value object consumed by the planner and the value resolver.
//!
//! A query here is declarative state only. Compilation into a store-native
//! form and execution belong to the backing store behind `db::store`.

mod predicate;

pub use predicate::{CompareOp, ComparePredicate, Predicate};

use crate::{db::aggregate::Aggregate, model::ResourceId};
use std::collections::BTreeSet;

///
/// Direction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    Asc,
    Desc,
}

///
/// QueryPart
///
/// Clause selector for `Query::clear`.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum QueryPart {
    Filter,
    Sort,
    Aggregates,
    Load,
    Limit,
    Offset,
}

///
/// Query
///
/// Declarative fetch description for one resource: filter, sort, side-load
/// set, aggregate set, and window. Builder methods consume and return the
/// query; nothing is validated here.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    resource: ResourceId,
    filter: Option<Predicate>,
    sort: Vec<(String, Direction)>,
    load: BTreeSet<String>,
    aggregates: Vec<Aggregate>,
    limit: Option<u32>,
    offset: u32,
}

impl Query {
    #[must_use]
    pub const fn new(resource: ResourceId) -> Self {
        Self {
            resource,
            filter: None,
            sort: Vec::new(),
            load: BTreeSet::new(),
            aggregates: Vec::new(),
            limit: None,
            offset: 0,
        }
    }

    #[must_use]
    pub const fn resource(&self) -> ResourceId {
        self.resource
    }

    #[must_use]
    pub const fn filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    #[must_use]
    pub fn sort(&self) -> &[(String, Direction)] {
        &self.sort
    }

    #[must_use]
    pub const fn load(&self) -> &BTreeSet<String> {
        &self.load
    }

    #[must_use]
    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    #[must_use]
    pub const fn limit(&self) -> Option<u32> {
        self.limit
    }

    #[must_use]
    pub const fn offset(&self) -> u32 {
        self.offset
    }

    /// Intersect `expr` into the current filter (logical AND).
    #[must_use]
    pub fn with_filter(mut self, expr: Predicate) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => Predicate::and(vec![existing, expr]),
            None => expr,
        });

        self
    }

    #[must_use]
    pub fn with_sort(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.sort.push((field.into(), direction));
        self
    }

    #[must_use]
    pub fn with_load(mut self, name: impl Into<String>) -> Self {
        self.load.insert(name.into());
        self
    }

    #[must_use]
    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Drop the selected clauses, keeping the rest of the query intact.
    #[must_use]
    pub fn clear(mut self, parts: &[QueryPart]) -> Self {
        for part in parts {
            match part {
                QueryPart::Filter => self.filter = None,
                QueryPart::Sort => self.sort.clear(),
                QueryPart::Aggregates => self.aggregates.clear(),
                QueryPart::Load => self.load.clear(),
                QueryPart::Limit => self.limit = None,
                QueryPart::Offset => self.offset = 0,
            }
        }

        self
    }

    /// Whether the filter or sort of this query targets `name`.
    #[must_use]
    pub fn references(&self, name: &str) -> bool {
        let in_filter = self
            .filter
            .as_ref()
            .is_some_and(|filter| filter.references_field(name));

        in_filter || self.sort.iter().any(|(field, _)| field == name)
    }
}
