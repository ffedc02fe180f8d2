//! Module: db::store
//! Responsibility: backing-store boundary types and the store trait the value
//! resolver executes against.
//! Does not own: aggregate validation, planning, or scheduling.
//! Boundary: everything past `DataStore` belongs to a storage engine.

use crate::{
    db::{
        aggregate::{Aggregate, ResolveError},
        query::Query,
    },
    model::ResourceId,
    value::Value,
};
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

///
/// Record
///
/// One already-fetched row of the owning resource, as handed to the value
/// resolver by the primary fetch.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, Value>,
}

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

///
/// OwnerKey
///
/// Primary-key tuple of an owning record, in the resource's declared key
/// field order. Keys resolved aggregate value maps.
///

#[derive(
    Clone, Debug, Deref, Eq, IntoIterator, Ord, PartialEq, PartialOrd, Serialize, Deserialize,
)]
#[into_iterator(owned, ref)]
pub struct OwnerKey(Vec<Value>);

impl OwnerKey {
    #[must_use]
    pub const fn new(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

/// Resolved aggregate values, keyed by owner primary-key tuple, then by
/// aggregate name. Owners with no matching rows are simply absent.
pub type AggregateValueMap = BTreeMap<OwnerKey, BTreeMap<String, Value>>;

///
/// ResultRow
///
/// One row returned by an executed aggregate query: the owner's key plus a
/// generic aggregate-name/value map, directly loaded alias values, or both.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
    owner_key: OwnerKey,
    values: BTreeMap<String, Value>,
    loaded: BTreeMap<String, Value>,
}

impl ResultRow {
    #[must_use]
    pub const fn new(owner_key: OwnerKey) -> Self {
        Self {
            owner_key,
            values: BTreeMap::new(),
            loaded: BTreeMap::new(),
        }
    }

    /// Attach a generic reduced value under an aggregate name.
    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Attach a directly materialized value under a load alias.
    #[must_use]
    pub fn with_loaded(mut self, alias: impl Into<String>, value: Value) -> Self {
        self.loaded.insert(alias.into(), value);
        self
    }

    #[must_use]
    pub const fn owner_key(&self) -> &OwnerKey {
        &self.owner_key
    }

    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    #[must_use]
    pub const fn loaded(&self) -> &BTreeMap<String, Value> {
        &self.loaded
    }
}

///
/// NativeQuery
///
/// Store-native query form produced by `DataStore::compile`. The core keeps
/// it transparent enough to fold aggregate shapes into; interpretation is
/// the store's.
///

#[derive(Clone, Debug, PartialEq)]
pub struct NativeQuery {
    query: Query,
    aggregates: Vec<Aggregate>,
}

impl NativeQuery {
    #[must_use]
    pub const fn new(query: Query) -> Self {
        Self {
            query,
            aggregates: Vec::new(),
        }
    }

    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    #[must_use]
    pub fn aggregates(&self) -> &[Aggregate] {
        &self.aggregates
    }

    /// Fold one aggregate shape into this native form.
    #[must_use]
    pub fn with_aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregates.push(aggregate);
        self
    }
}

///
/// DataStore
///
/// Backing-store seam for aggregate resolution. Implementations report
/// refusals through the resolution error taxonomy: `compile` fails with
/// `QueryCompilation`, `add_aggregate` with `AggregateRejected`, and
/// `run_query` with `Execution`.
///

pub trait DataStore {
    /// Compile a declarative query into the store-native form.
    fn compile(&self, query: &Query) -> Result<NativeQuery, ResolveError>;

    /// Fold one aggregate's shape into a native query.
    fn add_aggregate(
        &self,
        native: NativeQuery,
        aggregate: &Aggregate,
        resource: ResourceId,
    ) -> Result<NativeQuery, ResolveError>;

    /// Execute a native query, producing owner-keyed result rows.
    fn run_query(
        &self,
        native: NativeQuery,
        resource: ResourceId,
    ) -> Result<Vec<ResultRow>, ResolveError>;
}
