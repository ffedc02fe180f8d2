//! Module: db::aggregate::spec
//! Responsibility: aggregate specification type, kind taxonomy, and the
//! atomic construction-time validation.
//! Does not own: placement decisions or resolution mechanics.
//! Boundary: a constructed `Aggregate` is immutable except for the single
//! authorization-filter write performed by the planner.

use crate::{
    db::{
        aggregate::{AggregateError, KindViolation, SubQueryViolation, path::validate_path},
        query::{Predicate, Query},
    },
    model::{RelationshipPath, ResourceId, ResourceMetadata, StoreIdentity},
    value::{FieldType, Value},
};
use std::fmt;

///
/// AggregateKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggregateKind {
    Count,
    Exists,
    First,
    Sum,
    Min,
    Max,
    Avg,
    List,
}

impl AggregateKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Exists => "exists",
            Self::First => "first",
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Avg => "avg",
            Self::List => "list",
        }
    }

    /// Whether this kind folds a target field rather than bare membership.
    #[must_use]
    pub const fn requires_field(self) -> bool {
        match self {
            Self::Count | Self::Exists => false,
            Self::First | Self::Sum | Self::Min | Self::Max | Self::Avg | Self::List => true,
        }
    }

    /// Canonical value for an owner with no reachable rows. Applied by the
    /// consumer of the resolved value map, never during reduction.
    #[must_use]
    pub const fn default_value(self) -> Option<Value> {
        match self {
            Self::Count => Some(Value::Uint(0)),
            Self::Exists => Some(Value::Bool(false)),
            Self::First | Self::Sum | Self::Min | Self::Max | Self::Avg | Self::List => None,
        }
    }

    // Resolve the aggregate's value type from the target field's type.
    // Sum/Avg accept any known field type; numeric enforcement stays with
    // the backing store.
    fn resolve_type(self, field_type: Option<FieldType>) -> Result<FieldType, KindViolation> {
        match (self, field_type) {
            (Self::Count, _) => Ok(FieldType::Uint),
            (Self::Exists, _) => Ok(FieldType::Bool),
            (Self::List, Some(inner)) => Ok(FieldType::List(Box::new(inner))),
            (Self::First | Self::Sum | Self::Min | Self::Max | Self::Avg, Some(field_type)) => {
                Ok(field_type)
            }
            (Self::First | Self::Sum | Self::Min | Self::Max | Self::Avg | Self::List, None) => {
                Err(KindViolation::MissingField)
            }
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// Aggregate
///
/// Immutable description of one aggregate value over a relationship path,
/// validated atomically at construction. Lives for one query compilation
/// and is consumed by the value resolver of its group.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Aggregate {
    name: String,
    relationship_path: RelationshipPath,
    kind: AggregateKind,
    field: Option<String>,
    resolved_type: FieldType,
    default_value: Option<Value>,
    owning_resource: ResourceId,
    related_resource: ResourceId,
    sub_query: Option<Query>,
    authorization_filter: Option<Predicate>,
    load_alias: Option<String>,
    distinct: bool,
}

impl Aggregate {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn relationship_path(&self) -> &RelationshipPath {
        &self.relationship_path
    }

    #[must_use]
    pub const fn kind(&self) -> AggregateKind {
        self.kind
    }

    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    #[must_use]
    pub const fn resolved_type(&self) -> &FieldType {
        &self.resolved_type
    }

    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default_value.as_ref()
    }

    #[must_use]
    pub const fn owning_resource(&self) -> ResourceId {
        self.owning_resource
    }

    /// Resource reached by the relationship path; the owning resource for a
    /// local (empty-path) aggregate.
    #[must_use]
    pub const fn related_resource(&self) -> ResourceId {
        self.related_resource
    }

    #[must_use]
    pub const fn sub_query(&self) -> Option<&Query> {
        self.sub_query.as_ref()
    }

    #[must_use]
    pub const fn authorization_filter(&self) -> Option<&Predicate> {
        self.authorization_filter.as_ref()
    }

    #[must_use]
    pub fn load_alias(&self) -> Option<&str> {
        self.load_alias.as_deref()
    }

    #[must_use]
    pub const fn distinct(&self) -> bool {
        self.distinct
    }

    // The single post-construction write, performed by the planner when an
    // authorization node resolved a filter for this aggregate's group.
    pub(crate) fn set_authorization_filter(&mut self, filter: Predicate) {
        self.authorization_filter = Some(filter);
    }

    // Shape handed to the backing store once the sub-query is finalized.
    pub(crate) fn with_sub_query(mut self, query: Query) -> Self {
        self.sub_query = Some(query);
        self
    }

    // Sub-query with the group's authorization filter intersected in, built
    // per aggregate because group members may carry distinct filters.
    pub(crate) fn authorized_sub_query(&self) -> Option<Query> {
        match &self.authorization_filter {
            Some(filter) => {
                let base = self
                    .sub_query
                    .clone()
                    .unwrap_or_else(|| Query::new(self.related_resource));

                Some(base.with_filter(filter.clone()))
            }
            None => self.sub_query.clone(),
        }
    }
}

///
/// AggregateBuilder
///
/// Fluent construction for `Aggregate`. All invariants are enforced in
/// `build`; on violation no partial aggregate escapes.
///

#[derive(Clone, Debug)]
pub struct AggregateBuilder {
    owning_resource: ResourceId,
    name: String,
    kind: AggregateKind,
    relationship_path: RelationshipPath,
    field: Option<String>,
    sub_query: Option<Query>,
    load_alias: Option<String>,
    distinct: bool,
}

impl AggregateBuilder {
    #[must_use]
    pub fn new(owning_resource: ResourceId, name: impl Into<String>, kind: AggregateKind) -> Self {
        Self {
            owning_resource,
            name: name.into(),
            kind,
            relationship_path: RelationshipPath::default(),
            field: None,
            sub_query: None,
            load_alias: None,
            distinct: false,
        }
    }

    #[must_use]
    pub fn path(mut self, path: RelationshipPath) -> Self {
        self.relationship_path = path;
        self
    }

    #[must_use]
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn sub_query(mut self, query: Query) -> Self {
        self.sub_query = Some(query);
        self
    }

    #[must_use]
    pub fn load_alias(mut self, alias: impl Into<String>) -> Self {
        self.load_alias = Some(alias.into());
        self
    }

    #[must_use]
    pub const fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    /// Validate and build the aggregate. Path, sub-query shape, and
    /// kind/field pairing are all checked here, atomically.
    pub fn build(
        self,
        metadata: &dyn ResourceMetadata,
        stores: &dyn StoreIdentity,
    ) -> Result<Aggregate, AggregateError> {
        let related_resource = validate_path(
            metadata,
            stores,
            self.owning_resource,
            &self.relationship_path,
        )?;

        if let Some(sub_query) = &self.sub_query {
            validate_sub_query(sub_query)?;
        }

        let field_type = if self.kind.requires_field() {
            match &self.field {
                Some(field) => Some(
                    metadata
                        .attribute_type(related_resource, field)
                        .ok_or_else(|| AggregateError::InvalidAggregateKind {
                            kind: self.kind,
                            violation: KindViolation::UnknownFieldType {
                                resource: related_resource,
                                field: field.clone(),
                            },
                        })?,
                ),
                None => None,
            }
        } else {
            None
        };

        let resolved_type = self.kind.resolve_type(field_type).map_err(|violation| {
            AggregateError::InvalidAggregateKind {
                kind: self.kind,
                violation,
            }
        })?;
        let default_value = self.kind.default_value();

        Ok(Aggregate {
            name: self.name,
            relationship_path: self.relationship_path,
            kind: self.kind,
            field: self.field,
            resolved_type,
            default_value,
            owning_resource: self.owning_resource,
            related_resource,
            sub_query: self.sub_query,
            authorization_filter: None,
            load_alias: self.load_alias,
            distinct: self.distinct,
        })
    }
}

// Aggregation sub-queries are flat: no side-loads, no nested aggregates,
// no window.
fn validate_sub_query(query: &Query) -> Result<(), AggregateError> {
    let violation = if !query.load().is_empty() {
        Some(SubQueryViolation::SideLoads)
    } else if !query.aggregates().is_empty() {
        Some(SubQueryViolation::NestedAggregates)
    } else if query.limit().is_some() {
        Some(SubQueryViolation::Limit)
    } else if query.offset() != 0 {
        Some(SubQueryViolation::Offset)
    } else {
        None
    };

    match violation {
        Some(violation) => Err(AggregateError::InvalidSubQuery { violation }),
        None => Ok(()),
    }
}
