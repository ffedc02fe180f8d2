use crate::model::ResourceId;
use std::fmt;

///
/// RelationshipKind
///
/// Tagged relationship variant with a shared capability surface. Validator
/// and planner branch on capabilities (`join_resource`) rather than on the
/// tag itself.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelationshipKind {
    BelongsTo,
    HasOne,
    HasMany,
    ManyToMany { through: ResourceId },
}

impl RelationshipKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BelongsTo => "belongs_to",
            Self::HasOne => "has_one",
            Self::HasMany => "has_many",
            Self::ManyToMany { .. } => "many_to_many",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

///
/// RelationshipDescriptor
///
/// Relationship as declared on a source resource: name, destination, and
/// kind. The join resource of a many-to-many hop is part of the kind.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationshipDescriptor {
    name: String,
    source: ResourceId,
    destination: ResourceId,
    kind: RelationshipKind,
}

impl RelationshipDescriptor {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        source: ResourceId,
        destination: ResourceId,
        kind: RelationshipKind,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            destination,
            kind,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn source(&self) -> ResourceId {
        self.source
    }

    #[must_use]
    pub const fn destination(&self) -> ResourceId {
        self.destination
    }

    #[must_use]
    pub const fn kind(&self) -> RelationshipKind {
        self.kind
    }

    /// Join resource a traversal must pass through, when the kind has one.
    #[must_use]
    pub const fn join_resource(&self) -> Option<ResourceId> {
        match self.kind {
            RelationshipKind::ManyToMany { through } => Some(through),
            RelationshipKind::BelongsTo | RelationshipKind::HasOne | RelationshipKind::HasMany => {
                None
            }
        }
    }
}
