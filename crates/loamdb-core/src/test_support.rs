//! Shared test fixtures: a small blog-shaped schema and collaborator
//! doubles for the store, reverse-path, and authorization seams.

use crate::{
    db::{
        aggregate::{Authorizer, ResolveError, ReversePathError, ReversePathResolver},
        query::{Predicate, Query},
        store::{DataStore, NativeQuery, ResultRow},
    },
    model::{RelationshipDescriptor, RelationshipPath, ResourceId},
};
use std::cell::RefCell;
use std::collections::BTreeMap;

pub(crate) mod schema {
    use crate::{
        model::{
            RelationshipDescriptor, RelationshipKind, ResourceId, ResourceMetadata, StoreId,
            StoreIdentity,
        },
        value::FieldType,
    };
    use std::collections::BTreeMap;

    pub(crate) const POST: ResourceId = ResourceId("post");
    pub(crate) const COMMENT: ResourceId = ResourceId("comment");
    pub(crate) const USER: ResourceId = ResourceId("user");
    pub(crate) const TAG: ResourceId = ResourceId("tag");
    pub(crate) const TAGGING: ResourceId = ResourceId("tagging");

    pub(crate) const PRIMARY_STORE: StoreId = StoreId("primary");
    pub(crate) const REPLICA_STORE: StoreId = StoreId("replica");

    struct TestResource {
        readable: bool,
        store: StoreId,
        pkey: Vec<String>,
        attributes: BTreeMap<&'static str, FieldType>,
        relationships: Vec<RelationshipDescriptor>,
    }

    pub(crate) struct TestMetadata {
        resources: BTreeMap<&'static str, TestResource>,
    }

    impl TestMetadata {
        fn resource(&self, id: ResourceId) -> Option<&TestResource> {
            self.resources.get(id.0)
        }
    }

    impl ResourceMetadata for TestMetadata {
        fn relationship(
            &self,
            resource: ResourceId,
            name: &str,
        ) -> Option<RelationshipDescriptor> {
            self.resource(resource)?
                .relationships
                .iter()
                .find(|descriptor| descriptor.name() == name)
                .cloned()
        }

        fn has_primary_read(&self, resource: ResourceId) -> bool {
            self.resource(resource).is_some_and(|r| r.readable)
        }

        fn primary_key(&self, resource: ResourceId) -> Vec<String> {
            self.resource(resource).map(|r| r.pkey.clone()).unwrap_or_default()
        }

        fn attribute_type(&self, resource: ResourceId, field: &str) -> Option<FieldType> {
            self.resource(resource)?.attributes.get(field).cloned()
        }
    }

    impl StoreIdentity for TestMetadata {
        fn store_of(&self, resource: ResourceId) -> StoreId {
            self.resource(resource).map_or(PRIMARY_STORE, |r| r.store)
        }
    }

    fn resource(
        pkey: &[&str],
        attributes: &[(&'static str, FieldType)],
        relationships: Vec<RelationshipDescriptor>,
    ) -> TestResource {
        TestResource {
            readable: true,
            store: PRIMARY_STORE,
            pkey: pkey.iter().map(ToString::to_string).collect(),
            attributes: attributes.iter().cloned().collect(),
            relationships,
        }
    }

    /// The baseline schema: posts with comments, an author, and tags held
    /// through a join resource.
    pub(crate) fn metadata() -> TestMetadata {
        let mut resources = BTreeMap::new();
        resources.insert(
            POST.0,
            resource(
                &["id"],
                &[("id", FieldType::Uint), ("title", FieldType::Text)],
                vec![
                    RelationshipDescriptor::new(
                        "comments",
                        POST,
                        COMMENT,
                        RelationshipKind::HasMany,
                    ),
                    RelationshipDescriptor::new("author", POST, USER, RelationshipKind::BelongsTo),
                    RelationshipDescriptor::new(
                        "tags",
                        POST,
                        TAG,
                        RelationshipKind::ManyToMany { through: TAGGING },
                    ),
                ],
            ),
        );
        resources.insert(
            COMMENT.0,
            resource(
                &["id"],
                &[
                    ("id", FieldType::Uint),
                    ("rating", FieldType::Uint),
                    ("body", FieldType::Text),
                ],
                vec![RelationshipDescriptor::new(
                    "author",
                    COMMENT,
                    USER,
                    RelationshipKind::BelongsTo,
                )],
            ),
        );
        resources.insert(
            USER.0,
            resource(
                &["id"],
                &[("id", FieldType::Uint), ("name", FieldType::Text)],
                vec![],
            ),
        );
        resources.insert(
            TAG.0,
            resource(
                &["id"],
                &[("id", FieldType::Uint), ("label", FieldType::Text)],
                vec![],
            ),
        );
        resources.insert(
            TAGGING.0,
            resource(
                &["post_id", "tag_id"],
                &[("post_id", FieldType::Uint), ("tag_id", FieldType::Uint)],
                vec![],
            ),
        );

        TestMetadata { resources }
    }

    /// Baseline schema with one resource stripped of its read action.
    pub(crate) fn metadata_without_read(target: ResourceId) -> TestMetadata {
        let mut meta = metadata();
        if let Some(resource) = meta.resources.get_mut(target.0) {
            resource.readable = false;
        }

        meta
    }

    /// Baseline schema with one resource moved to a different store.
    pub(crate) fn metadata_with_foreign_store(target: ResourceId) -> TestMetadata {
        let mut meta = metadata();
        if let Some(resource) = meta.resources.get_mut(target.0) {
            resource.store = REPLICA_STORE;
        }

        meta
    }
}

///
/// RecordingStore
///
/// Backing-store double: hands back canned rows and records every compiled
/// and executed query for assertions.
///

#[derive(Default)]
pub(crate) struct RecordingStore {
    rows: Vec<ResultRow>,
    reject: Option<String>,
    fail_compile: bool,
    fail_run: bool,
    pub(crate) compiled: RefCell<Vec<Query>>,
    pub(crate) executed: RefCell<Vec<NativeQuery>>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_rows(mut self, rows: Vec<ResultRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Reject the aggregate carrying this name at fold time.
    pub(crate) fn rejecting(mut self, name: impl Into<String>) -> Self {
        self.reject = Some(name.into());
        self
    }

    pub(crate) fn failing_compile(mut self) -> Self {
        self.fail_compile = true;
        self
    }

    pub(crate) fn failing_run(mut self) -> Self {
        self.fail_run = true;
        self
    }
}

impl DataStore for RecordingStore {
    fn compile(&self, query: &Query) -> Result<NativeQuery, ResolveError> {
        if self.fail_compile {
            return Err(ResolveError::compilation("malformed query"));
        }

        self.compiled.borrow_mut().push(query.clone());
        Ok(NativeQuery::new(query.clone()))
    }

    fn add_aggregate(
        &self,
        native: NativeQuery,
        aggregate: &crate::db::aggregate::Aggregate,
        _resource: ResourceId,
    ) -> Result<NativeQuery, ResolveError> {
        if self.reject.as_deref() == Some(aggregate.name()) {
            return Err(ResolveError::rejected(
                aggregate.name(),
                "shape not supported by this store",
            ));
        }

        Ok(native.with_aggregate(aggregate.clone()))
    }

    fn run_query(
        &self,
        native: NativeQuery,
        _resource: ResourceId,
    ) -> Result<Vec<ResultRow>, ResolveError> {
        if self.fail_run {
            return Err(ResolveError::execution("store unavailable"));
        }

        self.executed.borrow_mut().push(native);
        Ok(self.rows.clone())
    }
}

///
/// TestReverse
///
/// Reverse-path double keyed by (source resource, relationship name).
/// Unlisted relationships have no reverse path.
///

#[derive(Default)]
pub(crate) struct TestReverse {
    reverses: BTreeMap<(&'static str, String), RelationshipPath>,
}

impl TestReverse {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(
        mut self,
        source: ResourceId,
        name: &str,
        reverse: &[&str],
    ) -> Self {
        self.reverses
            .insert((source.0, name.to_string()), RelationshipPath::of(reverse));
        self
    }
}

impl ReversePathResolver for TestReverse {
    fn reverse_path(
        &self,
        descriptor: &RelationshipDescriptor,
        _remaining: &RelationshipPath,
    ) -> Result<RelationshipPath, ReversePathError> {
        self.reverses
            .get(&(descriptor.source().0, descriptor.name().to_string()))
            .cloned()
            .ok_or_else(|| ReversePathError {
                resource: descriptor.source(),
                relationship: descriptor.name().to_string(),
            })
    }
}

///
/// TestAuthorizer
///
/// Strict-check double producing a fixed filter and recording every query
/// it was asked about.
///

#[derive(Default)]
pub(crate) struct TestAuthorizer {
    filter: Option<Predicate>,
    fail: bool,
    pub(crate) seen: RefCell<Vec<(ResourceId, Query)>>,
}

impl TestAuthorizer {
    pub(crate) fn allowing(filter: Option<Predicate>) -> Self {
        Self {
            filter,
            fail: false,
            seen: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            filter: None,
            fail: true,
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl Authorizer for TestAuthorizer {
    fn strict_filter(
        &self,
        resource: ResourceId,
        query: &Query,
    ) -> Result<Option<Predicate>, ResolveError> {
        self.seen.borrow_mut().push((resource, query.clone()));
        if self.fail {
            return Err(ResolveError::execution("policy evaluation failed"));
        }

        Ok(self.filter.clone())
    }
}
