//! Aggregate planning and resolution test suite.

mod planner;

use crate::{
    db::{
        aggregate::{Aggregate, AggregateBuilder, AggregateKind, Authorizer, PlanContext, plan},
        query::Query,
        schedule::NodePath,
        store::DataStore,
    },
    model::RelationshipPath,
    test_support::{
        RecordingStore, TestAuthorizer, TestReverse,
        schema::{self, POST, TestMetadata},
    },
};
use std::rc::Rc;

fn records_path() -> NodePath {
    NodePath::of(&["fetch-data"])
}

fn primary_filter_path() -> NodePath {
    NodePath::of(&["fetch-filter"])
}

fn comment_count(meta: &TestMetadata) -> Aggregate {
    AggregateBuilder::new(POST, "comment_count", AggregateKind::Count)
        .path(RelationshipPath::of(&["comments"]))
        .build(meta, meta)
        .unwrap()
}

fn rating_sum(meta: &TestMetadata) -> Aggregate {
    AggregateBuilder::new(POST, "rating_sum", AggregateKind::Sum)
        .path(RelationshipPath::of(&["comments"]))
        .field("rating")
        .build(meta, meta)
        .unwrap()
}

fn tag_count(meta: &TestMetadata) -> Aggregate {
    AggregateBuilder::new(POST, "tag_count", AggregateKind::Count)
        .path(RelationshipPath::of(&["tags"]))
        .build(meta, meta)
        .unwrap()
}

/// Reverse resolver knowing the baseline schema's first hops.
fn reverse_for_schema() -> TestReverse {
    TestReverse::new()
        .with(POST, "comments", &["post"])
        .with(POST, "tags", &["posts"])
}

struct TestEnv {
    metadata: TestMetadata,
    reverse: TestReverse,
    authorizer: Option<Rc<TestAuthorizer>>,
    store: Rc<RecordingStore>,
    in_query_possible: bool,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            metadata: schema::metadata(),
            reverse: reverse_for_schema(),
            authorizer: None,
            store: Rc::new(RecordingStore::new()),
            in_query_possible: false,
        }
    }

    fn with_store(mut self, store: RecordingStore) -> Self {
        self.store = Rc::new(store);
        self
    }

    fn with_authorizer(mut self, authorizer: TestAuthorizer) -> Self {
        self.authorizer = Some(Rc::new(authorizer));
        self
    }

    fn with_reverse(mut self, reverse: TestReverse) -> Self {
        self.reverse = reverse;
        self
    }

    fn in_query_possible(mut self) -> Self {
        self.in_query_possible = true;
        self
    }

    fn ctx(&self) -> PlanContext<'_> {
        PlanContext {
            metadata: &self.metadata,
            reverse: &self.reverse,
            authorizer: self
                .authorizer
                .as_ref()
                .map(|authorizer| Rc::clone(authorizer) as Rc<dyn Authorizer>),
            store: Rc::clone(&self.store) as Rc<dyn DataStore>,
            records_path: records_path(),
            primary_filter_path: primary_filter_path(),
            in_query_possible: self.in_query_possible,
        }
    }

    fn plan(&self, query: &Query) -> crate::db::aggregate::AggregatePlan {
        plan(query, &self.ctx())
    }
}
