//! Planner placement and node-emission behavior.

use super::*;
use crate::{
    db::{
        query::{Direction, Predicate},
        schedule::{DependencySnapshot, NodeValue},
    },
    test_support::schema::TAG,
    value::Value,
};

#[test]
fn aggregates_sharing_a_path_plan_into_one_group() {
    let env = TestEnv::new().with_authorizer(TestAuthorizer::allowing(None));
    let query = Query::new(POST)
        .with_aggregate(comment_count(&env.metadata))
        .with_aggregate(rating_sum(&env.metadata));

    let plan = env.plan(&query);

    assert_eq!(plan.authorization_nodes().len(), 1);
    assert_eq!(plan.value_nodes().len(), 1);
    assert!(plan.in_query().is_empty());

    let rel_path = RelationshipPath::of(&["comments"]);
    let value_node = &plan.value_nodes()[0];
    assert_eq!(value_node.path(), &NodePath::aggregate_values(&rel_path));
    assert_eq!(
        value_node.dependencies(),
        &[records_path(), NodePath::aggregate_auth(&rel_path)]
    );

    let auth_node = &plan.authorization_nodes()[0];
    assert_eq!(auth_node.path(), &NodePath::aggregate_auth(&rel_path));
    assert_eq!(auth_node.dependencies(), &[primary_filter_path()]);
    assert!(auth_node.is_synchronous());
    assert!(!value_node.is_synchronous());
}

#[test]
fn distinct_paths_plan_into_distinct_groups() {
    let env = TestEnv::new();
    let query = Query::new(POST)
        .with_aggregate(comment_count(&env.metadata))
        .with_aggregate(tag_count(&env.metadata));

    let plan = env.plan(&query);

    assert_eq!(plan.value_nodes().len(), 2);
    assert_ne!(plan.value_nodes()[0].path(), plan.value_nodes()[1].path());
}

#[test]
fn referenced_group_embeds_in_query_when_possible() {
    let env = TestEnv::new()
        .with_authorizer(TestAuthorizer::allowing(None))
        .in_query_possible();
    let query = Query::new(POST)
        .with_aggregate(comment_count(&env.metadata))
        .with_aggregate(rating_sum(&env.metadata))
        .with_filter(Predicate::gt("comment_count", Value::Uint(3)));

    let plan = env.plan(&query);

    // One referenced member embeds the whole group; the authorization node
    // is still emitted for the primary fetch to consume.
    assert_eq!(plan.in_query().len(), 2);
    assert!(plan.value_nodes().is_empty());
    assert_eq!(plan.authorization_nodes().len(), 1);
}

#[test]
fn sort_references_also_enable_in_query_placement() {
    let env = TestEnv::new().in_query_possible();
    let query = Query::new(POST)
        .with_aggregate(comment_count(&env.metadata))
        .with_sort("comment_count", Direction::Desc);

    let plan = env.plan(&query);

    assert_eq!(plan.in_query().len(), 1);
    assert!(plan.value_nodes().is_empty());
}

#[test]
fn unreferenced_group_stays_out_of_query() {
    let env = TestEnv::new().in_query_possible();
    let query = Query::new(POST).with_aggregate(comment_count(&env.metadata));

    let plan = env.plan(&query);

    assert!(plan.in_query().is_empty());
    assert_eq!(plan.value_nodes().len(), 1);
}

#[test]
fn failed_reverse_lookup_forces_out_of_query() {
    // Structurally possible and referenced, but no reverse path exists.
    let env = TestEnv::new().with_reverse(TestReverse::new()).in_query_possible();
    let query = Query::new(POST)
        .with_aggregate(comment_count(&env.metadata))
        .with_filter(Predicate::gt("comment_count", Value::Uint(0)));

    let plan = env.plan(&query);

    assert!(plan.in_query().is_empty());
    assert_eq!(plan.value_nodes().len(), 1);
}

#[test]
fn inactive_authorization_emits_no_auth_nodes() {
    let env = TestEnv::new();
    let query = Query::new(POST).with_aggregate(comment_count(&env.metadata));

    let plan = env.plan(&query);

    assert!(plan.authorization_nodes().is_empty());
    assert_eq!(plan.value_nodes()[0].dependencies(), &[records_path()]);
}

#[test]
fn auth_node_scopes_the_primary_filter_through_the_reverse_path() {
    let authorizer = Rc::new(TestAuthorizer::allowing(None));
    let mut env = TestEnv::new();
    env.authorizer = Some(Rc::clone(&authorizer));
    let query = Query::new(POST).with_aggregate(comment_count(&env.metadata));

    let plan = env.plan(&query);
    let nodes = plan.into_nodes();
    let auth_node = nodes
        .into_iter()
        .find(|node| node.is_synchronous())
        .expect("auth node");

    let primary = Predicate::eq("title", Value::Text("hello".to_string()));
    let mut seed = DependencySnapshot::new();
    seed.insert(primary_filter_path(), NodeValue::Filter(Some(primary.clone())));

    auth_node.resolve(&seed).unwrap();

    let seen = authorizer.seen.borrow();
    let (resource, derived) = &seen[0];
    assert_eq!(*resource, crate::test_support::schema::COMMENT);
    assert_eq!(
        derived.filter(),
        Some(&Predicate::related(RelationshipPath::of(&["post"]), primary))
    );
}

#[test]
fn auth_node_passes_a_bare_query_when_no_filter_resolved() {
    let authorizer = Rc::new(TestAuthorizer::allowing(None));
    let mut env = TestEnv::new();
    env.authorizer = Some(Rc::clone(&authorizer));
    let query = Query::new(POST).with_aggregate(tag_count(&env.metadata));

    let plan = env.plan(&query);
    let nodes = plan.into_nodes();
    let auth_node = nodes
        .into_iter()
        .find(|node| node.is_synchronous())
        .expect("auth node");

    let mut seed = DependencySnapshot::new();
    seed.insert(primary_filter_path(), NodeValue::Filter(None));

    auth_node.resolve(&seed).unwrap();

    let seen = authorizer.seen.borrow();
    let (resource, derived) = &seen[0];
    assert_eq!(*resource, TAG);
    assert!(derived.filter().is_none());
}
