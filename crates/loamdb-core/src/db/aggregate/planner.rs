//! Module: db::aggregate::planner
//! Responsibility: group aggregates, decide in-query vs. out-of-query
//! placement, and emit authorization/value dependency nodes.
//! Does not own: node resolution order (scheduler) or row reduction
//! (resolver).
//! Boundary: planning is pure bookkeeping; no store or policy call happens
//! until a node resolves.

use crate::{
    db::{
        aggregate::{
            Aggregate, Authorizer, ReversePathResolver,
            resolver::{GroupResolveInputs, resolve_values},
        },
        query::{Predicate, Query},
        schedule::{DependencyNode, NodePath, NodeValue},
        store::DataStore,
    },
    model::{RelationshipPath, ResourceId, ResourceMetadata},
    obs::sink::{MetricsEvent, record},
};
use indexmap::IndexMap;
use std::rc::Rc;

///
/// PlanContext
///
/// Collaborators and placement inputs for one planning pass. The records
/// and primary-filter paths address values the primary fetch will publish;
/// neither holds a value while planning runs.
///

pub struct PlanContext<'a> {
    pub metadata: &'a dyn ResourceMetadata,
    pub reverse: &'a dyn ReversePathResolver,
    pub authorizer: Option<Rc<dyn Authorizer>>,
    pub store: Rc<dyn DataStore>,
    pub records_path: NodePath,
    pub primary_filter_path: NodePath,
    pub in_query_possible: bool,
}

///
/// AggregatePlan
///
/// Planner output: authorization nodes, value nodes, and the aggregates
/// the primary fetch should embed directly.
///

#[derive(Debug, Default)]
pub struct AggregatePlan {
    authorization_nodes: Vec<DependencyNode>,
    value_nodes: Vec<DependencyNode>,
    in_query: Vec<Aggregate>,
}

impl AggregatePlan {
    #[must_use]
    pub fn authorization_nodes(&self) -> &[DependencyNode] {
        &self.authorization_nodes
    }

    #[must_use]
    pub fn value_nodes(&self) -> &[DependencyNode] {
        &self.value_nodes
    }

    #[must_use]
    pub fn in_query(&self) -> &[Aggregate] {
        &self.in_query
    }

    /// All emitted nodes, authorization nodes first.
    #[must_use]
    pub fn into_nodes(self) -> Vec<DependencyNode> {
        let mut nodes = self.authorization_nodes;
        nodes.extend(self.value_nodes);
        nodes
    }
}

/// Plan every aggregate attached to `query`.
///
/// Aggregates sharing `(related resource, relationship path)` are planned
/// as one group: one authorization node (when authorization is active) and
/// one value node (unless the group is embedded in-query) serve the whole
/// group.
#[must_use]
pub fn plan(query: &Query, ctx: &PlanContext<'_>) -> AggregatePlan {
    if query.aggregates().is_empty() {
        return AggregatePlan::default();
    }

    let owner = query.resource();

    let mut groups: IndexMap<(ResourceId, RelationshipPath), Vec<Aggregate>> = IndexMap::new();
    for aggregate in query.aggregates() {
        groups
            .entry((
                aggregate.related_resource(),
                aggregate.relationship_path().clone(),
            ))
            .or_default()
            .push(aggregate.clone());
    }

    let group_count = groups.len() as u64;
    let mut plan = AggregatePlan::default();
    for ((related, rel_path), group) in groups {
        let reverse = reverse_for_group(ctx, owner, &rel_path);

        // In-query placement is an optimization, taken only when the query
        // already needs the value for filtering or ordering and the owner
        // constraint is expressible from the related side.
        let referenced = group
            .iter()
            .any(|aggregate| query.references(aggregate.name()));
        let place_in_query = ctx.in_query_possible && reverse.is_some() && referenced;

        let auth_path = ctx.authorizer.as_ref().map(|authorizer| {
            let path = NodePath::aggregate_auth(&rel_path);
            plan.authorization_nodes.push(authorization_node(
                path.clone(),
                ctx.primary_filter_path.clone(),
                Rc::clone(authorizer),
                related,
                reverse.clone(),
            ));
            path
        });

        if place_in_query {
            plan.in_query.extend(group);
        } else {
            plan.value_nodes
                .push(value_node(query, ctx, &rel_path, group, auth_path));
        }
    }

    record(MetricsEvent::AggregatePlan {
        resource: owner,
        groups: group_count,
        in_query: plan.in_query.len() as u64,
        auth_nodes: plan.authorization_nodes.len() as u64,
        value_nodes: plan.value_nodes.len() as u64,
    });

    plan
}

// Reverse path for a group: trivially empty for a local aggregate,
// otherwise delegated to the reverse-relationship collaborator for the
// first hop's descriptor and the remaining hops. A failed lookup means the
// primary fetch cannot express the owner constraint from the related side.
fn reverse_for_group(
    ctx: &PlanContext<'_>,
    owner: ResourceId,
    rel_path: &RelationshipPath,
) -> Option<RelationshipPath> {
    // A local aggregate already lives on the owner; its reverse is trivial.
    let Some((first, remaining)) = rel_path.split_first() else {
        return Some(RelationshipPath::default());
    };

    let descriptor = ctx.metadata.relationship(owner, first)?;
    ctx.reverse.reverse_path(&descriptor, &remaining).ok()
}

// Synchronous strict-check-only authorization node. Scoped to the related
// resource, with the primary fetch's filter carried over through the
// reverse path once that filter resolves.
fn authorization_node(
    path: NodePath,
    primary_filter_path: NodePath,
    authorizer: Rc<dyn Authorizer>,
    related: ResourceId,
    reverse: Option<RelationshipPath>,
) -> DependencyNode {
    let dependencies = vec![primary_filter_path.clone()];

    DependencyNode::new(
        path,
        dependencies,
        true,
        Box::new(move |snapshot| {
            let primary = snapshot.filter(&primary_filter_path)?.cloned();
            let scoped = match (&reverse, primary) {
                (Some(reverse), Some(expr)) if reverse.is_empty() => Some(expr),
                (Some(reverse), Some(expr)) => Some(Predicate::related(reverse.clone(), expr)),
                _ => None,
            };

            let mut derived = Query::new(related);
            if let Some(expr) = scoped {
                derived = derived.with_filter(expr);
            }
            let filter = authorizer.strict_filter(related, &derived)?;

            Ok(NodeValue::Filter(filter))
        }),
    )
}

// Out-of-query value node: depends on the owning records and, when present,
// on the group's resolved authorization filter. The resolver receives both
// through the snapshot; the sub-query is built only then.
fn value_node(
    query: &Query,
    ctx: &PlanContext<'_>,
    rel_path: &RelationshipPath,
    group: Vec<Aggregate>,
    auth_path: Option<NodePath>,
) -> DependencyNode {
    let mut dependencies = vec![ctx.records_path.clone()];
    if let Some(auth_path) = &auth_path {
        dependencies.push(auth_path.clone());
    }

    let store = Rc::clone(&ctx.store);
    let records_path = ctx.records_path.clone();
    let inputs = GroupResolveInputs {
        owner_resource: query.resource(),
        owner_pkey: ctx.metadata.primary_key(query.resource()),
        base_query: query.clone(),
        aggregates: group,
    };

    DependencyNode::new(
        NodePath::aggregate_values(rel_path),
        dependencies,
        false,
        Box::new(move |snapshot| {
            let mut inputs = inputs;
            let owners = snapshot.records(&records_path)?;
            if let Some(auth_path) = &auth_path {
                if let Some(filter) = snapshot.filter(auth_path)? {
                    for aggregate in &mut inputs.aggregates {
                        aggregate.set_authorization_filter(filter.clone());
                    }
                }
            }

            let values = resolve_values(store.as_ref(), &inputs, owners)?;

            Ok(NodeValue::Values(values))
        }),
    )
}
