//! Module: db::aggregate::resolver
//! Responsibility: the deferred computation bound to a value node — build
//! the secondary aggregate query, execute it, reduce rows to per-owner
//! values.
//! Does not own: placement decisions or dependency ordering.
//! Boundary: runs only once its group's dependencies hold values; failure
//! here is terminal for the group, not the plan.

use crate::{
    db::{
        aggregate::{Aggregate, ResolveError},
        query::{Predicate, Query, QueryPart},
        store::{AggregateValueMap, DataStore, Record},
    },
    model::ResourceId,
    obs::sink::{MetricsEvent, record},
};

///
/// GroupResolveInputs
///
/// Everything the planner fixed for one aggregate group at plan time. The
/// owning records and the authorization filter arrive later, through the
/// dependency snapshot.
///

#[derive(Clone, Debug)]
pub(crate) struct GroupResolveInputs {
    pub owner_resource: ResourceId,
    pub owner_pkey: Vec<String>,
    pub base_query: Query,
    pub aggregates: Vec<Aggregate>,
}

// Resolve one aggregate group against the backing store and reduce the
// result rows into a per-owner value map. Owners with no matching rows are
// omitted; defaults are the consumer's concern.
pub(crate) fn resolve_values(
    store: &dyn DataStore,
    inputs: &GroupResolveInputs,
    owners: &[Record],
) -> Result<AggregateValueMap, ResolveError> {
    if owners.is_empty() {
        return Ok(AggregateValueMap::new());
    }

    let bare = inputs.base_query.clone().clear(&[
        QueryPart::Filter,
        QueryPart::Sort,
        QueryPart::Aggregates,
        QueryPart::Load,
        QueryPart::Limit,
        QueryPart::Offset,
    ]);
    let scoped = bare.with_filter(owner_identity_filter(owners, &inputs.owner_pkey)?);

    let mut native = store.compile(&scoped)?;
    for aggregate in &inputs.aggregates {
        let mut shape = aggregate.clone();
        if let Some(sub_query) = shape.authorized_sub_query() {
            shape = shape.with_sub_query(sub_query);
        }
        native = store.add_aggregate(native, &shape, inputs.owner_resource)?;
    }

    let rows = store.run_query(native, inputs.owner_resource)?;

    let mut values = AggregateValueMap::new();
    for row in &rows {
        let entry = values.entry(row.owner_key().clone()).or_default();
        for (name, value) in row.values() {
            entry.insert(name.clone(), value.clone());
        }
        // Alias-loaded values bypassed the generic reduction path and win.
        for aggregate in &inputs.aggregates {
            let Some(alias) = aggregate.load_alias() else {
                continue;
            };
            if let Some(value) = row.loaded().get(alias) {
                entry.insert(aggregate.name().to_string(), value.clone());
            }
        }
    }

    record(MetricsEvent::AggregateResolve {
        resource: inputs.owner_resource,
        owners: owners.len() as u64,
        rows: rows.len() as u64,
        aggregates: inputs.aggregates.len() as u64,
    });

    Ok(values)
}

// Exact pkey equality for one owner, a disjunction of per-owner equality
// clauses for several.
fn owner_identity_filter(
    owners: &[Record],
    owner_pkey: &[String],
) -> Result<Predicate, ResolveError> {
    let mut clauses = owners
        .iter()
        .map(|record| owner_clause(record, owner_pkey))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(if clauses.len() == 1 {
        clauses.swap_remove(0)
    } else {
        Predicate::or(clauses)
    })
}

fn owner_clause(record: &Record, owner_pkey: &[String]) -> Result<Predicate, ResolveError> {
    let mut fields = owner_pkey
        .iter()
        .map(|field| {
            record
                .get(field)
                .map(|value| Predicate::eq(field.clone(), value.clone()))
                .ok_or_else(|| {
                    ResolveError::execution(format!(
                        "owning record is missing primary key field `{field}`"
                    ))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(if fields.len() == 1 {
        fields.swap_remove(0)
    } else {
        Predicate::and(fields)
    })
}
