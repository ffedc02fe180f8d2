//! Metrics sink boundary.
//!
//! Planner and resolver logic MUST NOT depend on `obs::metrics` directly.
//! All instrumentation flows through `MetricsEvent` and `MetricsSink`; this
//! module is the only bridge to counter state.

use crate::{model::ResourceId, obs::metrics};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent {
    AggregatePlan {
        resource: ResourceId,
        groups: u64,
        in_query: u64,
        auth_nodes: u64,
        value_nodes: u64,
    },
    AggregateResolve {
        resource: ResourceId,
        owners: u64,
        rows: u64,
        aggregates: u64,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

// Default sink writing into process-local counter state.
struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::AggregatePlan { groups, .. } => metrics::record_plan(groups),
            MetricsEvent::AggregateResolve { rows, .. } => metrics::record_resolve(rows),
        }
    }
}

/// Record one instrumentation event through the active sink.
pub(crate) fn record(event: MetricsEvent) {
    let handled = SINK_OVERRIDE.with(|slot| {
        if let Some(sink) = slot.borrow().as_ref() {
            sink.record(event);
            return true;
        }

        false
    });

    if !handled {
        GlobalMetricsSink.record(event);
    }
}

/// Install `sink` for the duration of `f`, restoring the previous sink
/// afterwards. Test-facing.
pub fn with_sink<R>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> R) -> R {
    let previous = SINK_OVERRIDE.with(|slot| slot.borrow_mut().replace(sink));
    let result = f();
    SINK_OVERRIDE.with(|slot| {
        *slot.borrow_mut() = previous;
    });

    result
}

/// Current counter snapshot.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all counters. Test-facing.
pub fn metrics_reset() {
    metrics::reset();
}
