//! Observability: planner/resolver telemetry and sink abstractions.
//!
//! Core logic never touches metrics state directly; everything flows
//! through `sink::record`.

pub(crate) mod metrics;
pub(crate) mod sink;

pub use metrics::EventReport;
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset, with_sink};
