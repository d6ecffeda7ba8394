//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Query code never touches metrics state directly; everything flows
//! through `MetricsEvent` and the active `MetricsSink`.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EntityCounters, EventOps, EventReport};
pub use sink::{
    MaterializeKind, MetricsEvent, MetricsSink, MutationKind, metrics_report, metrics_reset_all,
    with_metrics_sink,
};
