//! Metrics sink boundary.
//!
//! Query logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::{db::source::SourceKind, obs::metrics};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// MaterializeKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MaterializeKind {
    Enumerate,
    Size,
    RoughSize,
    IsEmpty,
    IndexOf,
    First,
    ElementAt,
}

///
/// MutationKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MutationKind {
    Add,
    Remove,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    Materialize {
        kind: MaterializeKind,
        shape: SourceKind,
        entity_path: &'static str,
    },
    BruteForceCount {
        entity_path: &'static str,
        rows: u64,
    },
    SlowElementAccess {
        entity_path: &'static str,
        index: u64,
    },
    Mutation {
        kind: MutationKind,
        entity_path: &'static str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default process-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        match event {
            MetricsEvent::Materialize {
                shape, entity_path, ..
            } => {
                metrics::with_state_mut(|m| {
                    match shape {
                        SourceKind::Native => {
                            m.ops.native_materializations =
                                m.ops.native_materializations.saturating_add(1);
                        }
                        SourceKind::AdHoc => {
                            m.ops.ad_hoc_materializations =
                                m.ops.ad_hoc_materializations.saturating_add(1);
                        }
                    }

                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.materializations = entry.materializations.saturating_add(1);
                });
            }

            MetricsEvent::BruteForceCount { entity_path, rows } => {
                metrics::with_state_mut(|m| {
                    m.ops.brute_force_counts = m.ops.brute_force_counts.saturating_add(1);
                    m.ops.brute_force_rows = m.ops.brute_force_rows.saturating_add(rows);

                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    entry.brute_force_counts = entry.brute_force_counts.saturating_add(1);
                });
            }

            MetricsEvent::SlowElementAccess { .. } => {
                metrics::with_state_mut(|m| {
                    m.ops.slow_element_accesses = m.ops.slow_element_accesses.saturating_add(1);
                });
            }

            MetricsEvent::Mutation { kind, entity_path } => {
                metrics::with_state_mut(|m| {
                    let entry = m.entities.entry(entity_path.to_string()).or_default();
                    match kind {
                        MutationKind::Add => {
                            m.ops.link_adds = m.ops.link_adds.saturating_add(1);
                            entry.link_adds = entry.link_adds.saturating_add(1);
                        }
                        MutationKind::Remove => {
                            m.ops.link_removes = m.ops.link_removes.saturating_add(1);
                            entry.link_removes = entry.link_removes.saturating_add(1);
                        }
                    }
                });
            }
        }
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
/// The previous sink is restored on every exit, including unwind.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CaptureSink {
        events: RefCell<Vec<MetricsEvent>>,
    }

    impl MetricsSink for CaptureSink {
        fn record(&self, event: MetricsEvent) {
            self.events.borrow_mut().push(event);
        }
    }

    #[test]
    fn override_captures_events_and_restores_global_sink() {
        metrics_reset_all();
        let capture = Rc::new(CaptureSink::default());

        with_metrics_sink(capture.clone(), || {
            record(MetricsEvent::BruteForceCount {
                entity_path: "obs::Entity",
                rows: 3,
            });
        });

        assert_eq!(capture.events.borrow().len(), 1);
        assert_eq!(metrics_report().ops.brute_force_counts, 0);

        record(MetricsEvent::BruteForceCount {
            entity_path: "obs::Entity",
            rows: 3,
        });
        let report = metrics_report();
        assert_eq!(report.ops.brute_force_counts, 1);
        assert_eq!(report.ops.brute_force_rows, 3);
        assert_eq!(report.entities["obs::Entity"].brute_force_counts, 1);
    }

    #[test]
    fn global_sink_splits_materializations_by_shape() {
        metrics_reset_all();
        for shape in [SourceKind::Native, SourceKind::AdHoc, SourceKind::Native] {
            record(MetricsEvent::Materialize {
                kind: MaterializeKind::Size,
                shape,
                entity_path: "obs::Entity",
            });
        }

        let report = metrics_report();
        assert_eq!(report.ops.native_materializations, 2);
        assert_eq!(report.ops.ad_hoc_materializations, 1);
        assert_eq!(report.entities["obs::Entity"].materializations, 3);
    }

    #[test]
    fn report_serializes_to_json() {
        metrics_reset_all();
        record(MetricsEvent::Mutation {
            kind: MutationKind::Add,
            entity_path: "obs::Entity",
        });

        let json = serde_json::to_value(metrics_report()).expect("serialize report");
        assert_eq!(json["ops"]["link_adds"], 1);
        assert_eq!(json["entities"]["obs::Entity"]["link_adds"], 1);
    }
}
