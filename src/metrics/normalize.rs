//! Normalization phase metrics: files read, rows kept and rows discarded.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct NormalizeMetrics;

impl NormalizeMetrics {
    pub fn record_file_processed(rows_kept: usize, rows_dropped: usize) {
        ::metrics::counter!(phase_metric!(counter, "normalize", "files_processed")).increment(1);
        ::metrics::counter!(phase_metric!(counter, "normalize", "rows_kept")).increment(rows_kept as u64);
        ::metrics::counter!(phase_metric!(counter, "normalize", "rows_dropped"))
            .increment(rows_dropped as u64);
    }

    pub fn record_file_skipped(kind: &'static str) {
        ::metrics::counter!(phase_metric!(counter, "normalize", "files_skipped"), "kind" => kind).increment(1);
    }

    pub fn record_registry_loaded(operators: usize) {
        ::metrics::gauge!(phase_metric!(gauge, "normalize", "registry_operators")).set(operators as f64);
    }

    pub fn record_unmatched(records: usize) {
        ::metrics::counter!(phase_metric!(counter, "normalize", "unmatched_records"))
            .increment(records as u64);
    }
}

impl PhaseMetrics for NormalizeMetrics {
    fn register_metrics() {
        for doc in Self::metrics_documentation() {
            match doc.metric_type {
                MetricType::Counter => ::metrics::describe_counter!(doc.name, doc.help),
                MetricType::Histogram => ::metrics::describe_histogram!(doc.name, doc.help),
                MetricType::Gauge => ::metrics::describe_gauge!(doc.name, doc.help),
            }
        }
    }

    fn phase_name() -> &'static str {
        "normalize"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "normalize", "files_processed"),
                metric_type: MetricType::Counter,
                help: "Quarterly files normalized successfully",
            },
            MetricDoc {
                name: phase_metric!(counter, "normalize", "files_skipped"),
                metric_type: MetricType::Counter,
                help: "Quarterly files excluded after a schema, parse or read failure",
            },
            MetricDoc {
                name: phase_metric!(counter, "normalize", "rows_kept"),
                metric_type: MetricType::Counter,
                help: "Quarterly rows that passed validation",
            },
            MetricDoc {
                name: phase_metric!(counter, "normalize", "rows_dropped"),
                metric_type: MetricType::Counter,
                help: "Quarterly rows discarded for an empty id or unparseable amount",
            },
            MetricDoc {
                name: phase_metric!(gauge, "normalize", "registry_operators"),
                metric_type: MetricType::Gauge,
                help: "Operators loaded from the registry",
            },
            MetricDoc {
                name: phase_metric!(counter, "normalize", "unmatched_records"),
                metric_type: MetricType::Counter,
                help: "Quarterly records with no registry match",
            },
        ]
    }
}
