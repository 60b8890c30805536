//! Output phase metrics.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct OutputMetrics;

impl OutputMetrics {
    pub fn record_file_written(bytes: u64) {
        ::metrics::counter!(phase_metric!(counter, "output", "files_written")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "output", "file_bytes")).record(bytes as f64);
    }

    pub fn record_groups(groups: usize) {
        ::metrics::gauge!(phase_metric!(gauge, "output", "aggregated_groups")).set(groups as f64);
    }
}

impl PhaseMetrics for OutputMetrics {
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
        "output"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "output", "files_written"),
                metric_type: MetricType::Counter,
                help: "CSV and archive files written",
            },
            MetricDoc {
                name: phase_metric!(histogram, "output", "file_bytes"),
                metric_type: MetricType::Histogram,
                help: "Size of written output files in bytes",
            },
            MetricDoc {
                name: phase_metric!(gauge, "output", "aggregated_groups"),
                metric_type: MetricType::Gauge,
                help: "Operator/region/quarter groups in the aggregated report",
            },
        ]
    }
}
