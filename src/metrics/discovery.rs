//! Discovery phase metrics: directory listings walked and archives selected.

use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct DiscoveryMetrics;

impl DiscoveryMetrics {
    pub fn record_listing_fetched() {
        ::metrics::counter!(phase_metric!(counter, "discovery", "listings_fetched")).increment(1);
    }

    pub fn record_selection(archives: usize) {
        ::metrics::gauge!(phase_metric!(gauge, "discovery", "archives_selected")).set(archives as f64);
    }

    pub fn record_archive_downloaded(bytes: u64) {
        ::metrics::counter!(phase_metric!(counter, "discovery", "archives_downloaded")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "discovery", "archive_bytes")).record(bytes as f64);
    }

    pub fn record_registry_download(skipped: bool) {
        let outcome = if skipped { "cached" } else { "downloaded" };
        ::metrics::counter!(phase_metric!(counter, "discovery", "registry_fetches"), "outcome" => outcome)
            .increment(1);
    }
}

impl PhaseMetrics for DiscoveryMetrics {
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
        "discovery"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        vec![
            MetricDoc {
                name: phase_metric!(counter, "discovery", "listings_fetched"),
                metric_type: MetricType::Counter,
                help: "Directory listing pages fetched from the portal",
            },
            MetricDoc {
                name: phase_metric!(gauge, "discovery", "archives_selected"),
                metric_type: MetricType::Gauge,
                help: "Quarterly archives selected in the last discovery",
            },
            MetricDoc {
                name: phase_metric!(counter, "discovery", "archives_downloaded"),
                metric_type: MetricType::Counter,
                help: "Quarterly archives downloaded",
            },
            MetricDoc {
                name: phase_metric!(histogram, "discovery", "archive_bytes"),
                metric_type: MetricType::Histogram,
                help: "Size of downloaded quarterly archives in bytes",
            },
            MetricDoc {
                name: phase_metric!(counter, "discovery", "registry_fetches"),
                metric_type: MetricType::Counter,
                help: "Registry file resolutions, labelled downloaded or cached",
            },
        ]
    }
}
