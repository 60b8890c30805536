//! Registers every phase's metrics and flags duplicate names.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::metrics::{DiscoveryMetrics, MetricDoc, NormalizeMetrics, OutputMetrics, PhaseMetrics};

pub fn register_all_metrics() {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<DiscoveryMetrics>(&mut all_metrics);
    register_phase_metrics::<NormalizeMetrics>(&mut all_metrics);
    register_phase_metrics::<OutputMetrics>(&mut all_metrics);

    debug!("Registered {} metrics across all phases", all_metrics.len());
}

fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<&'static str, (&'static str, MetricDoc)>) {
    T::register_metrics();
    let phase = T::phase_name();

    for doc in T::metrics_documentation() {
        if let Some((owner, _)) = all_metrics.get(doc.name) {
            warn!(
                "Metric name conflict: '{}' is defined by both '{}' and '{}'",
                doc.name, owner, phase
            );
        } else {
            all_metrics.insert(doc.name, (phase, doc));
        }
    }
}
