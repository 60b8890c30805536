//! Phase-organized metrics for the ETL run.
//!
//! Each pipeline phase owns its metric names in a dedicated submodule. The
//! Prometheus recorder is installed without an HTTP listener: a batch run
//! renders one snapshot to disk when it finishes.

pub mod discovery;
pub mod normalize;
pub mod output;
pub mod registry;

pub use discovery::DiscoveryMetrics;
pub use normalize::NormalizeMetrics;
pub use output::OutputMetrics;

use std::fs;
use std::path::Path;
use std::sync::{Once, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{debug, warn};

use crate::error::Result;

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the recorder and describe every phase metric. Idempotent.
pub fn init_metrics() {
    INIT.call_once(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = HANDLE.set(handle);
            registry::register_all_metrics();
        }
        Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
    });
}

/// Current metrics in Prometheus text format, if a recorder is installed.
pub fn render() -> Option<String> {
    HANDLE.get().map(PrometheusHandle::render)
}

/// Write the current snapshot to `path`. Returns `false` when metrics were
/// never initialized.
pub fn write_snapshot(path: &Path) -> Result<bool> {
    match render() {
        Some(text) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, text)?;
            debug!(path = %path.display(), "metrics snapshot written");
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Implemented by each phase so names and help text live next to the code
/// that records them.
pub trait PhaseMetrics {
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
    Gauge,
}

/// Naming convention: etl_{phase}_{name}[_total]
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name)
    };
    (gauge, $phase:literal, $name:literal) => {
        concat!("etl_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
