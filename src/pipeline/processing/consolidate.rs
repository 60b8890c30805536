use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::QuarterlyRecord;
use crate::error::{EtlError, QuarterFileError, Result};
use crate::metrics::NormalizeMetrics;
use crate::pipeline::processing::normalize::{load_quarter_file, NormalizedQuarter};

/// All usable quarterly records plus bookkeeping about what was left out.
#[derive(Debug, Clone, PartialEq)]
pub struct Consolidated {
    pub records: Vec<QuarterlyRecord>,
    pub processed_files: Vec<PathBuf>,
    pub skipped_files: Vec<SkippedFile>,
    pub dropped_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Union the per-file results in order. A failed file is logged and left
/// out; the run only fails when no file contributes a single record.
pub fn consolidate(
    per_file: Vec<(PathBuf, std::result::Result<NormalizedQuarter, QuarterFileError>)>,
) -> Result<Consolidated> {
    let mut consolidated = Consolidated {
        records: Vec::new(),
        processed_files: Vec::new(),
        skipped_files: Vec::new(),
        dropped_rows: 0,
    };

    for (path, outcome) in per_file {
        match outcome {
            Ok(quarter) => {
                info!(
                    file = %display_name(&path),
                    period = %quarter.period,
                    kept = quarter.records.len(),
                    dropped = quarter.dropped,
                    "quarterly file normalized"
                );
                if quarter.dropped > 0 {
                    warn!(file = %display_name(&path), dropped = quarter.dropped, "rows discarded");
                }
                NormalizeMetrics::record_file_processed(quarter.records.len(), quarter.dropped);
                consolidated.dropped_rows += quarter.dropped;
                consolidated.records.extend(quarter.records);
                consolidated.processed_files.push(path);
            }
            Err(e) => {
                warn!(file = %display_name(&path), kind = e.kind(), error = %e, "skipping quarterly file");
                NormalizeMetrics::record_file_skipped(e.kind());
                consolidated.skipped_files.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    if consolidated.records.is_empty() {
        return Err(EtlError::NoData(
            "no valid quarterly CSV was processed".to_string(),
        ));
    }

    info!(
        records = consolidated.records.len(),
        files = consolidated.processed_files.len(),
        skipped = consolidated.skipped_files.len(),
        "quarters consolidated"
    );
    Ok(consolidated)
}

/// Load every file and consolidate the results.
pub fn consolidate_files(paths: &[PathBuf]) -> Result<Consolidated> {
    let per_file = paths
        .iter()
        .map(|path| (path.clone(), load_quarter_file(path)))
        .collect();
    consolidate(per_file)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
