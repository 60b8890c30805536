//! Machine-readable summary of a run, written next to the outputs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::domain::QuarterArchiveRef;
use crate::error::Result;
use crate::pipeline::processing::SkippedFile;

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub command: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub archives: Vec<QuarterArchiveRef>,
    pub processed_files: Vec<PathBuf>,
    pub skipped_files: Vec<SkippedFile>,
    pub counts: RecordCounts,
    pub outputs: Vec<OutputFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounts {
    pub quarterly_records: usize,
    pub dropped_rows: usize,
    pub unmatched_records: usize,
    pub aggregated_groups: usize,
}

/// A written file with its size and content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputFile {
    pub path: PathBuf,
    pub bytes: u64,
    pub sha256: String,
}

impl OutputFile {
    pub fn describe(path: &Path) -> Result<Self> {
        let content = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&content);
        Ok(Self {
            path: path.to_path_buf(),
            bytes: content.len() as u64,
            sha256: hex::encode(hasher.finalize()),
        })
    }
}

impl RunManifest {
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!(path = %path.display(), outputs = self.outputs.len(), "run manifest written");
        Ok(())
    }
}
