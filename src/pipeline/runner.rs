use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::app::ports::HttpClientPort;
use crate::config::EtlConfig;
use crate::constants::{DETAIL_ARCHIVE_NAME, MANIFEST_FILE_NAME, METRICS_FILE_NAME};
use crate::domain::QuarterArchiveRef;
use crate::error::Result;
use crate::pipeline::ingestion::{collect_quarter_csvs, download_and_extract, ensure_registry, QuarterSelector};
use crate::pipeline::manifest::{OutputFile, RecordCounts, RunManifest};
use crate::pipeline::output::{archive_output, write_aggregated_csv, write_detail_csv};
use crate::pipeline::processing::normalize::load_registry;
use crate::pipeline::processing::{aggregate, consolidate_files, enrich, enriched_from_table, RawTable};

/// Drives the ETL stages in order. Every command ends with the outputs,
/// a metrics snapshot and the run manifest in `processed_dir`.
pub struct Pipeline<H: HttpClientPort> {
    config: EtlConfig,
    http: H,
}

impl<H: HttpClientPort> Pipeline<H> {
    pub fn new(config: EtlConfig, http: H) -> Self {
        Self { config, http }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Most recent quarterly archives on the portal.
    pub fn discover(&self) -> Result<Vec<QuarterArchiveRef>> {
        QuarterSelector::from_config(&self.http, &self.config).select_recent_quarters(&self.config.base_listing_url)
    }

    /// Full run: discovery, downloads, extraction, then [`Pipeline::transform`].
    #[instrument(skip(self))]
    pub fn run(&self) -> Result<RunManifest> {
        let started = Instant::now();
        let started_at = Utc::now();
        info!(base = %self.config.base_listing_url, "starting ETL run");

        let archives = self.discover()?;
        info!(selected = archives.len(), "quarterly archives selected");

        let dirs = archives
            .iter()
            .map(|archive| download_and_extract(&self.http, archive, &self.config))
            .collect::<Result<Vec<PathBuf>>>()?;
        let csvs = collect_quarter_csvs(&dirs)?;
        let (registry, _) = ensure_registry(&self.http, &self.config)?;

        let mut manifest = self.transform_files("run", &csvs, &registry)?;
        manifest.started_at = started_at;
        manifest.archives = archives;
        self.finish(&mut manifest)?;
        info!(elapsed_secs = started.elapsed().as_secs_f64(), "ETL run finished");
        Ok(manifest)
    }

    /// Normalize, consolidate, enrich and aggregate local files.
    #[instrument(skip(self, quarterly), fields(files = quarterly.len()))]
    pub fn transform(&self, quarterly: &[PathBuf], registry: &Path) -> Result<RunManifest> {
        let mut manifest = self.transform_files("transform", quarterly, registry)?;
        self.finish(&mut manifest)?;
        Ok(manifest)
    }

    /// Re-aggregate a consolidated detail file written by an earlier run.
    #[instrument(skip(self))]
    pub fn aggregate_file(&self, input: &Path) -> Result<RunManifest> {
        let started_at = Utc::now();
        let table = RawTable::read_path(input)?;
        let enriched = enriched_from_table(&table)?;
        let aggregated = aggregate(&enriched);

        let out_dir = &self.config.processed_dir;
        let report = write_aggregated_csv(out_dir, &aggregated)?;
        let report_zip = archive_output(&report, &self.config.aggregated_archive_name)?;

        let mut manifest = RunManifest {
            command: "aggregate".to_string(),
            started_at,
            finished_at: started_at,
            archives: Vec::new(),
            processed_files: vec![input.to_path_buf()],
            skipped_files: Vec::new(),
            counts: RecordCounts {
                quarterly_records: enriched.len(),
                dropped_rows: 0,
                unmatched_records: enriched.iter().filter(|r| !r.is_matched()).count(),
                aggregated_groups: aggregated.len(),
            },
            outputs: describe_all(&[report, report_zip])?,
        };
        self.finish(&mut manifest)?;
        Ok(manifest)
    }

    fn transform_files(&self, command: &str, quarterly: &[PathBuf], registry: &Path) -> Result<RunManifest> {
        let started_at = Utc::now();
        let consolidated = consolidate_files(quarterly)?;
        let operators = load_registry(registry)?;
        let enriched = enrich(&consolidated.records, &operators);
        let aggregated = aggregate(&enriched);

        let out_dir = &self.config.processed_dir;
        fs::create_dir_all(out_dir)?;
        let detail = write_detail_csv(out_dir, &enriched)?;
        let detail_zip = archive_output(&detail, DETAIL_ARCHIVE_NAME)?;
        let report = write_aggregated_csv(out_dir, &aggregated)?;
        let report_zip = archive_output(&report, &self.config.aggregated_archive_name)?;

        let unmatched = enriched.iter().filter(|r| !r.is_matched()).count();
        if unmatched > 0 {
            warn!(unmatched, "quarterly records without a registry match");
        }

        Ok(RunManifest {
            command: command.to_string(),
            started_at,
            finished_at: started_at,
            archives: Vec::new(),
            processed_files: consolidated.processed_files,
            skipped_files: consolidated.skipped_files,
            counts: RecordCounts {
                quarterly_records: enriched.len(),
                dropped_rows: consolidated.dropped_rows,
                unmatched_records: unmatched,
                aggregated_groups: aggregated.len(),
            },
            outputs: describe_all(&[detail, detail_zip, report, report_zip])?,
        })
    }

    fn finish(&self, manifest: &mut RunManifest) -> Result<()> {
        let metrics_path = self.config.processed_dir.join(METRICS_FILE_NAME);
        if crate::metrics::write_snapshot(&metrics_path)? {
            manifest.outputs.push(OutputFile::describe(&metrics_path)?);
        }
        manifest.finished_at = Utc::now();
        manifest.write(&self.config.processed_dir.join(MANIFEST_FILE_NAME))
    }
}

fn describe_all(paths: &[PathBuf]) -> Result<Vec<OutputFile>> {
    paths.iter().map(|p| OutputFile::describe(p)).collect()
}
