// ETL pipeline: ingestion, processing, outputs and the run driver

pub mod ingestion;
pub mod manifest;
pub mod output;
pub mod processing;
pub mod runner;

pub use manifest::{OutputFile, RecordCounts, RunManifest};
pub use runner::Pipeline;
