use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::{EtlError, Result};

const DEFAULT_DIRECTIVE: &str = "ans_etl=info";
const LOG_FILE_PREFIX: &str = "etl.log";

/// Initializes console output plus a daily-rotated JSON log file under
/// `log_dir`. Keep the returned guard alive until exit so buffered lines get
/// flushed. An unusable `log_dir` is an error, not a panic.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard> {
    fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(log_dir)
        .map_err(|e| EtlError::Config(format!("cannot open log file in '{}': {}", log_dir.display(), e)))?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| EtlError::Config(format!("cannot install log subscriber: {}", e)))?;

    Ok(guard)
}
