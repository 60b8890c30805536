use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::app::ports::HttpClientPort;
use crate::config::EtlConfig;
use crate::domain::QuarterArchiveRef;
use crate::error::{EtlError, Result};
use crate::infra::archive::extract_archive;
use crate::metrics::DiscoveryMetrics;
use crate::pipeline::ingestion::listing::href_file_name;

/// Download one quarterly archive into `raw_dir/zips/` and extract it into
/// `raw_dir/<archive stem>/`. Returns the extraction directory.
#[instrument(skip(http, config), fields(period = %archive.period()))]
pub fn download_and_extract<H: HttpClientPort>(
    http: &H,
    archive: &QuarterArchiveRef,
    config: &EtlConfig,
) -> Result<PathBuf> {
    let file_name = href_file_name(&archive.url);
    let zip_path = config.archive_download_dir().join(file_name);

    info!(url = %archive.url, "downloading quarterly archive");
    let bytes = http.download(&archive.url, &zip_path, config.download_timeout())?;
    DiscoveryMetrics::record_archive_downloaded(bytes);

    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| archive.period().to_string());
    let extract_dir = config.raw_dir.join(stem);
    let entries = extract_archive(&zip_path, &extract_dir)?;
    info!(dir = %extract_dir.display(), entries, bytes, "archive extracted");

    Ok(extract_dir)
}

/// Make sure the registry CSV is on disk. An existing file is reused as-is;
/// returns the path and whether a download happened.
pub fn ensure_registry<H: HttpClientPort>(http: &H, config: &EtlConfig) -> Result<(PathBuf, bool)> {
    let dest = config.registry_path();
    if dest.exists() {
        info!(path = %dest.display(), "registry already present, skipping download");
        DiscoveryMetrics::record_registry_download(true);
        return Ok((dest, false));
    }

    info!(url = %config.registry_url, "downloading operator registry");
    http.download(&config.registry_url, &dest, config.download_timeout())?;
    DiscoveryMetrics::record_registry_download(false);
    Ok((dest, true))
}

/// `*.csv` files directly inside each directory, sorted by name within a
/// directory. Finding none at all is fatal.
pub fn collect_quarter_csvs(dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut csvs = Vec::new();
    for dir in dirs {
        let mut found: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().map_or(false, |ext| ext == "csv"))
            .collect();
        found.sort();
        csvs.extend(found);
    }

    if csvs.is_empty() {
        return Err(EtlError::NoData(
            "no quarterly CSV found after extraction".to_string(),
        ));
    }
    Ok(csvs)
}
