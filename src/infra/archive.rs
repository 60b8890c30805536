use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{EtlError, Result};

/// Extract every entry of `archive_path` into `dest_dir`, creating it if
/// needed. Returns the number of entries in the archive.
pub fn extract_archive(archive_path: &Path, dest_dir: &Path) -> Result<usize> {
    fs::create_dir_all(dest_dir)?;
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;
    let entries = archive.len();
    archive.extract(dest_dir)?;
    debug!(archive = %archive_path.display(), dest = %dest_dir.display(), entries, "archive extracted");
    Ok(entries)
}

/// Write `sources` into a new deflate-compressed archive at `dest`. Entries
/// are stored under their bare file names.
pub fn create_archive(sources: &[PathBuf], dest: &Path) -> Result<PathBuf> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = ZipWriter::new(File::create(dest)?);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for source in sources {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                EtlError::Io(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("'{}' has no file name", source.display()),
                ))
            })?;
        writer.start_file(name, options)?;
        let mut input = File::open(source)?;
        io::copy(&mut input, &mut writer)?;
    }

    writer.finish()?;
    debug!(dest = %dest.display(), files = sources.len(), "archive written");
    Ok(dest.to_path_buf())
}
