use std::path::Path;

use tracing::info;

use crate::constants::REGISTRY_COLUMNS;
use crate::domain::RegistryRecord;
use crate::error::{Result, SchemaError};
use crate::metrics::NormalizeMetrics;
use crate::pipeline::processing::table::{field, RawTable};

/// Read and normalize the registry file. Unlike a quarterly file, a bad
/// registry fails the run.
pub fn load_registry(path: &Path) -> Result<Vec<RegistryRecord>> {
    let table = RawTable::read_path(path)?;
    let records = normalize_registry(&table)?;
    NormalizeMetrics::record_registry_loaded(records.len());
    info!(path = %path.display(), operators = records.len(), "registry loaded");
    Ok(records)
}

/// Validate the CADOP columns and emit one trimmed [`RegistryRecord`] per
/// row. No rows are dropped; the registry is published well-formed.
pub fn normalize_registry(table: &RawTable) -> std::result::Result<Vec<RegistryRecord>, SchemaError> {
    let source_columns: Vec<&str> = REGISTRY_COLUMNS.iter().map(|(source, _)| *source).collect();
    let pos = table.require_normalized(&source_columns)?;

    Ok(table
        .rows
        .iter()
        .map(|row| RegistryRecord {
            registro_ans: field(row, pos[0]).trim().to_string(),
            razao_social: field(row, pos[1]).trim().to_string(),
            cnpj: field(row, pos[2]).trim().to_string(),
            uf: field(row, pos[3]).trim().to_string(),
            modalidade: field(row, pos[4]).trim().to_string(),
        })
        .collect())
}
