use std::path::Path;

use tracing::debug;

use crate::constants::QUARTER_COLUMNS;
use crate::domain::{QuarterPeriod, QuarterlyRecord};
use crate::error::{QuarterFileError, SchemaError};
use crate::pipeline::processing::locale::parse_br_decimal;
use crate::pipeline::processing::table::{field, RawTable};

/// Valid records from one quarterly export plus how many rows were thrown
/// away.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuarter {
    pub period: QuarterPeriod,
    pub records: Vec<QuarterlyRecord>,
    pub dropped: usize,
}

/// Validate the two required columns and turn each row into a
/// [`QuarterlyRecord`] tagged with `period`. Rows with an empty operator id
/// or an amount that does not parse are dropped and counted.
pub fn normalize_quarter(table: &RawTable, period: QuarterPeriod) -> Result<NormalizedQuarter, SchemaError> {
    let source_columns: Vec<&str> = QUARTER_COLUMNS.iter().map(|(source, _)| *source).collect();
    let positions = table.require_normalized(&source_columns)?;
    let (id_col, value_col) = (positions[0], positions[1]);

    let mut records = Vec::with_capacity(table.rows.len());
    let mut dropped = 0;

    for row in &table.rows {
        let registro_ans = field(row, id_col).trim();
        let value = parse_br_decimal(field(row, value_col));

        match (registro_ans.is_empty(), value) {
            (false, Ok(valor_despesas)) => records.push(QuarterlyRecord {
                registro_ans: registro_ans.to_string(),
                valor_despesas,
                ano: period.year,
                trimestre: period.quarter,
            }),
            _ => dropped += 1,
        }
    }

    debug!(table = %table.name, kept = records.len(), dropped, "quarter normalized");
    Ok(NormalizedQuarter {
        period,
        records,
        dropped,
    })
}

/// Derive the period from the file name, read the file and normalize it.
/// Any failure is confined to this file.
pub fn load_quarter_file(path: &Path) -> Result<NormalizedQuarter, QuarterFileError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let period = QuarterPeriod::from_file_name(&name)?;
    let table = RawTable::read_path(path)?;
    Ok(normalize_quarter(&table, period)?)
}
