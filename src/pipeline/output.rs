use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::constants::{
    AGGREGATED_COLUMNS, AGGREGATED_CSV_NAME, DETAIL_COLUMNS, DETAIL_CSV_NAME, OUTPUT_DELIMITER, UTF8_BOM,
};
use crate::domain::{AggregatedRecord, EnrichedRecord};
use crate::error::Result;
use crate::infra::archive::create_archive;
use crate::metrics::OutputMetrics;

/// Write `records` as a `;`-delimited UTF-8 CSV with a byte order mark. The
/// header is written even when there are no records.
pub fn write_csv<S: Serialize>(path: &Path, header: &[&str], records: &[S]) -> Result<u64> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = BufWriter::new(File::create(path)?);
    out.write_all(UTF8_BOM)?;

    let mut writer = csv::WriterBuilder::new()
        .delimiter(OUTPUT_DELIMITER)
        .has_headers(false)
        .from_writer(out);
    writer.write_record(header)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    drop(writer);

    let bytes = fs::metadata(path)?.len();
    OutputMetrics::record_file_written(bytes);
    info!(path = %path.display(), rows = records.len(), bytes, "csv written");
    Ok(bytes)
}

/// Consolidated detail file: one row per quarterly record, raw numbers,
/// registry columns empty when unmatched.
pub fn write_detail_csv(dir: &Path, records: &[EnrichedRecord]) -> Result<PathBuf> {
    let path = dir.join(DETAIL_CSV_NAME);
    write_csv(&path, &DETAIL_COLUMNS, records)?;
    Ok(path)
}

pub fn write_aggregated_csv(dir: &Path, records: &[AggregatedRecord]) -> Result<PathBuf> {
    let path = dir.join(AGGREGATED_CSV_NAME);
    write_csv(&path, &AGGREGATED_COLUMNS, records)?;
    OutputMetrics::record_groups(records.len());
    Ok(path)
}

/// Zip a single output file next to it under `archive_name`.
pub fn archive_output(csv_path: &Path, archive_name: &str) -> Result<PathBuf> {
    let dest = csv_path
        .parent()
        .map(|dir| dir.join(archive_name))
        .unwrap_or_else(|| PathBuf::from(archive_name));
    let archive = create_archive(&[csv_path.to_path_buf()], &dest)?;
    OutputMetrics::record_file_written(fs::metadata(&archive)?.len());
    info!(archive = %archive.display(), "output archived");
    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enriched(id: &str, matched: bool) -> EnrichedRecord {
        EnrichedRecord {
            registro_ans: id.into(),
            valor_despesas: 1500.5,
            ano: 2024,
            trimestre: 1,
            razao_social: matched.then(|| "ALFA SAUDE".to_string()),
            cnpj: matched.then(|| "11.222.333/0001-44".to_string()),
            uf: matched.then(|| "SP".to_string()),
            modalidade: matched.then(|| "Cooperativa Médica".to_string()),
        }
    }

    #[test]
    fn detail_csv_has_bom_header_and_empty_unmatched_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_detail_csv(dir.path(), &[enriched("123", true), enriched("999", false)]).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "RegistroANS;ValorDespesas;Ano;Trimestre;RazaoSocial;CNPJ;UF;Modalidade");
        assert_eq!(lines[1], "123;1500.5;2024;1;ALFA SAUDE;11.222.333/0001-44;SP;Cooperativa Médica");
        assert_eq!(lines[2], "999;1500.5;2024;1;;;;");
    }

    #[test]
    fn empty_report_still_has_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_aggregated_csv(dir.path(), &[]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text.trim_start_matches('\u{feff}').trim_end(),
            "CNPJ;RazaoSocial;UF;Ano;Trimestre;DespesaTotal;DespesaMediaTrimestre"
        );
    }

    #[test]
    fn archive_lands_next_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_detail_csv(dir.path(), &[enriched("1", true)]).unwrap();
        let archive = archive_output(&path, "consolidado_despesas.zip").unwrap();
        assert_eq!(archive, dir.path().join("consolidado_despesas.zip"));

        let mut zip = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        assert_eq!(zip.by_index(0).unwrap().name(), DETAIL_CSV_NAME);
    }
}
