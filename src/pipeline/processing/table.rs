use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};

use crate::constants::SOURCE_DELIMITER;
use crate::error::SchemaError;

/// A delimited file held as strings, addressed by header. Used only at
/// ingestion; stages downstream work on typed records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Source name used in error messages (usually the file name)
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Read a `;`-separated file. Fields are decoded as UTF-8 when valid and
    /// as Latin-1 otherwise, which is what the portal publishes.
    pub fn read_path(path: &Path) -> Result<Self, csv::Error> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file = File::open(path)?;
        Self::from_reader(name, file)
    }

    pub fn from_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, csv::Error> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(SOURCE_DELIMITER)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = decode_record(rdr.byte_headers()?);
        let mut rows = Vec::new();
        let mut record = ByteRecord::new();
        while rdr.read_byte_record(&mut record)? {
            rows.push(decode_record(&record));
        }

        Ok(Self::new(name, headers, rows))
    }

    /// Column positions for `required`, matched against trimmed,
    /// lower-cased labels. Government exports are inconsistent about case.
    pub fn require_normalized(&self, required: &[&str]) -> Result<Vec<usize>, SchemaError> {
        self.locate(required, |label| clean_label(label).to_lowercase())
    }

    /// Column positions for `required`, matched exactly (after trimming).
    pub fn require_exact(&self, required: &[&str]) -> Result<Vec<usize>, SchemaError> {
        self.locate(required, |label| clean_label(label).to_string())
    }

    fn locate<F>(&self, required: &[&str], normalize: F) -> Result<Vec<usize>, SchemaError>
    where
        F: Fn(&str) -> String,
    {
        let labels: Vec<String> = self.headers.iter().map(|h| normalize(h)).collect();
        let mut positions = Vec::with_capacity(required.len());
        let mut missing = Vec::new();

        for name in required {
            match labels.iter().position(|l| l == name) {
                Some(idx) => positions.push(idx),
                None => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(positions)
        } else {
            Err(SchemaError {
                table: self.name.clone(),
                missing,
            })
        }
    }
}

/// Field at `idx`, or empty when a short row does not reach it.
pub fn field(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn clean_label(label: &str) -> &str {
    label.trim_start_matches('\u{feff}').trim()
}

fn decode_record(record: &ByteRecord) -> Vec<String> {
    record.iter().map(decode_field).collect()
}

fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}
