//! Record shapes passed between pipeline stages.
//!
//! Everything here is produced once by a stage and then only read. Serde
//! field names are the column names used in the output files.

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::error::ParseError;

/// A (year, quarter) pair taken from a file name such as `3T2025.zip`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct QuarterPeriod {
    pub year: i32,
    pub quarter: u8,
}

impl QuarterPeriod {
    /// Quarter is the first character of the file stem (1-4), year the four
    /// characters after the separator at positions 2..=5.
    pub fn from_file_name(name: &str) -> Result<Self, ParseError> {
        let err = || ParseError::Period(name.to_string());
        let stem = Path::new(name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        let chars: Vec<char> = stem.chars().collect();

        let quarter = chars
            .first()
            .and_then(|c| c.to_digit(10))
            .filter(|q| (1..=4).contains(q))
            .ok_or_else(err)? as u8;

        if chars.len() < 6 || !chars[2..6].iter().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let year = chars[2..6]
            .iter()
            .collect::<String>()
            .parse::<i32>()
            .map_err(|_| err())?;

        Ok(Self { year, quarter })
    }
}

impl fmt::Display for QuarterPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}T{}", self.quarter, self.year)
    }
}

/// One quarterly archive on the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuarterArchiveRef {
    pub year: i32,
    pub quarter: u8,
    pub url: String,
}

impl QuarterArchiveRef {
    pub fn period(&self) -> QuarterPeriod {
        QuarterPeriod {
            year: self.year,
            quarter: self.quarter,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuarterlyRecord {
    #[serde(rename = "RegistroANS")]
    pub registro_ans: String,
    #[serde(rename = "ValorDespesas")]
    pub valor_despesas: f64,
    #[serde(rename = "Ano")]
    pub ano: i32,
    #[serde(rename = "Trimestre")]
    pub trimestre: u8,
}

/// A regulated operator as listed in the CADOP registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryRecord {
    #[serde(rename = "RegistroANS")]
    pub registro_ans: String,
    #[serde(rename = "RazaoSocial")]
    pub razao_social: String,
    #[serde(rename = "CNPJ")]
    pub cnpj: String,
    #[serde(rename = "UF")]
    pub uf: String,
    #[serde(rename = "Modalidade")]
    pub modalidade: String,
}

/// A quarterly record with registry attributes attached. The registry side
/// is `None` when the operator is not listed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(rename = "RegistroANS")]
    pub registro_ans: String,
    #[serde(rename = "ValorDespesas")]
    pub valor_despesas: f64,
    #[serde(rename = "Ano")]
    pub ano: i32,
    #[serde(rename = "Trimestre")]
    pub trimestre: u8,
    #[serde(rename = "RazaoSocial")]
    pub razao_social: Option<String>,
    #[serde(rename = "CNPJ")]
    pub cnpj: Option<String>,
    #[serde(rename = "UF")]
    pub uf: Option<String>,
    #[serde(rename = "Modalidade")]
    pub modalidade: Option<String>,
}

impl EnrichedRecord {
    pub fn is_matched(&self) -> bool {
        self.cnpj.is_some() && self.razao_social.is_some() && self.uf.is_some()
    }
}

/// Expense totals per operator, region and quarter, already formatted for
/// display. Not meant to be read back as numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedRecord {
    #[serde(rename = "CNPJ")]
    pub cnpj: String,
    #[serde(rename = "RazaoSocial")]
    pub razao_social: String,
    #[serde(rename = "UF")]
    pub uf: String,
    #[serde(rename = "Ano")]
    pub ano: i32,
    #[serde(rename = "Trimestre")]
    pub trimestre: u8,
    #[serde(rename = "DespesaTotal")]
    pub despesa_total: String,
    #[serde(rename = "DespesaMediaTrimestre")]
    pub despesa_media_trimestre: String,
}
