use thiserror::Error;

/// Failures that abort the run.
#[derive(Error, Debug)]
pub enum EtlError {
    #[error("HTTP request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("No data: {0}")]
    NoData(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Required columns absent from a source table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{table} is missing required columns: {}", .missing.join(", "))]
pub struct SchemaError {
    pub table: String,
    pub missing: Vec<String>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// File name does not follow the `QTYYYY` convention.
    #[error("cannot derive year/quarter from file name '{0}'")]
    Period(String),

    #[error("'{0}' is not a valid decimal amount")]
    Amount(String),

    #[error("invalid {column} value '{value}'")]
    Field { column: String, value: String },
}

/// Failure confined to a single quarterly file. The consolidator excludes the
/// file and keeps going; nothing else catches these.
#[derive(Error, Debug)]
pub enum QuarterFileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl QuarterFileError {
    /// Short label used for log fields and metric tags.
    pub fn kind(&self) -> &'static str {
        match self {
            QuarterFileError::Schema(_) => "schema",
            QuarterFileError::Parse(_) => "parse",
            QuarterFileError::Io(_) => "io",
            QuarterFileError::Csv(_) => "csv",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
