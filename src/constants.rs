//! Default locations and file-format constants for the ANS open-data portal.

// Remote sources
pub const DEFAULT_BASE_LISTING_URL: &str = "https://dadosabertos.ans.gov.br/FTP/PDA/";
pub const DEFAULT_REGISTRY_URL: &str =
    "https://dadosabertos.ans.gov.br/FTP/PDA/operadoras_de_plano_de_saude_ativas/Relatorio_cadop.csv";

// Both substrings must appear (case-insensitive) in the disclosures folder name
pub const DISCLOSURES_DIR_MARKERS: [&str; 2] = ["demonstr", "contab"];
pub const ARCHIVE_EXTENSION: &str = ".zip";

// Local layout
pub const DEFAULT_RAW_DIR: &str = "data/raw";
pub const DEFAULT_PROCESSED_DIR: &str = "data/processed";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const ARCHIVE_DOWNLOAD_SUBDIR: &str = "zips";
pub const REGISTRY_FILE_NAME: &str = "Relatorio_cadop.csv";

// Outputs
pub const DETAIL_CSV_NAME: &str = "consolidado_despesas.csv";
pub const DETAIL_ARCHIVE_NAME: &str = "consolidado_despesas.zip";
pub const AGGREGATED_CSV_NAME: &str = "despesas_agregadas.csv";
pub const DEFAULT_AGGREGATED_ARCHIVE_NAME: &str = "despesas_agregadas.zip";
pub const MANIFEST_FILE_NAME: &str = "run_manifest.json";
pub const METRICS_FILE_NAME: &str = "metrics.prom";

// Source CSV dialect
pub const SOURCE_DELIMITER: u8 = b';';
pub const OUTPUT_DELIMITER: u8 = b';';
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// Quarterly export columns (after trim + lowercase) mapped to internal names
pub const QUARTER_COLUMNS: [(&str, &str); 2] = [
    ("reg_ans", "RegistroANS"),
    ("vl_saldo_final", "ValorDespesas"),
];

// Registry (CADOP) columns mapped to internal names
pub const REGISTRY_COLUMNS: [(&str, &str); 5] = [
    ("registro_operadora", "RegistroANS"),
    ("razao_social", "RazaoSocial"),
    ("cnpj", "CNPJ"),
    ("uf", "UF"),
    ("modalidade", "Modalidade"),
];

// Columns a consolidated detail file must carry to be re-aggregated
pub const AGGREGATION_COLUMNS: [&str; 6] = [
    "CNPJ",
    "RazaoSocial",
    "UF",
    "Ano",
    "Trimestre",
    "ValorDespesas",
];

// Timeouts and retries
pub const DEFAULT_LISTING_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_QUARTERS: usize = 3;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

// Output headers, in column order
pub const DETAIL_COLUMNS: [&str; 8] = [
    "RegistroANS",
    "ValorDespesas",
    "Ano",
    "Trimestre",
    "RazaoSocial",
    "CNPJ",
    "UF",
    "Modalidade",
];
pub const AGGREGATED_COLUMNS: [&str; 7] = [
    "CNPJ",
    "RazaoSocial",
    "UF",
    "Ano",
    "Trimestre",
    "DespesaTotal",
    "DespesaMediaTrimestre",
];
