// Pipeline ingestion: portal discovery, downloads and archive extraction

pub mod download;
pub mod listing;
pub mod quarter_selector;

pub use download::{collect_quarter_csvs, download_and_extract, ensure_registry};
pub use listing::extract_hrefs;
pub use quarter_selector::QuarterSelector;
