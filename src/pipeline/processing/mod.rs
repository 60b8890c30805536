// Pipeline processing: normalization, consolidation, enrichment and aggregation

pub mod aggregate;
pub mod consolidate;
pub mod enrich;
pub mod locale;
pub mod normalize;
pub mod table;

pub use aggregate::{aggregate, enriched_from_table, summarize, ExpenseSummary};
pub use consolidate::{consolidate, consolidate_files, Consolidated, SkippedFile};
pub use enrich::enrich;
pub use locale::{format_brl, parse_br_decimal};
pub use table::RawTable;
