// Schema-on-read normalization of the two source exports

pub mod quarterly;
pub mod registry;

pub use quarterly::{load_quarter_file, normalize_quarter, NormalizedQuarter};
pub use registry::{load_registry, normalize_registry};
