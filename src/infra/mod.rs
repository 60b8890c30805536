// Infrastructure adapters: network transport and archive handling
pub mod archive;
pub mod http_client;

pub use archive::{create_archive, extract_archive};
pub use http_client::ReqwestHttp;
