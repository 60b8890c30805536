use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Blocking HTTP access used by discovery and the download steps.
pub trait HttpClientPort {
    /// GET `url` and return the body as text. Non-2xx statuses and timeouts
    /// are errors.
    fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String>;

    /// Stream `url` into `dest`, creating parent directories as needed.
    /// Returns the number of bytes written.
    fn download(&self, url: &str, dest: &Path, timeout: Duration) -> Result<u64>;
}

impl<T: HttpClientPort + ?Sized> HttpClientPort for &T {
    fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String> {
        (**self).fetch_text(url, timeout)
    }

    fn download(&self, url: &str, dest: &Path, timeout: Duration) -> Result<u64> {
        (**self).download(url, dest, timeout)
    }
}
