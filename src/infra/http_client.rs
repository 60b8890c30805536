use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::{debug, warn};

use crate::app::ports::HttpClientPort;
use crate::config::EtlConfig;
use crate::error::{EtlError, Result};

const USER_AGENT: &str = concat!("ans_etl/", env!("CARGO_PKG_VERSION"));
const COPY_BUFFER_BYTES: usize = 64 * 1024;

/// Blocking reqwest adapter.
///
/// The timeout given to each call bounds connecting, waiting for the response
/// head and every single body read. It is not a deadline on the whole
/// transfer, so a slow but steady download can take as long as it needs.
/// Timeouts, connection failures, interrupted bodies and 5xx responses are
/// retried with a linear backoff; anything else fails immediately.
pub struct ReqwestHttp {
    clients: Mutex<HashMap<Duration, Client>>,
    max_retries: u32,
    backoff: Duration,
}

/// Why one attempt failed.
enum AttemptError {
    Transient(String),
    Fatal(EtlError),
}

impl ReqwestHttp {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            clients: Mutex::new(HashMap::new()),
            max_retries,
            backoff,
        }
    }

    pub fn from_config(config: &EtlConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// One client per timeout. The blocking client's own timeout applies per
    /// operation, unlike a per-request timeout, which covers the full body.
    fn client_for(&self, timeout: Duration) -> Result<Client> {
        let mut clients = self
            .clients
            .lock()
            .map_err(|_| EtlError::Config("HTTP client cache lock poisoned".into()))?;
        if let Some(client) = clients.get(&timeout) {
            return Ok(client.clone());
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| EtlError::Config(format!("cannot build HTTP client: {}", e)))?;
        clients.insert(timeout, client.clone());
        Ok(client)
    }

    fn open(&self, url: &str, timeout: Duration) -> std::result::Result<Response, AttemptError> {
        let client = self.client_for(timeout).map_err(AttemptError::Fatal)?;
        let response = client
            .get(url)
            .send()
            .and_then(Response::error_for_status)
            .map_err(|e| classify(url, e))?;
        debug!(url, status = %response.status(), "response received");
        Ok(response)
    }

    fn with_retries<T, F>(&self, url: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> std::result::Result<T, AttemptError>,
    {
        let mut retries: u32 = 0;
        loop {
            match attempt() {
                Ok(value) => return Ok(value),
                Err(AttemptError::Transient(message)) if retries < self.max_retries => {
                    retries += 1;
                    let wait = backoff_for(self.backoff, retries);
                    warn!(url, attempt = retries, wait_ms = wait.as_millis() as u64, error = %message, "retrying request");
                    thread::sleep(wait);
                }
                Err(AttemptError::Transient(message)) => {
                    return Err(EtlError::Transport {
                        url: url.to_string(),
                        message,
                    })
                }
                Err(AttemptError::Fatal(e)) => return Err(e),
            }
        }
    }
}

impl HttpClientPort for ReqwestHttp {
    fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String> {
        self.with_retries(url, || {
            let mut response = self.open(url, timeout)?;
            let mut body = Vec::new();
            response
                .read_to_end(&mut body)
                .map_err(|e| AttemptError::Transient(e.to_string()))?;
            Ok(String::from_utf8_lossy(&body).into_owned())
        })
    }

    fn download(&self, url: &str, dest: &Path, timeout: Duration) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let outcome = self.with_retries(url, || {
            let mut response = self.open(url, timeout)?;
            let file = File::create(dest).map_err(|e| AttemptError::Fatal(e.into()))?;
            copy_body(&mut response, BufWriter::new(file))
        });

        match outcome {
            Ok(bytes) => {
                debug!(url, dest = %dest.display(), bytes, "download complete");
                Ok(bytes)
            }
            Err(e) => {
                // never leave a partial download behind
                let _ = fs::remove_file(dest);
                Err(e)
            }
        }
    }
}

/// Stream `reader` into `writer`. Read failures are transport problems and
/// may be retried; write failures are local and are not.
fn copy_body<R: Read, W: Write>(reader: &mut R, mut writer: W) -> std::result::Result<u64, AttemptError> {
    let mut buf = vec![0u8; COPY_BUFFER_BYTES];
    let mut total: u64 = 0;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(AttemptError::Transient(e.to_string())),
        };
        writer
            .write_all(&buf[..n])
            .map_err(|e| AttemptError::Fatal(e.into()))?;
        total += n as u64;
    }
    writer.flush().map_err(|e| AttemptError::Fatal(e.into()))?;
    Ok(total)
}

fn classify(url: &str, err: reqwest::Error) -> AttemptError {
    if is_retryable(&err) {
        AttemptError::Transient(err.to_string())
    } else {
        AttemptError::Fatal(EtlError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_timeout()
        || err.is_connect()
        || err.status().map_or(false, |s| s.is_server_error())
}

fn backoff_for(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}
