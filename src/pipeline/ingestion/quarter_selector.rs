use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use tracing::{debug, info};

use crate::app::ports::HttpClientPort;
use crate::config::EtlConfig;
use crate::constants::{ARCHIVE_EXTENSION, DISCLOSURES_DIR_MARKERS};
use crate::domain::{QuarterArchiveRef, QuarterPeriod};
use crate::error::{EtlError, Result};
use crate::metrics::DiscoveryMetrics;
use crate::pipeline::ingestion::listing::{extract_hrefs, href_file_name};

static YEAR_DIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+)/$").expect("static regex is valid"));

/// Walks the portal's directory listings to find the most recent quarterly
/// archives.
pub struct QuarterSelector<H: HttpClientPort> {
    http: H,
    timeout: Duration,
    max_quarters: usize,
}

impl<H: HttpClientPort> QuarterSelector<H> {
    pub fn new(http: H, timeout: Duration, max_quarters: usize) -> Self {
        Self {
            http,
            timeout,
            max_quarters,
        }
    }

    pub fn from_config(http: H, config: &EtlConfig) -> Self {
        Self::new(http, config.listing_timeout(), config.max_quarters)
    }

    /// Most recent archives first, at most `max_quarters` of them. Older year
    /// listings are not fetched once enough archives are found.
    pub fn select_recent_quarters(&self, base_listing_url: &str) -> Result<Vec<QuarterArchiveRef>> {
        let disclosures = self.find_disclosures_dir(base_listing_url)?;
        let years = self.list_years(&disclosures)?;
        info!(dir = %disclosures, years = years.len(), "disclosure years found");

        let mut selected = Vec::with_capacity(self.max_quarters);
        for (year, href) in years {
            if selected.len() >= self.max_quarters {
                break;
            }
            let year_url = join(&disclosures, &href)?;
            let archives = self.list_archives(&year_url)?;
            debug!(year, archives = archives.len(), "year listing scanned");

            for archive in archives {
                selected.push(archive);
                if selected.len() == self.max_quarters {
                    break;
                }
            }
        }

        DiscoveryMetrics::record_selection(selected.len());
        Ok(selected)
    }

    /// The listing entry whose name mentions both accounting-statement
    /// markers, resolved as a directory URL.
    pub fn find_disclosures_dir(&self, base_listing_url: &str) -> Result<Url> {
        let base = parse_url(base_listing_url)?;
        let hrefs = self.fetch_listing(&base)?;

        let href = hrefs
            .iter()
            .find(|href| {
                let name = href.to_lowercase();
                DISCLOSURES_DIR_MARKERS.iter().all(|m| name.contains(m))
            })
            .ok_or_else(|| {
                EtlError::NotFound(format!(
                    "accounting statements folder not listed at {}",
                    base_listing_url
                ))
            })?;

        let dir = if href.ends_with('/') {
            href.clone()
        } else {
            format!("{}/", href)
        };
        join(&base, &dir)
    }

    /// Year subdirectories as `(year, href)`, newest first. Ordering is
    /// numeric so a five-digit year would still sort correctly.
    pub fn list_years(&self, disclosures: &Url) -> Result<Vec<(u64, String)>> {
        let mut years: Vec<(u64, String)> = self
            .fetch_listing(disclosures)?
            .into_iter()
            .filter_map(|href| {
                let year = YEAR_DIR.captures(&href)?.get(1)?.as_str().parse::<u64>().ok()?;
                Some((year, href))
            })
            .collect();
        years.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(years)
    }

    /// Archives in one year directory, highest quarter first. A file name
    /// that does not start with a quarter digit is an error.
    pub fn list_archives(&self, year_url: &Url) -> Result<Vec<QuarterArchiveRef>> {
        let mut archives = Vec::new();
        for href in self.fetch_listing(year_url)? {
            if !href.ends_with(ARCHIVE_EXTENSION) {
                continue;
            }
            let period = QuarterPeriod::from_file_name(href_file_name(&href))?;
            archives.push(QuarterArchiveRef {
                year: period.year,
                quarter: period.quarter,
                url: join(year_url, &href)?.to_string(),
            });
        }
        archives.sort_by(|a, b| b.quarter.cmp(&a.quarter));
        Ok(archives)
    }

    fn fetch_listing(&self, url: &Url) -> Result<Vec<String>> {
        let html = self.http.fetch_text(url.as_str(), self.timeout)?;
        DiscoveryMetrics::record_listing_fetched();
        Ok(extract_hrefs(&html))
    }
}

fn parse_url(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| EtlError::Config(format!("invalid URL '{}': {}", raw, e)))
}

fn join(base: &Url, href: &str) -> Result<Url> {
    base.join(href)
        .map_err(|e| EtlError::Config(format!("cannot resolve '{}' against {}: {}", href, base, e)))
}
