//! Core types for scraping results.

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Format used for scrape timestamps (local time, microsecond precision).
pub const SCRAPE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// One item of a ranked listing.
///
/// Field order is the staging file column order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendEntry {
    /// Identifier of the source card (always `node-` prefixed).
    pub node_id: String,
    /// Display name of the source card.
    pub node_name: String,
    /// Position in the listing, as displayed.
    pub rank: String,
    /// Listing title.
    pub title: String,
    /// Target URL, relative or absolute.
    pub link: String,
    /// Capture time of the page the entry came from.
    pub scrape_time: String,
    /// Auxiliary annotation such as a popularity count.
    pub extra: String,
    /// Page the entry was extracted from.
    pub page_url: String,
}

impl TrendEntry {
    /// Stamp the entry with the page it came from.
    pub fn stamp(&mut self, scrape_time: &str, page_url: &str) {
        self.scrape_time = scrape_time.to_string();
        self.page_url = page_url.to_string();
    }
}

/// Raw HTML captured from one page.
#[derive(Clone, Debug)]
pub struct FetchedPage {
    /// Requested URL.
    pub url: String,
    /// Response body.
    pub html: String,
    /// Capture time, formatted with [`SCRAPE_TIME_FORMAT`].
    pub scrape_time: String,
}

impl FetchedPage {
    /// Wrap a response body captured now.
    #[must_use]
    pub fn captured_now(url: impl Into<String>, html: String) -> Self {
        Self {
            url: url.into(),
            html,
            scrape_time: now_timestamp(),
        }
    }
}

/// Current local time formatted as a scrape timestamp.
#[must_use]
pub fn now_timestamp() -> String {
    Local::now()
        .naive_local()
        .format(SCRAPE_TIME_FORMAT)
        .to_string()
}

/// Summary of one scrape run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScrapeReport {
    /// Pages requested.
    pub pages_requested: usize,
    /// Pages fetched successfully.
    pub pages_fetched: usize,
    /// Entries written to the staging file.
    pub entries: usize,
    /// Whether a staging file was written.
    pub staged: bool,
}
