//! Trending-listing harvester.
//!
//! This module provides the scraping half of the pipeline:
//! - Page fetching with rotated headers and jittered pauses
//! - Listing extraction from tophub-style markup
//! - Aggregation of entries across pages
//! - The CSV staging file consumed by the indexer

pub mod config;
pub mod error;
pub mod fetcher;
pub mod parser;
pub mod staging;
pub mod types;

pub use config::ScrapingConfig;
pub use error::ScrapingError;
pub use fetcher::PageFetcher;
pub use parser::TrendParser;
pub use types::{FetchedPage, ScrapeReport, TrendEntry};

use std::path::Path;

/// Main scraping service that coordinates a scrape run.
pub struct ScrapingService {
    fetcher: PageFetcher,
    parser: TrendParser,
}

impl ScrapingService {
    /// Create a new scraping service with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client cannot be created.
    pub fn new(config: ScrapingConfig) -> Result<Self, ScrapingError> {
        config.validate()?;
        Ok(Self {
            fetcher: PageFetcher::new(config)?,
            parser: TrendParser::new()?,
        })
    }

    /// Create a new scraping service with default configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, ScrapingError> {
        Self::new(ScrapingConfig::default())
    }

    /// Fetch every page, extract its entries and write them to the staging file.
    ///
    /// # Errors
    /// Returns an error only if the staging file cannot be written; page
    /// failures are logged and skipped.
    pub async fn run(&self, staging_path: &Path) -> Result<ScrapeReport, ScrapingError> {
        let pages = self.fetcher.fetch_all().await;
        let pages_fetched = pages.len();
        let pages_requested = self.fetcher.page_count();

        let entries = aggregate(&self.parser, &pages);

        let staged = if entries.is_empty() {
            tracing::warn!("No data found across all pages");
            false
        } else {
            tracing::info!(
                "Writing {} total entries to {}",
                entries.len(),
                staging_path.display()
            );
            write_staged(staging_path, &entries)?
        };

        Ok(ScrapeReport {
            pages_requested,
            pages_fetched,
            entries: if staged { entries.len() } else { 0 },
            staged,
        })
    }
}

/// Parse every page and stamp its entries with the page's capture time and URL.
#[must_use]
pub fn aggregate(parser: &TrendParser, pages: &[FetchedPage]) -> Vec<TrendEntry> {
    let mut all = Vec::new();
    for page in pages {
        let mut entries = parser.parse(&page.html);
        for entry in &mut entries {
            entry.stamp(&page.scrape_time, &page.url);
        }
        tracing::info!("Found {} entries on {}", entries.len(), page.url);
        all.extend(entries);
    }
    all
}

fn write_staged(path: &Path, entries: &[TrendEntry]) -> Result<bool, ScrapingError> {
    let written = staging::write_staging(path, entries)?;
    if written {
        tracing::info!("Data successfully written to {}", path.display());
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<div id="page"><div class="c-d c-d-e"><div class="bc"><div class="bc-cc">
        <div class="cc-cd" id="node-1">
          <div class="cc-cd-ih"><div class="cc-cd-is"><a><div class="cc-cd-lb">EntA</div></a></div></div>
          <div class="cc-cd-cb"><div class="nano-content">
            <a href="http://x"><div class="cc-cd-cb-ll"><span class="s">1</span><span class="t">Topic X</span></div></a>
          </div></div>
        </div>
    </div></div></div></div>"#;

    fn page(url: &str, html: &str, ts: &str) -> FetchedPage {
        FetchedPage {
            url: url.to_string(),
            html: html.to_string(),
            scrape_time: ts.to_string(),
        }
    }

    #[test]
    fn test_service_creation() {
        let service = ScrapingService::with_defaults();
        assert!(service.is_ok());
    }

    #[test]
    fn test_aggregate_stamps_per_page() {
        let parser = TrendParser::new().unwrap();
        let pages = vec![
            page("http://src/1", PAGE, "2024-01-01T00:00:00"),
            page("http://src/2", "<html></html>", "2024-01-01T00:00:05"),
            page("http://src/3", PAGE, "2024-01-01T00:00:09"),
        ];

        let entries = aggregate(&parser, &pages);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].page_url, "http://src/1");
        assert_eq!(entries[0].scrape_time, "2024-01-01T00:00:00");
        assert_eq!(entries[1].page_url, "http://src/3");
        assert_eq!(entries[1].scrape_time, "2024-01-01T00:00:09");
        assert_eq!(entries[1].title, "Topic X");
    }

    #[tokio::test]
    async fn test_failed_run_writes_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let staging = dir.path().join("output.csv");
        let config = ScrapingConfig::new()
            .with_urls(["http://127.0.0.1:9/ent"])
            .with_timeout(std::time::Duration::from_secs(2))
            .with_jitter(0.0, 0.0);

        let report = ScrapingService::new(config).unwrap().run(&staging).await.unwrap();

        assert_eq!(report.pages_requested, 1);
        assert_eq!(report.pages_fetched, 0);
        assert!(!report.staged);
        assert!(!staging.exists());
    }
}
