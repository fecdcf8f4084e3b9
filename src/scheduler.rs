//! Half-hourly scrape loop.
//!
//! Polls the local clock once per minute and triggers a scrape run, followed
//! by indexing, at minute 0 and minute 30 of every hour.

use std::future::Future;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, Timelike};
use tokio::time::MissedTickBehavior;

use crate::rag::{Indexer, RagResult};
use crate::scraping::{ScrapeReport, ScrapingService};

/// Clock polling period.
pub const POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Whether a scrape is due at this minute of the hour.
#[must_use]
pub const fn should_run(minute: u32) -> bool {
    minute == 0 || minute == 30
}

/// Slot key for `now` if a run is due and that slot has not run yet.
#[must_use]
pub fn due_slot(now: NaiveDateTime, last_slot: Option<&str>) -> Option<String> {
    if !should_run(now.minute()) {
        return None;
    }
    let slot = now.format("%Y-%m-%dT%H:%M").to_string();
    (last_slot != Some(slot.as_str())).then_some(slot)
}

/// Scrape every page, then open or build the index from the fresh staging file.
///
/// # Errors
/// Returns an error if the staging file cannot be written or indexing fails.
pub async fn scrape_and_index(scraper: &ScrapingService, indexer: &Indexer) -> RagResult<ScrapeReport> {
    let report = scraper.run(&indexer.storage().staging_path).await?;
    tracing::info!(
        "Scrape run fetched {}/{} pages, staged {} entries",
        report.pages_fetched,
        report.pages_requested,
        report.entries
    );

    match indexer.ensure_index().await? {
        Some(index) => {
            tracing::info!("Index ready at {}", index.dir().display());
            index.close().await?;
        }
        None => tracing::warn!("No index available after scrape run"),
    }
    Ok(report)
}

/// Runs [`scrape_and_index`] on a fixed half-hourly schedule.
pub struct Scheduler {
    scraper: ScrapingService,
    indexer: Indexer,
}

impl Scheduler {
    /// Create a scheduler over a scraper and an indexer sharing one staging file.
    #[must_use]
    pub const fn new(scraper: ScrapingService, indexer: Indexer) -> Self {
        Self { scraper, indexer }
    }

    /// Poll until `shutdown` completes. Failed runs are logged and the loop continues.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);
        let mut last_slot: Option<String> = None;

        tracing::info!("Scheduler started, scraping at minute 0 and 30 of every hour");
        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => {
                    tracing::info!("Scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let Some(slot) = due_slot(Local::now().naive_local(), last_slot.as_deref()) else {
                        continue;
                    };
                    tracing::info!("Starting scheduled scrape for {slot}");
                    last_slot = Some(slot);
                    if let Err(e) = scrape_and_index(&self.scraper, &self.indexer).await {
                        tracing::error!("Scheduled run failed: {e}");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::*;
    use crate::rag::StorageConfig;
    use crate::rag::test_support::FakeEmbedder;
    use crate::scraping::ScrapingConfig;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(hour, minute, 12))
            .unwrap()
    }

    #[test]
    fn test_should_run_on_half_hours() {
        assert!(should_run(0));
        assert!(should_run(30));
        assert!(!should_run(1));
        assert!(!should_run(29));
        assert!(!should_run(59));
    }

    #[test]
    fn test_due_slot_runs_once_per_slot() {
        assert_eq!(due_slot(at(9, 15), None), None);

        let slot = due_slot(at(9, 30), None).unwrap();
        assert_eq!(slot, "2024-01-01T09:30");
        assert_eq!(due_slot(at(9, 30), Some(&slot)), None);

        assert_eq!(
            due_slot(at(10, 0), Some(&slot)).as_deref(),
            Some("2024-01-01T10:00")
        );
    }

    #[tokio::test]
    async fn test_scrape_and_index_with_unreachable_pages() {
        let tmp = tempfile::tempdir().unwrap();
        let scraper = ScrapingService::new(
            ScrapingConfig::new()
                .with_urls(["http://127.0.0.1:9/n/1"])
                .with_timeout(Duration::from_secs(1))
                .with_jitter(0.0, 0.0),
        )
        .unwrap();
        let storage = StorageConfig {
            index_dir: tmp.path().join("trend_index"),
            staging_path: tmp.path().join("output.csv"),
            ..StorageConfig::default()
        };
        let embedder = Arc::new(FakeEmbedder::default());
        let indexer = Indexer::new(storage.clone(), embedder.clone());

        let report = scrape_and_index(&scraper, &indexer).await.unwrap();

        assert_eq!(report.pages_requested, 1);
        assert_eq!(report.pages_fetched, 0);
        assert!(!report.staged);
        assert!(!storage.staging_path.exists());
        assert!(!storage.index_dir.exists());
        assert_eq!(embedder.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = StorageConfig {
            index_dir: tmp.path().join("trend_index"),
            staging_path: tmp.path().join("output.csv"),
            ..StorageConfig::default()
        };
        let scheduler = Scheduler::new(
            ScrapingService::with_defaults().unwrap(),
            Indexer::new(storage, Arc::new(FakeEmbedder::default())),
        );

        tokio::time::timeout(Duration::from_secs(5), scheduler.run_until(async {}))
            .await
            .unwrap();
    }
}
