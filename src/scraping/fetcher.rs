//! Polite page fetching with rotated browser headers.

use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONNECTION, HeaderMap, HeaderValue, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};

use crate::scraping::config::ScrapingConfig;
use crate::scraping::error::ScrapingError;
use crate::scraping::types::FetchedPage;

/// HTTP fetcher for listing pages.
pub struct PageFetcher {
    client: reqwest::Client,
    config: ScrapingConfig,
}

impl PageFetcher {
    /// Create a fetcher with the given configuration.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ScrapingConfig) -> Result<Self, ScrapingError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ScrapingError::HttpClient(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Number of configured pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.config.urls.len()
    }

    /// Build a fresh browser-like header set with a rotated user agent.
    #[must_use]
    pub fn random_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(ua) = HeaderValue::from_str(&self.config.random_user_agent()) {
            headers.insert(USER_AGENT, ua);
        }
        if let Ok(accept) = HeaderValue::from_str(&self.config.accept) {
            headers.insert(ACCEPT, accept);
        }
        if let Ok(lang) = HeaderValue::from_str(&self.config.accept_language) {
            headers.insert(ACCEPT_LANGUAGE, lang);
        }
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        headers
    }

    /// Fetch one page.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, ScrapingError> {
        let headers = self.random_headers();
        tracing::debug!(
            "Using user agent {}",
            headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
        );

        let response = self.client.get(url).headers(headers).send().await?;

        if !response.status().is_success() {
            return Err(ScrapingError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let html = response.text().await?;
        Ok(FetchedPage::captured_now(url, html))
    }

    /// Fetch every configured page in order, pausing a random interval between pages.
    ///
    /// Failed pages are logged and skipped.
    pub async fn fetch_all(&self) -> Vec<FetchedPage> {
        let total = self.config.urls.len();
        let mut pages = Vec::with_capacity(total);

        for (i, url) in self.config.urls.iter().enumerate() {
            tracing::info!("Fetching page {}/{}: {url}", i + 1, total);

            match self.fetch(url).await {
                Ok(page) => {
                    tracing::info!("Page {} fetched ({} bytes)", i + 1, page.html.len());
                    pages.push(page);
                }
                Err(e) => tracing::warn!("Error fetching {url}: {e}"),
            }

            if i + 1 < total {
                let pause = self.config.random_jitter();
                tracing::info!("Waiting {:.2} seconds before next page", pause.as_secs_f64());
                tokio::time::sleep(pause).await;
            }
        }

        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_headers() {
        let fetcher = PageFetcher::new(ScrapingConfig::default()).unwrap();
        let headers = fetcher.random_headers();

        let ua = headers.get(USER_AGENT).unwrap().to_str().unwrap();
        assert!(ScrapingConfig::default().user_agents.iter().any(|u| u == ua));
        assert_eq!(headers.get(CONNECTION).unwrap(), "keep-alive");
        assert_eq!(headers.get(UPGRADE_INSECURE_REQUESTS).unwrap(), "1");
        assert!(headers.get(ACCEPT).unwrap().to_str().unwrap().starts_with("text/html"));
    }

    #[tokio::test]
    async fn test_unreachable_pages_are_skipped() {
        let config = ScrapingConfig::new()
            .with_urls(["http://127.0.0.1:9/a", "http://127.0.0.1:9/b"])
            .with_timeout(std::time::Duration::from_secs(2))
            .with_jitter(0.0, 0.0);
        let fetcher = PageFetcher::new(config).unwrap();

        assert!(fetcher.fetch_all().await.is_empty());
    }
}
