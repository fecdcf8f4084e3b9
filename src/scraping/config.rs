//! Configuration for the scraping module.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::ScrapingError;

/// Configuration for a scrape run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Pages to harvest, fetched in order.
    pub urls: Vec<String>,
    /// Request timeout.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
    /// Lower bound of the pause between two pages, in seconds.
    pub jitter_min_secs: f64,
    /// Upper bound of the pause between two pages, in seconds.
    pub jitter_max_secs: f64,
    /// User agents to rotate.
    pub user_agents: Vec<String>,
    /// `Accept` header sent with every request.
    pub accept: String,
    /// `Accept-Language` header sent with every request.
    pub accept_language: String,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            urls: default_urls(),
            request_timeout: Duration::from_secs(10),
            jitter_min_secs: 1.0,
            jitter_max_secs: 15.0,
            user_agents: default_user_agents(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8".to_string(),
            accept_language: "en-US,en;q=0.9".to_string(),
        }
    }
}

impl ScrapingConfig {
    /// Create a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the page list.
    #[must_use]
    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Set request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the pause range between two pages, in seconds.
    #[must_use]
    pub const fn with_jitter(mut self, min_secs: f64, max_secs: f64) -> Self {
        self.jitter_min_secs = min_secs;
        self.jitter_max_secs = max_secs;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the page list is empty or the jitter range is invalid.
    pub fn validate(&self) -> Result<(), ScrapingError> {
        if self.urls.is_empty() {
            return Err(ScrapingError::Config("scraping.urls must not be empty".to_string()));
        }
        if !(self.jitter_min_secs >= 0.0 && self.jitter_min_secs <= self.jitter_max_secs) {
            return Err(ScrapingError::Config(format!(
                "invalid jitter range [{}, {}]",
                self.jitter_min_secs, self.jitter_max_secs
            )));
        }
        for url in &self.urls {
            url::Url::parse(url)
                .map_err(|e| ScrapingError::Config(format!("invalid url {url}: {e}")))?;
        }
        Ok(())
    }

    /// Get a random user agent from the rotation list.
    #[must_use]
    pub fn random_user_agent(&self) -> String {
        if self.user_agents.is_empty() {
            return default_user_agents()[0].clone();
        }
        let mut rng = rand::thread_rng();
        let idx = rng.gen_range(0..self.user_agents.len());
        self.user_agents[idx].clone()
    }

    /// Draw the pause to observe before the next page.
    #[must_use]
    pub fn random_jitter(&self) -> Duration {
        let secs = if self.jitter_max_secs > self.jitter_min_secs {
            rand::thread_rng().gen_range(self.jitter_min_secs..=self.jitter_max_secs)
        } else {
            self.jitter_min_secs
        };
        Duration::from_secs_f64(secs.max(0.0))
    }
}

/// Default tophub listing pages.
fn default_urls() -> Vec<String> {
    vec![
        "https://tophub.today/c/ent?q=%E5%93%94%E5%93%A9%E5%93%94%E5%93%A9".to_string(),
        "https://tophub.today/c/ent?q=%E6%8A%96%E9%9F%B3".to_string(),
        "https://tophub.today/c/ent?q=IMDB".to_string(),
        "https://tophub.today/c/ent?q=AcFun".to_string(),
        "https://tophub.today/c/news?q=%E7%9F%A5%E4%B9%8E".to_string(),
    ]
}

/// Default user agents for rotation.
fn default_user_agents() -> Vec<String> {
    vec![
        // Chrome on Windows
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36".to_string(),
        // Chrome on macOS
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/116.0.0.0 Safari/537.36".to_string(),
        // Firefox on Windows
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/117.0".to_string(),
        // Safari on macOS
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.6 Safari/605.1.15".to_string(),
        // Chrome on Linux
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0.0.0 Safari/537.36".to_string(),
    ]
}

/// Serde module for Duration serialization.
pub(crate) mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScrapingConfig::default();
        assert_eq!(config.urls.len(), 5);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ScrapingConfig::new()
            .with_urls(["https://example.com/a"])
            .with_timeout(Duration::from_secs(3))
            .with_jitter(0.0, 0.0);

        assert_eq!(config.urls, vec!["https://example.com/a".to_string()]);
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.random_jitter(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_jitter_rejected() {
        let config = ScrapingConfig::new().with_jitter(5.0, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_urls_rejected() {
        let config = ScrapingConfig::new().with_urls(Vec::<String>::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_random_jitter_within_range() {
        let config = ScrapingConfig::new().with_jitter(1.0, 15.0);
        for _ in 0..32 {
            let pause = config.random_jitter();
            assert!(pause >= Duration::from_secs(1));
            assert!(pause <= Duration::from_secs(15));
        }
    }

    #[test]
    fn test_random_user_agent() {
        let config = ScrapingConfig::default();
        let ua = config.random_user_agent();
        assert!(config.user_agents.contains(&ua));
        assert!(ua.contains("Mozilla"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ScrapingConfig =
            serde_json::from_str(r#"{"urls": ["https://example.com"], "request_timeout": 4}"#)
                .unwrap();
        assert_eq!(config.urls.len(), 1);
        assert_eq!(config.request_timeout, Duration::from_secs(4));
        assert!((config.jitter_max_secs - 15.0).abs() < f64::EPSILON);
    }
}
