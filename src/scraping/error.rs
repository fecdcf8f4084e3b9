//! Error types for the scraping module.

use thiserror::Error;

/// Errors that can occur during scraping operations.
#[derive(Debug, Error)]
pub enum ScrapingError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// HTTP client configuration error.
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// The page answered with a non-success status.
    #[error("{url} returned status {status}")]
    HttpStatus {
        /// Requested page.
        url: String,
        /// Status code returned by the server.
        status: u16,
    },

    /// HTML parsing error.
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// Staging file could not be read or written.
    #[error("staging file error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
