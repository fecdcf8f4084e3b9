//! Application configuration: JSON file plus environment overrides.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rag::{RagConfig, RagError};
use crate::scraping::{ScrapingConfig, ScrapingError};

/// Ollama base URL for both embedding and completion.
pub const ENV_OLLAMA_URL: &str = "TRENDRAG_OLLAMA_URL";
/// Completion model name.
pub const ENV_MODEL: &str = "TRENDRAG_MODEL";
/// Embedding model name.
pub const ENV_EMBED_MODEL: &str = "TRENDRAG_EMBED_MODEL";
/// HTTP server port.
pub const ENV_PORT: &str = "TRENDRAG_PORT";

/// Default HTTP server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Config file is not valid JSON for [`AppConfig`].
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// Environment override could not be applied.
    #[error("invalid value for {name}: {value}")]
    Env {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
    /// Scraping settings are invalid.
    #[error(transparent)]
    Scraping(#[from] ScrapingError),
    /// Retrieval settings are invalid.
    #[error(transparent)]
    Rag(#[from] RagError),
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Scrape run settings.
    pub scraping: ScrapingConfig,
    /// Indexing, retrieval and generation settings.
    pub rag: RagConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load from an optional JSON file, apply environment overrides and validate.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, an override is
    /// malformed, or the result fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from `lookup`, usually the process environment.
    ///
    /// # Errors
    /// Returns an error if the port override is not a valid port number.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_OLLAMA_URL) {
            self.rag.embedding.base_url = Some(url.clone());
            self.rag.llm.base_url = Some(url);
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.rag.llm.model = model;
        }
        if let Some(model) = lookup(ENV_EMBED_MODEL) {
            self.rag.embedding.model = model;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Env {
                name: ENV_PORT,
                value: port,
            })?;
        }
        Ok(())
    }

    /// Validate every section.
    ///
    /// # Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scraping.validate()?;
        self.rag.validate()?;
        Ok(())
    }
}
