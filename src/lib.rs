//! ScrapeSmart: crawl web pages and pull structured data out of them with an LLM
//!
//! This crate implements a frontier-driven crawler that aggregates page text into a
//! corpus, a chunker that slices the corpus into bounded windows, and a conversational
//! extraction engine that streams model output over those windows while keeping a
//! consistent conversation history. Extraction output is coerced into tables that can
//! be exported as text, CSV, JSON or HTML.

pub mod backend;
pub mod chunker;
pub mod config;
pub mod crawler;
pub mod events;
pub mod extraction;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod table;
pub mod url;

use thiserror::Error;

/// Main error type for ScrapeSmart operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid start URL '{0}': must begin with http:// or https://")]
    InvalidStartUrl(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Model backend error: {0}")]
    Backend(#[from] backend::BackendError),

    #[error("Export error: {0}")]
    Export(#[from] output::ExportError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Unsupported model '{0}': expected a gemini or deepseek model id")]
    UnsupportedModel(String),

    #[error("No API key for {provider}: set `api-key` or the {env_var} environment variable")]
    MissingApiKey { provider: String, env_var: String },
}

/// Page fetch errors
///
/// Everything except `ChallengeDetected` is recoverable: the crawler records the
/// failure for that URL and moves on.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Bot challenge detected at {url}")]
    ChallengeDetected { url: String },
}

impl FetchError {
    /// Returns true if this error should stop the whole crawl
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::ChallengeDetected { .. })
    }
}

/// Result type alias for ScrapeSmart operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use chunker::split;
pub use config::Config;
pub use crawler::{CrawlJob, CrawlOutcome, Crawler};
pub use extraction::{ConversationHistory, ExtractionEngine, ExtractionRequest, ExtractionResult};
pub use pipeline::{Answer, Pipeline};
pub use state::SessionState;
pub use table::{to_table, StructuredTable};
