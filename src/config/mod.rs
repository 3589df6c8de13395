//! Configuration module for ScrapeSmart
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use scrapesmart::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scrapesmart.toml")).unwrap();
//! println!("Crawler will fetch at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetcherConfig, LinkSetPolicy, ModelConfig, ModelProvider, OutputConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
