//! Output module for extraction results and crawl reports
//!
//! This module handles:
//! - Exporting extraction results as text, CSV, JSON or HTML
//! - Downloading the images of the last scraped page
//! - Crawl statistics

mod export;
mod images;
pub mod stats;

pub use export::{
    export_file_stem, file_stem_at, render, to_csv, to_html, to_json, to_text, write_export,
};
pub use images::{download_images, image_extension, DownloadReport};
pub use stats::{print_statistics, CrawlStatistics};

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during export
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("Failed to format output: {0}")]
    Format(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Export format for extraction results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Raw model output
    Text,
    #[default]
    Csv,
    Json,
    Html,
}

impl ExportFormat {
    /// File extension for the format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Html => "html",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            other => Err(format!(
                "unknown format '{}': expected text, csv, json or html",
                other
            )),
        }
    }
}
