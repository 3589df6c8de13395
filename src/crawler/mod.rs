//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with challenge detection and a settle delay
//! - HTML text, link and image extraction
//! - FIFO frontier and visited-set bookkeeping
//! - Overall crawl coordination under a page budget

mod coordinator;
mod fetcher;
mod frontier;
mod job;
mod parser;

pub use coordinator::{run_crawl, Crawler};
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher};
pub use frontier::{Frontier, VisitedSet};
pub use job::{CrawlJob, CrawlOutcome, Corpus, PageFailure, PageResult};
pub use parser::{ContentExtractor, ExtractedContent, HtmlExtractor};

