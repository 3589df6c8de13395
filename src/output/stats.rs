//! Crawl statistics for reporting
//!
//! This module condenses a crawl outcome into counts and prints them.

use crate::crawler::CrawlOutcome;
use std::collections::HashSet;
use url::Url;

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Pages fetched and extracted
    pub pages_scraped: usize,

    /// URLs attempted (scraped or failed)
    pub pages_visited: usize,

    /// Pages whose fetch failed
    pub pages_failed: usize,

    /// URLs still queued when the crawl stopped
    pub frontier_remaining: usize,

    /// Number of unique hosts among scraped pages
    pub unique_domains: usize,

    /// Links discovered on the last page
    pub last_page_links: usize,

    /// Links discovered across all pages
    pub total_links: usize,

    /// Image URLs collected
    pub images: usize,

    /// Characters of aggregated text
    pub corpus_chars: usize,

    /// URL that stopped the crawl, if any
    pub aborted_at: Option<String>,

    /// Failure message per failed URL
    pub failures: Vec<(String, String)>,
}

impl CrawlStatistics {
    /// Collects statistics from a finished crawl
    pub fn from_outcome(outcome: &CrawlOutcome) -> Self {
        let unique_domains = outcome
            .pages
            .iter()
            .filter_map(|page| Url::parse(&page.url).ok())
            .filter_map(|url| url.host_str().map(str::to_string))
            .collect::<HashSet<_>>()
            .len();

        Self {
            pages_scraped: outcome.pages_fetched(),
            pages_visited: outcome.visited.len(),
            pages_failed: outcome.failures.len(),
            frontier_remaining: outcome.remaining_frontier.len(),
            unique_domains,
            last_page_links: outcome.last_page_links.len(),
            total_links: outcome.all_links.len(),
            images: outcome.image_urls.len(),
            corpus_chars: outcome.corpus.as_str().chars().count(),
            aborted_at: outcome.aborted_at.clone(),
            failures: outcome
                .failures
                .iter()
                .map(|f| (f.url.clone(), f.error.clone()))
                .collect(),
        }
    }

    /// Share of attempted pages that were scraped, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_visited == 0 {
            return 0.0;
        }
        (self.pages_scraped as f64 / self.pages_visited as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    if stats.pages_scraped == 0 {
        println!("No content was successfully scraped");
        println!();
    }

    println!("Overview:");
    println!("  Pages scraped: {}", stats.pages_scraped);
    println!("  Unique domains: {}", stats.unique_domains);
    println!("  Characters of text: {}", stats.corpus_chars);
    println!(
        "  Links found: {} on last page, {} overall",
        stats.last_page_links, stats.total_links
    );
    println!("  Images found: {}", stats.images);
    println!("  Still queued: {}", stats.frontier_remaining);
    println!();

    if !stats.failures.is_empty() {
        println!("Failed Pages ({}):", stats.failures.len());
        for (url, error) in &stats.failures {
            println!("  - {}: {}", url, error);
        }
        println!();
    }

    if let Some(url) = &stats.aborted_at {
        println!("Crawl stopped: bot protection detected at {}", url);
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages successfully scraped)",
        stats.success_rate(),
        stats.pages_scraped,
        stats.pages_visited
    );
}
