//! Crawl inputs and outputs

use crate::config::CrawlerConfig;
use crate::events::CrawlStatus;
use std::collections::HashSet;
use std::fmt;

/// A single crawl request
///
/// Immutable once the crawl starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    pub start_url: String,
    pub max_pages: usize,
    pub follow_links: bool,
    pub extract_images: bool,
    pub max_images: usize,
}

impl CrawlJob {
    /// Creates a job from the crawler section of the configuration
    pub fn from_config(start_url: impl Into<String>, config: &CrawlerConfig) -> Self {
        Self {
            start_url: start_url.into(),
            max_pages: config.max_pages,
            follow_links: config.follow_links,
            extract_images: config.extract_images,
            max_images: config.max_images,
        }
    }
}

/// Everything extracted from one fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub url: String,
    pub cleaned_text: String,
    /// Absolute URLs found on the page, in discovery order without duplicates
    pub discovered_urls: Vec<String>,
    /// Image URLs, only collected when the job asks for them
    pub image_urls: Option<Vec<String>>,
}

/// Aggregated page text in fetch order, pages separated by a blank line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    text: String,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a page's text
    ///
    /// The first page is taken as is; later pages are preceded by a blank line.
    pub fn push_page(&mut self, text: &str) {
        if !self.text.is_empty() {
            self.text.push_str("\n\n");
        }
        self.text.push_str(text);
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }
}

impl fmt::Display for Corpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub url: String,
    pub error: String,
}

/// Result of a crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub corpus: Corpus,
    /// Pages in fetch order
    pub pages: Vec<PageResult>,
    /// Links discovered on the most recently fetched page
    pub last_page_links: Vec<String>,
    /// Links discovered on any fetched page, in first-seen order
    pub all_links: Vec<String>,
    /// Image URLs of the most recently fetched page
    pub image_urls: Vec<String>,
    /// URLs that failed to fetch, in the order they were attempted
    pub failures: Vec<PageFailure>,
    /// Every URL marked visited, in visit order
    pub visited: Vec<String>,
    /// URLs still queued when the crawl stopped
    pub remaining_frontier: Vec<String>,
    /// The URL whose protection marker stopped the crawl
    pub aborted_at: Option<String>,
}

impl CrawlOutcome {
    /// Number of pages fetched and extracted
    pub fn pages_fetched(&self) -> usize {
        self.pages.len()
    }

    /// URLs of fetched pages, in fetch order
    pub fn fetch_order(&self) -> Vec<&str> {
        self.pages.iter().map(|page| page.url.as_str()).collect()
    }

    /// Final status reported to the caller
    pub fn status(&self) -> CrawlStatus {
        if self.corpus.is_empty() {
            CrawlStatus::NothingScraped
        } else {
            CrawlStatus::Finished {
                pages: self.pages_fetched(),
            }
        }
    }

    /// Records a fetched page
    ///
    /// The last-page link set and image URLs are overwritten by every page; the
    /// union link set only grows.
    pub(crate) fn record_page(&mut self, page: PageResult, seen_links: &mut HashSet<String>) {
        self.corpus.push_page(&page.cleaned_text);

        self.last_page_links = page.discovered_urls.clone();
        for link in &page.discovered_urls {
            if seen_links.insert(link.clone()) {
                self.all_links.push(link.clone());
            }
        }

        if let Some(images) = &page.image_urls {
            self.image_urls = images.clone();
        }

        self.pages.push(page);
    }
}
