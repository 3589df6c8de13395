//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties together:
//! - The FIFO frontier and the visited set
//! - Bot-protection markers that abort the whole crawl
//! - Fetching, content extraction and optional image collection
//! - Link following under the page budget
//! - Progress events for callers

use crate::config::{Config, FetcherConfig};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::frontier::{Frontier, VisitedSet};
use crate::crawler::job::{CrawlJob, CrawlOutcome, PageFailure, PageResult};
use crate::crawler::parser::{ContentExtractor, HtmlExtractor};
use crate::events::{CrawlEvent, EventSink};
use crate::url::{matches_challenge_marker, parse_crawlable};
use crate::ScrapeError;
use std::collections::HashSet;

/// Crawl coordinator
///
/// Holds the collaborators a crawl needs; all per-crawl state lives inside
/// [`Crawler::crawl`], so one crawler can run any number of jobs one after another.
pub struct Crawler {
    fetcher: Box<dyn PageFetcher>,
    extractor: Box<dyn ContentExtractor>,
    challenge_markers: Vec<String>,
}

impl Crawler {
    /// Creates a crawler from explicit collaborators
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Turns URLs into markup
    /// * `extractor` - Turns markup into text, links and images
    /// * `challenge_markers` - URL substrings that abort the crawl when popped
    pub fn new(
        fetcher: Box<dyn PageFetcher>,
        extractor: Box<dyn ContentExtractor>,
        challenge_markers: Vec<String>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            challenge_markers,
        }
    }

    /// Creates an HTTP crawler from the fetcher section of the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Crawler using [`HttpFetcher`] and [`HtmlExtractor`]
    /// * `Err(ScrapeError)` - The HTTP client could not be built
    pub fn from_config(config: &FetcherConfig) -> Result<Self, ScrapeError> {
        let fetcher = HttpFetcher::new(config)?;
        Ok(Self::new(
            Box::new(fetcher),
            Box::new(HtmlExtractor::new()),
            config.challenge_markers.clone(),
        ))
    }

    /// Runs a crawl job to completion
    ///
    /// # Crawl Loop
    ///
    /// While the frontier is non-empty and fewer than `max_pages` pages were fetched:
    ///
    /// 1. Pop the head of the frontier
    /// 2. If it contains a protection marker, abort the whole crawl
    /// 3. Skip it if already visited or not http(s) (no budget used)
    /// 4. Mark visited and fetch; a fetch failure is recorded and skipped,
    ///    a challenge page aborts the crawl
    /// 5. Extract text and links (and images when the job asks for them)
    /// 6. Append the text to the corpus and record the page's links
    /// 7. Report progress as pages fetched over `max_pages`
    /// 8. If following links and budget remains, queue every discovered URL that
    ///    is neither visited nor queued, in discovery order
    ///
    /// Never fails: whatever was accumulated is returned, and the final status is
    /// both logged and emitted as [`CrawlEvent::Finished`].
    pub async fn crawl(&self, job: &CrawlJob, events: &EventSink<CrawlEvent>) -> CrawlOutcome {
        tracing::info!(
            "Starting crawl of {} (max pages: {}, follow links: {})",
            job.start_url,
            job.max_pages,
            job.follow_links
        );

        let mut frontier = Frontier::seeded(job.start_url.clone());
        let mut visited = VisitedSet::new();
        let mut seen_links = HashSet::new();
        let mut outcome = CrawlOutcome::default();

        while outcome.pages_fetched() < job.max_pages {
            // Get next URL from the frontier
            let current_url = match frontier.pop() {
                Some(url) => url,
                None => {
                    tracing::debug!("Frontier is empty, crawl complete");
                    break;
                }
            };

            // Protection markers stop everything, before any other check
            if let Some(marker) = matches_challenge_marker(&current_url, &self.challenge_markers)
            {
                tracing::warn!(
                    "Bot protection marker '{}' found in {}, aborting crawl",
                    marker,
                    current_url
                );
                events.emit(CrawlEvent::Aborted {
                    url: current_url.clone(),
                });
                outcome.aborted_at = Some(current_url);
                break;
            }

            if visited.contains(&current_url) {
                tracing::trace!("Skipping already visited URL: {}", current_url);
                continue;
            }

            let base_url = match parse_crawlable(&current_url) {
                Some(url) => url,
                None => {
                    tracing::debug!("Skipping URL with unsupported scheme: {}", current_url);
                    continue;
                }
            };

            visited.insert(current_url.clone());
            events.emit(CrawlEvent::Fetching {
                index: outcome.pages_fetched() + 1,
                max: job.max_pages,
                url: current_url.clone(),
            });

            let markup = match self.fetcher.fetch(&current_url).await {
                Ok(markup) => markup,
                Err(e) if e.is_abort() => {
                    tracing::warn!("Challenge page served by {}, aborting crawl", current_url);
                    events.emit(CrawlEvent::Aborted {
                        url: current_url.clone(),
                    });
                    outcome.aborted_at = Some(current_url);
                    break;
                }
                Err(e) => {
                    tracing::warn!("Error scraping {}: {}", current_url, e);
                    events.emit(CrawlEvent::PageFailed {
                        url: current_url.clone(),
                        error: e.to_string(),
                    });
                    outcome.failures.push(PageFailure {
                        url: current_url,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let content = self.extractor.extract(&markup, &base_url);
            let image_urls = job.extract_images.then(|| {
                self.extractor
                    .extract_images(&markup, &base_url, job.max_images)
            });

            let discovered = content.links;
            outcome.record_page(
                PageResult {
                    url: current_url.clone(),
                    cleaned_text: content.text,
                    discovered_urls: discovered.clone(),
                    image_urls,
                },
                &mut seen_links,
            );

            let pages = outcome.pages_fetched();
            tracing::info!(
                "Scraped {} ({}/{}, {} links found)",
                current_url,
                pages,
                job.max_pages,
                discovered.len()
            );
            events.emit(CrawlEvent::Progress {
                fraction: pages as f32 / job.max_pages as f32,
                label: format!("Scraped {}/{} pages", pages, job.max_pages),
            });

            if job.follow_links && pages < job.max_pages {
                let mut queued = 0;
                for link in discovered {
                    if !visited.contains(&link) && frontier.push(link) {
                        queued += 1;
                    }
                }
                tracing::debug!("Queued {} new URLs ({} in frontier)", queued, frontier.len());
            }
        }

        outcome.visited = visited.into_vec();
        outcome.remaining_frontier = frontier.into_vec();

        let status = outcome.status();
        if outcome.corpus.is_empty() {
            tracing::warn!("No content was successfully scraped");
        } else {
            tracing::info!(
                "Crawl completed: {} pages scraped, {} failed, {} characters of text",
                outcome.pages_fetched(),
                outcome.failures.len(),
                outcome.corpus.len()
            );
        }
        events.emit(CrawlEvent::Finished(status));

        outcome
    }
}

/// Runs a single crawl over HTTP using the configuration
///
/// # Arguments
///
/// * `start_url` - The first URL to fetch
/// * `config` - Crawler and fetcher settings
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - The crawl ran (it may still have scraped nothing)
/// * `Err(ScrapeError)` - The start URL is not http(s) or the client failed to build
///
/// # Example
///
/// ```no_run
/// use scrapesmart::config::Config;
/// use scrapesmart::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = run_crawl("https://example.com/", &Config::default()).await?;
/// println!("{}", outcome.corpus);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(start_url: &str, config: &Config) -> Result<CrawlOutcome, ScrapeError> {
    if parse_crawlable(start_url).is_none() {
        return Err(ScrapeError::InvalidStartUrl(start_url.to_string()));
    }

    let crawler = Crawler::from_config(&config.fetcher)?;
    let job = CrawlJob::from_config(start_url, &config.crawler);
    Ok(crawler.crawl(&job, &EventSink::none()).await)
}
