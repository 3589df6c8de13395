//! Scrape-then-ask pipeline
//!
//! Wires the crawler, the chunker, the extraction engine and table coercion
//! together over an explicit [`SessionState`].

use crate::backend::build_backend;
use crate::chunker::split;
use crate::config::Config;
use crate::crawler::{CrawlJob, CrawlOutcome, Crawler};
use crate::events::{CrawlEvent, EventSink, ExtractionEvent};
use crate::extraction::{ExtractionEngine, ExtractionRequest};
use crate::state::SessionState;
use crate::table::{to_table, StructuredTable};
use crate::url::parse_crawlable;
use crate::{ConfigError, ScrapeError};

/// Result of one question asked of the session
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Raw model output
    pub text: String,
    /// The output coerced into a table; empty when it holds no table
    pub table: StructuredTable,
    /// Set when the model call failed part way
    pub error: Option<String>,
}

/// Crawler plus extraction engine under one configuration
pub struct Pipeline {
    config: Config,
    crawler: Crawler,
    engine: Option<ExtractionEngine>,
}

impl Pipeline {
    /// Builds the HTTP crawler and the configured model backend
    ///
    /// A missing API key does not stop the pipeline from being built; scraping
    /// still works and [`Pipeline::ask`] reports the missing key.
    ///
    /// # Returns
    ///
    /// * `Ok(Pipeline)` - Ready to scrape
    /// * `Err(ScrapeError)` - Unsupported model or HTTP client failure
    pub fn from_config(config: Config) -> Result<Self, ScrapeError> {
        let crawler = Crawler::from_config(&config.fetcher)?;

        let engine = match build_backend(&config.model) {
            Ok(backend) => Some(ExtractionEngine::new(backend)),
            Err(ConfigError::MissingApiKey { provider, env_var }) => {
                tracing::warn!(
                    "No API key for {} (set {}); extraction is unavailable",
                    provider,
                    env_var
                );
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            config,
            crawler,
            engine,
        })
    }

    /// Builds a pipeline from explicit parts
    pub fn with_parts(config: Config, crawler: Crawler, engine: ExtractionEngine) -> Self {
        Self {
            config,
            crawler,
            engine: Some(engine),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Links discovered by the session's last scrape, under the configured
    /// `link-set` policy
    pub fn discovered_links<'a>(&self, state: &'a SessionState) -> &'a [String] {
        state.links(self.config.crawler.link_set)
    }

    /// Crawls from `start_url` and stores the results in the session
    ///
    /// Corpus, links and images of any previous scrape are replaced; the
    /// conversation history is kept.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlOutcome)` - The crawl ran, possibly scraping nothing
    /// * `Err(ScrapeError::InvalidStartUrl)` - The URL is not http(s); the
    ///   session is left untouched
    pub async fn scrape(
        &self,
        state: &mut SessionState,
        start_url: &str,
        events: &EventSink<CrawlEvent>,
    ) -> Result<CrawlOutcome, ScrapeError> {
        let start_url = start_url.trim();
        if parse_crawlable(start_url).is_none() {
            return Err(ScrapeError::InvalidStartUrl(start_url.to_string()));
        }

        state.begin_scrape(start_url);

        let job = CrawlJob::from_config(start_url, &self.config.crawler);
        let outcome = self.crawler.crawl(&job, events).await;

        state.apply_crawl(&outcome);
        Ok(outcome)
    }

    /// Asks the model to extract `description` from the session's corpus
    ///
    /// # Flow
    ///
    /// 1. Pick the content: no corpus means a conversational answer; with
    ///    chunking on the corpus is split into `chunk-size` pieces, otherwise
    ///    it is passed whole
    /// 2. Run the extraction over the session history
    /// 3. Store the updated history and coerce the output into a table
    ///
    /// A model failure is not an error here: the partial answer is returned with
    /// `error` set.
    ///
    /// # Returns
    ///
    /// * `Ok(Answer)` - Model output and its table
    /// * `Err(ScrapeError)` - No model backend is available
    pub async fn ask(
        &self,
        state: &mut SessionState,
        description: &str,
        events: &EventSink<ExtractionEvent>,
    ) -> Result<Answer, ScrapeError> {
        let engine = match &self.engine {
            Some(engine) => engine,
            None => {
                return Err(ConfigError::MissingApiKey {
                    provider: self.config.model.provider()?.display_name().to_string(),
                    env_var: self.config.model.key_env()?,
                }
                .into())
            }
        };

        let chunking = self.config.crawler.chunking;
        let content = if !state.has_corpus() {
            Vec::new()
        } else if chunking {
            split(&state.corpus, self.config.crawler.chunk_size)
        } else {
            vec![state.corpus.clone()]
        };

        let request = ExtractionRequest::new(description, chunking);
        let history = std::mem::take(&mut state.history);
        let result = engine.extract(&content, &request, history, events).await;

        if !result.is_complete() {
            tracing::warn!(
                "Extraction of '{}' stopped early; keeping {} characters of partial output",
                description,
                result.combined_text.len()
            );
        }

        let table = to_table(&result.combined_text);
        tracing::debug!(
            "Extraction produced {} characters, {} table rows",
            result.combined_text.len(),
            table.len()
        );

        state.history = result.history;
        state.record_extraction(description, &result.combined_text, table.clone());

        Ok(Answer {
            text: result.combined_text,
            table,
            error: result.error,
        })
    }
}
