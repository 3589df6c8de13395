//! Session state carried between scrapes and extractions
//!
//! A session is owned by its caller and handed to every operation by `&mut`;
//! nothing in the crate keeps session data anywhere else.

use crate::config::LinkSetPolicy;
use crate::crawler::CrawlOutcome;
use crate::extraction::ConversationHistory;
use crate::table::StructuredTable;

/// The most recent extraction in a session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastExtraction {
    pub description: String,
    pub text: String,
    pub table: StructuredTable,
}

/// Everything one interactive session knows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// URL the current corpus was crawled from
    pub start_url: Option<String>,

    /// Aggregated page text of the last scrape
    pub corpus: String,

    /// Links of the last scraped page
    pub last_page_links: Vec<String>,

    /// Links of every page of the last scrape
    pub all_links: Vec<String>,

    /// Image URLs of the last scraped page
    pub image_urls: Vec<String>,

    /// Conversation history; survives new scrapes
    pub history: ConversationHistory,

    /// Result of the latest extraction
    pub last_extraction: Option<LastExtraction>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a scrape produced text to extract from
    pub fn has_corpus(&self) -> bool {
        !self.corpus.is_empty()
    }

    /// Clears everything a previous scrape produced
    ///
    /// The conversation history is kept so the model still sees earlier
    /// exchanges.
    pub fn begin_scrape(&mut self, start_url: &str) {
        self.start_url = Some(start_url.to_string());
        self.corpus.clear();
        self.last_page_links.clear();
        self.all_links.clear();
        self.image_urls.clear();
    }

    /// Stores the results of a finished crawl
    pub fn apply_crawl(&mut self, outcome: &CrawlOutcome) {
        self.corpus = outcome.corpus.as_str().to_string();
        self.last_page_links = outcome.last_page_links.clone();
        self.all_links = outcome.all_links.clone();
        self.image_urls = outcome.image_urls.clone();
    }

    /// The session's link set under the chosen policy
    pub fn links(&self, policy: LinkSetPolicy) -> &[String] {
        match policy {
            LinkSetPolicy::LastPage => &self.last_page_links,
            LinkSetPolicy::Union => &self.all_links,
        }
    }

    /// Records the latest extraction
    pub fn record_extraction(&mut self, description: &str, text: &str, table: StructuredTable) {
        self.last_extraction = Some(LastExtraction {
            description: description.to_string(),
            text: text.to_string(),
            table,
        });
    }
}
