//! Progress events surfaced to callers
//!
//! Crawls and extractions run to completion on their own; these events only let a
//! caller observe them while they run. Subscribing is optional and a receiver that
//! has gone away is ignored.

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Final status of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStatus {
    /// At least one page produced content
    Finished { pages: usize },
    /// Nothing was scraped
    NothingScraped,
}

/// Events emitted while a crawl runs
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    /// About to fetch a page (`index` is 1-based)
    Fetching { index: usize, max: usize, url: String },
    /// A page was fetched; `fraction` is pages fetched over the page budget
    Progress { fraction: f32, label: String },
    /// A single page failed and was skipped
    PageFailed { url: String, error: String },
    /// Bot protection was detected and the crawl stopped
    Aborted { url: String },
    /// The crawl is over
    Finished(CrawlStatus),
}

/// Events emitted while an extraction runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionEvent {
    /// A raw fragment streamed from the model
    Fragment(String),
    /// The combined result so far (after each chunk in chunked mode)
    Partial(String),
    /// A model call failed; the extraction stopped early
    Failed(String),
}

/// Optional event sender
#[derive(Debug)]
pub struct EventSink<T> {
    sender: Option<UnboundedSender<T>>,
}

impl<T> EventSink<T> {
    /// A sink that drops every event
    pub fn none() -> Self {
        Self { sender: None }
    }

    /// A sink that forwards events to the given channel
    pub fn new(sender: UnboundedSender<T>) -> Self {
        Self {
            sender: Some(sender),
        }
    }

    /// Creates a sink together with its receiving end
    pub fn channel() -> (Self, UnboundedReceiver<T>) {
        let (tx, rx) = unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Sends an event if anyone is listening
    pub fn emit(&self, event: T) {
        if let Some(sender) = &self.sender {
            // A dropped receiver just means nobody is watching anymore
            let _ = sender.send(event);
        }
    }

    /// Returns true if events are being forwarded
    pub fn is_active(&self) -> bool {
        self.sender.as_ref().is_some_and(|s| !s.is_closed())
    }
}

impl<T> Default for EventSink<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> Clone for EventSink<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}
