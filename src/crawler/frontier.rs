//! Frontier and visited-set bookkeeping for a single crawl
//!
//! This module handles:
//! - FIFO ordering of URLs waiting to be fetched
//! - Rejecting URLs that are already queued
//! - Remembering every URL marked visited, in visit order

use std::collections::{HashSet, VecDeque};

/// FIFO queue of URLs awaiting fetch
///
/// New URLs go to the tail and are never inserted ahead of existing entries.
/// A URL is present at most once at any time.
#[derive(Debug, Default)]
pub struct Frontier {
    /// URLs in fetch order
    queue: VecDeque<String>,

    /// Membership index for `queue`
    queued: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier holding only the seed URL
    pub fn seeded(seed: impl Into<String>) -> Self {
        let mut frontier = Self::new();
        frontier.push(seed);
        frontier
    }

    /// Appends a URL at the tail
    ///
    /// # Returns
    ///
    /// * `true` - The URL was queued
    /// * `false` - The URL was already in the queue
    pub fn push(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.queued.contains(&url) {
            return false;
        }
        self.queued.insert(url.clone());
        self.queue.push_back(url);
        true
    }

    /// Removes and returns the head of the queue
    pub fn pop(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.queued.remove(&url);
        Some(url)
    }

    /// Returns the number of queued URLs
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether the frontier is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Consumes the frontier, returning the queued URLs in order
    pub fn into_vec(self) -> Vec<String> {
        self.queue.into()
    }
}

/// URLs already fetched (or attempted) during a crawl
///
/// Grows monotonically; there is no way to remove an entry.
#[derive(Debug, Default)]
pub struct VisitedSet {
    seen: HashSet<String>,
    order: Vec<String>,
}

impl VisitedSet {
    /// Creates an empty visited set
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a URL visited
    ///
    /// Returns false if it had already been visited.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.order.push(url);
        true
    }

    /// Returns true if the URL has been visited
    pub fn contains(&self, url: &str) -> bool {
        self.seen.contains(url)
    }

    /// Returns the number of visited URLs
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether nothing has been visited
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Consumes the set, returning URLs in visit order
    pub fn into_vec(self) -> Vec<String> {
        self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_frontier() {
        let frontier = Frontier::new();
        assert_eq!(frontier.len(), 0);
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_seeded_frontier() {
        let mut frontier = Frontier::seeded("https://example.com/");
        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.pop().as_deref(), Some("https://example.com/"));
        assert!(frontier.pop().is_none());
    }

    #[test]
    fn test_fifo_order() {
        let mut frontier = Frontier::new();
        frontier.push("https://a.com");
        frontier.push("https://b.com");
        frontier.push("https://c.com");

        assert_eq!(frontier.pop().as_deref(), Some("https://a.com"));
        frontier.push("https://d.com");
        assert_eq!(
            frontier.into_vec(),
            vec!["https://b.com", "https://c.com", "https://d.com"]
        );
    }

    #[test]
    fn test_duplicate_rejected_while_queued() {
        let mut frontier = Frontier::new();
        assert!(frontier.push("https://a.com"));
        assert!(!frontier.push("https://a.com"));
        assert_eq!(frontier.len(), 1);
    }

    #[test]
    fn test_url_can_requeue_after_pop() {
        let mut frontier = Frontier::seeded("https://a.com");
        frontier.pop();
        assert!(frontier.is_empty());
        assert!(frontier.push("https://a.com"));
    }

    #[test]
    fn test_visited_set_never_duplicates() {
        let mut visited = VisitedSet::new();
        assert!(visited.insert("https://a.com"));
        assert!(visited.insert("https://b.com"));
        assert!(!visited.insert("https://a.com"));

        assert_eq!(visited.len(), 2);
        assert!(visited.contains("https://b.com"));
        assert_eq!(visited.into_vec(), vec!["https://a.com", "https://b.com"]);
    }
}
