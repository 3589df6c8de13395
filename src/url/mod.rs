//! URL handling module for ScrapeSmart
//!
//! This module provides scheme filtering for the crawl frontier, link and image
//! resolution against the page URL, and bot-protection marker matching.

mod matcher;
mod resolve;

use url::Url;

// Re-export main functions
pub use matcher::{is_challenge_page, matches_challenge_marker, CHALLENGE_BODY_MARKERS};
pub use resolve::{resolve_image_src, resolve_link};

/// Schemes the crawler is allowed to fetch
pub const ALLOWED_SCHEMES: &[&str] = &["http://", "https://"];

/// Returns true if the URL string starts with an allowed scheme
///
/// # Examples
///
/// ```
/// use scrapesmart::url::has_allowed_scheme;
///
/// assert!(has_allowed_scheme("https://example.com/"));
/// assert!(has_allowed_scheme("http://example.com/"));
/// assert!(!has_allowed_scheme("ftp://example.com/"));
/// assert!(!has_allowed_scheme("example.com"));
/// ```
pub fn has_allowed_scheme(url: &str) -> bool {
    ALLOWED_SCHEMES.iter().any(|scheme| url.starts_with(scheme))
}

/// Parses a frontier entry, returning None if it cannot be crawled
///
/// An entry is crawlable when it uses an allowed scheme and parses as a URL
/// with a host.
pub fn parse_crawlable(url: &str) -> Option<Url> {
    if !has_allowed_scheme(url) {
        return None;
    }

    Url::parse(url).ok().filter(|parsed| parsed.host_str().is_some())
}
