//! HTML content extraction
//!
//! This module turns fetched markup into:
//! - Cleaned plain text with inline `[url]` markers after every link
//! - The absolute URLs discovered on the page
//! - Resolved image URLs

use crate::url::{resolve_image_src, resolve_link};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose content never reaches the cleaned text
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Text and links extracted from a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContent {
    /// Cleaned text: one trimmed, non-empty line per text run
    pub text: String,

    /// Absolute http(s) URLs in discovery order, without duplicates
    pub links: Vec<String>,
}

/// Turns page markup into text, links and images
pub trait ContentExtractor: Send + Sync {
    /// Extracts cleaned text and discovered links
    fn extract(&self, markup: &str, base_url: &Url) -> ExtractedContent;

    /// Extracts up to `max_images` resolved image URLs in document order
    fn extract_images(&self, markup: &str, base_url: &Url, max_images: usize) -> Vec<String>;
}

/// `scraper`-based extractor
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ContentExtractor for HtmlExtractor {
    /// Extracts text and links from the page body
    ///
    /// # Text Rules
    ///
    /// - Only `<body>` is considered; no body means no text and no links
    /// - `script`, `style`, `noscript` and `template` subtrees are dropped
    /// - After every `<a href>` a marker `[url]` is emitted, using the resolved
    ///   absolute URL when the href resolves and the raw href otherwise (so
    ///   `mailto:` addresses stay visible to extraction)
    /// - Lines are trimmed and empty lines removed
    ///
    /// # Link Rules
    ///
    /// - `<a href>` targets resolved against the page URL
    /// - `javascript:`, `mailto:`, `tel:`, `data:` and fragment-only hrefs skipped
    /// - `<a download>` targets skipped
    /// - Only http and https kept
    fn extract(&self, markup: &str, base_url: &Url) -> ExtractedContent {
        let document = Html::parse_document(markup);

        let body_selector = match Selector::parse("body") {
            Ok(selector) => selector,
            Err(_) => return ExtractedContent::default(),
        };

        let body = match document.select(&body_selector).next() {
            Some(body) => body,
            None => return ExtractedContent::default(),
        };

        let mut walker = TextWalker {
            base_url,
            pieces: Vec::new(),
            links: Vec::new(),
            seen: HashSet::new(),
        };
        walker.walk(body);

        ExtractedContent {
            text: clean_lines(&walker.pieces.join("\n")),
            links: walker.links,
        }
    }

    fn extract_images(&self, markup: &str, base_url: &Url, max_images: usize) -> Vec<String> {
        if max_images == 0 {
            return Vec::new();
        }

        let document = Html::parse_document(markup);
        let img_selector = match Selector::parse("img[src]") {
            Ok(selector) => selector,
            Err(_) => return Vec::new(),
        };

        document
            .select(&img_selector)
            .filter_map(|img| img.value().attr("src"))
            .filter_map(|src| resolve_image_src(src, base_url))
            .take(max_images)
            .collect()
    }
}

/// Depth-first walk over the body collecting text runs and links
struct TextWalker<'a> {
    base_url: &'a Url,
    pieces: Vec<String>,
    links: Vec<String>,
    seen: HashSet<String>,
}

impl TextWalker<'_> {
    fn walk(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            if let Some(text) = child.value().as_text() {
                let text: &str = text;
                self.pieces.push(text.to_string());
                continue;
            }

            let Some(child_element) = ElementRef::wrap(child) else {
                continue;
            };

            let name = child_element.value().name();
            if SKIPPED_ELEMENTS.contains(&name) {
                continue;
            }

            self.walk(child_element);

            if name == "a" {
                if let Some(href) = child_element.value().attr("href") {
                    self.record_anchor(href, child_element.value().attr("download").is_some());
                }
            }
        }
    }

    fn record_anchor(&mut self, href: &str, is_download: bool) {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return;
        }

        match resolve_link(href, self.base_url) {
            Some(absolute) => {
                self.pieces.push(format!("[{}]", absolute));
                if !is_download && self.seen.insert(absolute.clone()) {
                    self.links.push(absolute);
                }
            }
            None => self.pieces.push(format!("[{}]", href)),
        }
    }
}

/// Trims every line and drops empty ones
fn clean_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
