//! State module for interactive sessions
//!
//! # Components
//!
//! - `SessionState`: corpus, link sets and images of the last scrape, plus the
//!   conversation history that spans scrapes
//! - `LastExtraction`: the latest extraction result and its table

mod session;

// Re-export main types
pub use session::{LastExtraction, SessionState};
