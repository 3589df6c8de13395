//! Fixed-width corpus chunking
//!
//! The corpus is sliced into sequential, non-overlapping windows of at most
//! `max_length` characters. Lengths are counted in `char`s so a window never
//! splits a multi-byte code point.

/// Chunk size used when the configuration does not override it
pub const DEFAULT_CHUNK_SIZE: usize = 6000;

/// Splits text into bounded-size sequential pieces
///
/// - Concatenating the returned chunks reproduces `text` exactly.
/// - Every chunk except possibly the last holds exactly `max_length` characters.
/// - Text no longer than `max_length` comes back as a single chunk.
/// - Empty text yields one empty chunk, so callers always get at least one piece.
///
/// A `max_length` of zero is treated as one.
///
/// # Examples
///
/// ```
/// use scrapesmart::chunker::split;
///
/// assert_eq!(split("abcdefg", 3), vec!["abc", "def", "g"]);
/// assert_eq!(split("", 3), vec![""]);
/// ```
pub fn split(text: &str, max_length: usize) -> Vec<String> {
    let max_length = max_length.max(1);

    if text.is_empty() {
        return vec![String::new()];
    }

    let mut chunks = Vec::with_capacity(text.len() / max_length + 1);
    let mut start = 0;
    let mut count = 0;

    for (offset, _) in text.char_indices() {
        if count == max_length {
            chunks.push(text[start..offset].to_string());
            start = offset;
            count = 0;
        }
        count += 1;
    }
    chunks.push(text[start..].to_string());

    chunks
}
