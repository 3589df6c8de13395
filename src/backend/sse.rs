//! Server-sent events decoder for streaming model responses
//!
//! Converts a raw `reqwest` byte stream into the payloads of its `data:` lines.
//! Handles lines split across byte chunks, `data: [DONE]`, comments and other
//! SSE fields.

use crate::backend::BackendError;
use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Terminal payload used by OpenAI-compatible APIs
const DONE_SENTINEL: &str = "[DONE]";

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// Stream adapter yielding the payload of every `data:` line
pub struct SseStream {
    inner: ByteStream,
    buffer: Vec<u8>,
    finished: bool,
}

impl SseStream {
    pub fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: Vec::new(),
            finished: false,
        }
    }

    /// Pops complete lines off the buffer until one carries data
    fn next_payload(&mut self) -> Option<Result<String, BackendError>> {
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            match parse_line(&line) {
                Some(Ok(payload)) if payload == DONE_SENTINEL => {
                    self.finished = true;
                    return None;
                }
                Some(result) => return Some(result),
                None => continue,
            }
        }
        None
    }
}

impl Stream for SseStream {
    type Item = Result<String, BackendError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            if let Some(payload) = this.next_payload() {
                return Poll::Ready(Some(payload));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    this.finished = true;
                    return Poll::Ready(Some(Err(BackendError::Stream(e.to_string()))));
                }
                Poll::Ready(None) => {
                    // A final line may arrive without its trailing newline
                    this.finished = true;
                    let rest = std::mem::take(&mut this.buffer);
                    return match parse_line(&rest) {
                        Some(Ok(payload)) if payload == DONE_SENTINEL => Poll::Ready(None),
                        other => Poll::Ready(other),
                    };
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Extracts the payload of a `data:` line
///
/// Returns `None` for blank lines, comments and non-data fields.
fn parse_line(line: &[u8]) -> Option<Result<String, BackendError>> {
    let line = match std::str::from_utf8(line) {
        Ok(line) => line.trim(),
        Err(e) => {
            return Some(Err(BackendError::Parse(format!(
                "Invalid UTF-8 in stream: {}",
                e
            ))))
        }
    };

    line.strip_prefix("data:")
        .map(|data| Ok(data.trim().to_string()))
}
