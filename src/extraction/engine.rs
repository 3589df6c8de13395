//! Conversational extraction engine
//!
//! This module drives model calls over crawled content:
//! - Chunked mode: one call per chunk, each seeing every earlier exchange
//! - Single-shot mode: one call over the whole corpus
//! - Conversational mode: a stateless call when there is no content at all
//!
//! Model failures never escape; they end the extraction early and are reported
//! in the result alongside whatever was produced before the failure.

use crate::backend::{BackendError, ModelBackend};
use crate::events::{EventSink, ExtractionEvent};
use crate::extraction::history::{ConversationHistory, Turn};
use crate::extraction::prompt::{chunk_input, construct_prompt, full_input, CONVERSATIONAL_INSTRUCTION};
use futures::StreamExt;

/// A single extraction call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
    /// What to pull out of the content, in natural language
    pub description: String,
    /// One model call per chunk instead of one call over everything
    pub chunking: bool,
}

impl ExtractionRequest {
    pub fn new(description: impl Into<String>, chunking: bool) -> Self {
        Self {
            description: description.into(),
            chunking,
        }
    }
}

/// Outcome of an extraction call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    /// Trimmed model output; per-chunk outputs joined by newlines in chunked mode
    pub combined_text: String,
    /// The history after the call
    pub history: ConversationHistory,
    /// Set when a model call failed and the extraction stopped early
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Runs extraction calls against one model backend
pub struct ExtractionEngine {
    backend: Box<dyn ModelBackend>,
}

impl ExtractionEngine {
    pub fn new(backend: Box<dyn ModelBackend>) -> Self {
        Self { backend }
    }

    /// Model id of the backend in use
    pub fn model_id(&self) -> &str {
        self.backend.model_id()
    }

    /// Extracts data matching the request from the given content
    ///
    /// # Arguments
    ///
    /// * `content` - Chunks of the corpus in order; the whole corpus is one chunk
    ///   when chunking is off
    /// * `request` - Description and chunking flag
    /// * `history` - The session history, returned updated in the result
    /// * `events` - Receives streamed fragments and running results
    ///
    /// # Strategy
    ///
    /// | Content | `chunking` | Strategy |
    /// |---------|------------|----------|
    /// | empty or blank | any | conversational, history untouched |
    /// | present | true | one exchange per chunk with non-empty output |
    /// | present | false | one exchange over the pieces joined by blank lines |
    pub async fn extract(
        &self,
        content: &[String],
        request: &ExtractionRequest,
        history: ConversationHistory,
        events: &EventSink<ExtractionEvent>,
    ) -> ExtractionResult {
        if content.iter().all(|chunk| chunk.trim().is_empty()) {
            return self.converse(&request.description, history, events).await;
        }

        if request.chunking {
            self.extract_chunked(content, &request.description, history, events)
                .await
        } else {
            self.extract_whole(&content.join("\n\n"), &request.description, history, events)
                .await
        }
    }

    /// One model call per chunk, each seeing all earlier exchanges
    async fn extract_chunked(
        &self,
        chunks: &[String],
        description: &str,
        mut history: ConversationHistory,
        events: &EventSink<ExtractionEvent>,
    ) -> ExtractionResult {
        let system_instruction = construct_prompt(description);
        let mut outputs: Vec<String> = Vec::new();

        tracing::info!(
            "Extracting '{}' over {} chunks with {}",
            description,
            chunks.len(),
            self.model_id()
        );

        for (index, chunk) in chunks.iter().enumerate() {
            let user_turn = Turn::user(chunk_input(chunk, description));
            let turns = history.with_pending(&user_turn);

            let response = match self.stream_response(&turns, &system_instruction, events).await {
                Ok(response) => response,
                Err(e) => {
                    return failed(outputs.join("\n"), history, &e, events);
                }
            };

            let response = response.trim();
            if response.is_empty() {
                tracing::debug!("Chunk {}/{} produced no output", index + 1, chunks.len());
                continue;
            }

            history.push_exchange(user_turn, Turn::assistant(response));
            outputs.push(response.to_string());
            events.emit(ExtractionEvent::Partial(outputs.join("\n")));
        }

        ExtractionResult {
            combined_text: outputs.join("\n"),
            history,
            error: None,
        }
    }

    /// One model call over the whole content
    async fn extract_whole(
        &self,
        content: &str,
        description: &str,
        mut history: ConversationHistory,
        events: &EventSink<ExtractionEvent>,
    ) -> ExtractionResult {
        let system_instruction = construct_prompt(description);
        let user_turn = Turn::user(full_input(content, description));
        let turns = history.with_pending(&user_turn);

        tracing::info!(
            "Extracting '{}' over {} characters with {}",
            description,
            content.len(),
            self.model_id()
        );

        let response = match self.stream_response(&turns, &system_instruction, events).await {
            Ok(response) => response,
            Err(e) => return failed(String::new(), history, &e, events),
        };

        let response = response.trim().to_string();
        if !response.is_empty() {
            history.push_exchange(user_turn, Turn::assistant(response.clone()));
            events.emit(ExtractionEvent::Partial(response.clone()));
        }

        ExtractionResult {
            combined_text: response,
            history,
            error: None,
        }
    }

    /// Stateless single call used when there is nothing to extract from
    async fn converse(
        &self,
        description: &str,
        history: ConversationHistory,
        events: &EventSink<ExtractionEvent>,
    ) -> ExtractionResult {
        tracing::info!("No content to extract from, answering conversationally");

        let turns = [Turn::user(description)];
        match self
            .stream_response(&turns, CONVERSATIONAL_INSTRUCTION, events)
            .await
        {
            Ok(response) => {
                let response = response.trim().to_string();
                events.emit(ExtractionEvent::Partial(response.clone()));
                ExtractionResult {
                    combined_text: response,
                    history,
                    error: None,
                }
            }
            Err(e) => failed(String::new(), history, &e, events),
        }
    }

    /// Runs one model call and accumulates every streamed fragment
    async fn stream_response(
        &self,
        turns: &[Turn],
        system_instruction: &str,
        events: &EventSink<ExtractionEvent>,
    ) -> Result<String, BackendError> {
        let mut stream = self
            .backend
            .stream_generate(turns, system_instruction)
            .await?;

        let mut response = String::new();
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            if fragment.is_empty() {
                continue;
            }
            tracing::trace!("Received fragment of {} bytes", fragment.len());
            response.push_str(&fragment);
            events.emit(ExtractionEvent::Fragment(fragment));
        }

        Ok(response)
    }
}

/// Builds the result for an extraction that stopped on a model failure
fn failed(
    combined_text: String,
    history: ConversationHistory,
    error: &BackendError,
    events: &EventSink<ExtractionEvent>,
) -> ExtractionResult {
    let message = format!("An error occurred during extraction: {}", error);
    tracing::error!("{}", message);
    events.emit(ExtractionEvent::Failed(message.clone()));

    ExtractionResult {
        combined_text,
        history,
        error: Some(message),
    }
}
