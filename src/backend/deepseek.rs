//! DeepSeek backend over an OpenAI-compatible chat completions API
//!
//! The system instruction is sent as the first message of every request and is
//! never part of the persisted history.

use crate::backend::{snippet, status_error, BackendError, FragmentStream, ModelBackend, SseStream};
use crate::extraction::{Role, Turn};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Raw streaming chunk
#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Streams chat completions for DeepSeek models
pub struct DeepSeekBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl DeepSeekBackend {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl ModelBackend for DeepSeekBackend {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn stream_generate(
        &self,
        history: &[Turn],
        system_instruction: &str,
    ) -> Result<FragmentStream, BackendError> {
        if self.api_key.is_empty() {
            return Err(BackendError::MissingApiKey("DeepSeek".to_string()));
        }

        let body = build_request(&self.model, history, system_instruction);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("DeepSeek streaming request failed: {}", e);
                BackendError::Http(e)
            })?;

        if !response.status().is_success() {
            let error = status_error(response).await;
            tracing::warn!("DeepSeek API error: {}", error);
            return Err(error);
        }

        let fragments = SseStream::new(response.bytes_stream())
            .map(|payload| payload.and_then(|data| parse_chunk(&data)));
        Ok(Box::pin(fragments))
    }
}

/// Transcodes the normalized history into a chat request, system message first
fn build_request<'a>(
    model: &'a str,
    history: &'a [Turn],
    system_instruction: &'a str,
) -> ChatRequest<'a> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.push(Message {
        role: "system",
        content: system_instruction,
    });
    messages.extend(history.iter().map(|turn| Message {
        role: match turn.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        },
        content: &turn.content,
    }));

    ChatRequest {
        model,
        messages,
        stream: true,
    }
}

/// Extracts the delta text of one streamed chunk
fn parse_chunk(data: &str) -> Result<String, BackendError> {
    let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
        BackendError::Parse(format!("{} (data: {})", e, snippet(data)))
    })?;

    if let Some(error) = chunk.error {
        return Err(BackendError::Stream(error.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta)
        .and_then(|delta| delta.content)
        .unwrap_or_default())
}
