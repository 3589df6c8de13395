//! Google Gemini backend
//!
//! Turns are sent as `contents` with roles `user` and `model`; the system
//! instruction travels out of band in `systemInstruction`.

use crate::backend::{snippet, status_error, BackendError, FragmentStream, ModelBackend, SseStream};
use crate::extraction::{Role, Turn};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

/// One streamed response chunk
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

/// Streams completions from the Gemini `streamGenerateContent` endpoint
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiBackend {
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

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ModelBackend for GeminiBackend {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn stream_generate(
        &self,
        history: &[Turn],
        system_instruction: &str,
    ) -> Result<FragmentStream, BackendError> {
        if self.api_key.is_empty() {
            return Err(BackendError::MissingApiKey("Google Gemini".to_string()));
        }

        let body = build_request(history, system_instruction);
        let response = self
            .client
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Gemini streaming request failed: {}", e);
                BackendError::Http(e)
            })?;

        if !response.status().is_success() {
            let error = status_error(response).await;
            tracing::warn!("Gemini API error: {}", error);
            return Err(error);
        }

        let fragments = SseStream::new(response.bytes_stream())
            .map(|payload| payload.and_then(|data| parse_chunk(&data)));
        Ok(Box::pin(fragments))
    }
}

/// Transcodes the normalized history into a Gemini request body
fn build_request<'a>(history: &'a [Turn], system_instruction: &'a str) -> GenerateRequest<'a> {
    GenerateRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part {
                text: system_instruction,
            }],
        },
        contents: history
            .iter()
            .map(|turn| Content {
                role: Some(match turn.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                }),
                parts: vec![Part {
                    text: &turn.content,
                }],
            })
            .collect(),
    }
}

/// Extracts the text of one streamed chunk
fn parse_chunk(data: &str) -> Result<String, BackendError> {
    let chunk: GenerateChunk = serde_json::from_str(data).map_err(|e| {
        BackendError::Parse(format!("{} (data: {})", e, snippet(data)))
    })?;

    if let Some(error) = chunk.error {
        return Err(BackendError::Stream(error.message));
    }

    Ok(chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_roles_and_system_instruction() {
        let history = vec![
            Turn::user("Text content: a\n\nDescription: x"),
            Turn::assistant("| a |"),
            Turn::user("Text content: b\n\nDescription: x"),
        ];
        let body = serde_json::to_value(build_request(&history, "extract x")).unwrap();

        assert_eq!(
            body["systemInstruction"],
            serde_json::json!({"parts": [{"text": "extract x"}]})
        );
        let roles: Vec<&str> = body["contents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(body["contents"][1]["parts"][0]["text"], "| a |");
    }

    #[test]
    fn test_parse_chunk_joins_parts() {
        let data = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#;
        assert_eq!(parse_chunk(data).unwrap(), "Hello");
    }

    #[test]
    fn test_parse_chunk_without_text() {
        let data = r#"{"candidates":[{"finishReason":"STOP"}],"usageMetadata":{"totalTokenCount":5}}"#;
        assert_eq!(parse_chunk(data).unwrap(), "");
        assert_eq!(parse_chunk(r#"{}"#).unwrap(), "");
    }

    #[test]
    fn test_parse_chunk_api_error() {
        let data = r#"{"error":{"code":429,"message":"Resource exhausted"}}"#;
        assert!(matches!(parse_chunk(data), Err(BackendError::Stream(m)) if m == "Resource exhausted"));
    }

    #[test]
    fn test_parse_chunk_invalid_json() {
        assert!(matches!(parse_chunk("not json"), Err(BackendError::Parse(_))));
    }

    #[test]
    fn test_stream_url() {
        let backend = GeminiBackend::new(Client::new(), "https://api.test/v1beta/", "gemini-pro", "k");
        assert_eq!(
            backend.stream_url(),
            "https://api.test/v1beta/models/gemini-pro:streamGenerateContent?alt=sse"
        );
    }
}
