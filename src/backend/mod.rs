//! Generative model backends
//!
//! Each backend speaks one provider's streaming API. The provider is chosen once,
//! from the configured model id, when the backend is built; nothing downstream
//! inspects the model id again.

mod deepseek;
mod gemini;
mod sse;

pub use deepseek::DeepSeekBackend;
pub use gemini::GeminiBackend;
pub use sse::SseStream;

use crate::config::{ModelConfig, ModelProvider};
use crate::extraction::Turn;
use crate::ConfigError;
use async_trait::async_trait;
use futures::stream::Stream;
use reqwest::Client;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Text fragments streamed from a model, in arrival order
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, BackendError>> + Send>>;

/// Model call errors
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API returned HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("Failed to parse model response: {0}")]
    Parse(String),

    #[error("No API key configured for {0}")]
    MissingApiKey(String),
}

/// A streaming text generation API
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// The model id requests are made with
    fn model_id(&self) -> &str;

    /// Starts a streaming generation over the given turns
    ///
    /// # Arguments
    ///
    /// * `history` - Every turn the model should see, oldest first, ending with
    ///   the user turn to answer
    /// * `system_instruction` - Out-of-band directive for the whole call
    ///
    /// # Returns
    ///
    /// * `Ok(FragmentStream)` - The request was accepted; fragments follow
    /// * `Err(BackendError)` - The request failed before any output
    async fn stream_generate(
        &self,
        history: &[Turn],
        system_instruction: &str,
    ) -> Result<FragmentStream, BackendError>;
}

/// Builds the HTTP client used for model calls
///
/// Only connecting is bounded; a streamed response may legitimately take a long
/// time to finish.
pub fn build_model_client() -> Result<Client, reqwest::Error> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!("ScrapeSmart/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Builds the backend for the configured model
///
/// # Returns
///
/// * `Ok(Box<dyn ModelBackend>)` - Backend for the model's provider
/// * `Err(ConfigError)` - Unsupported model id or no API key available
pub fn build_backend(config: &ModelConfig) -> Result<Box<dyn ModelBackend>, ConfigError> {
    let provider = config.provider()?;
    let api_key = config.resolve_api_key()?;
    let endpoint = config.endpoint()?;
    let client = build_model_client()
        .map_err(|e| ConfigError::Validation(format!("Failed to build HTTP client: {}", e)))?;

    tracing::debug!("Using {} backend at {}", provider.display_name(), endpoint);

    Ok(match provider {
        ModelProvider::Gemini => Box::new(GeminiBackend::new(client, endpoint, &config.id, api_key)),
        ModelProvider::DeepSeek => {
            Box::new(DeepSeekBackend::new(client, endpoint, &config.id, api_key))
        }
    })
}

/// Turns a non-2xx response into a `Status` error carrying the body
async fn status_error(response: reqwest::Response) -> BackendError {
    let code = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    BackendError::Status { code, body }
}

/// First 200 characters of a payload, for error messages
fn snippet(data: &str) -> &str {
    match data.char_indices().nth(200) {
        Some((end, _)) => &data[..end],
        None => data,
    }
}
