//! Page fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeout
//! - GET requests that return the page markup
//! - Waiting for the page to settle before handing the markup over
//! - Error classification (network, timeout, HTTP status, bot challenge)

use crate::config::FetcherConfig;
use crate::url::is_challenge_page;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Anything that can turn a URL into page markup
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the markup for a URL
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetcher configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use scrapesmart::config::FetcherConfig;
/// use scrapesmart::crawler::build_http_client;
///
/// let client = build_http_client(&FetcherConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetcherConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP
pub struct HttpFetcher {
    client: Client,
    settle_delay: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from configuration
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            settle_delay: Duration::from_millis(config.settle_delay_ms),
        })
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, settle_delay: Duration) -> Self {
        Self {
            client,
            settle_delay,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a URL with error classification
    ///
    /// # Request Flow
    ///
    /// 1. Send GET request (redirects followed by the client)
    /// 2. Map transport failures and non-2xx statuses to `FetchError`
    /// 3. Read the body
    /// 4. Reject bot-challenge interstitials
    /// 5. Wait the settle delay, then return the markup
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | Timeout | `Timeout` |
    /// | Connection refused / DNS / TLS | `Network` |
    /// | Non-2xx status | `Status` |
    /// | Body read failure | `Body` |
    /// | Challenge page markup | `ChallengeDetected` |
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        if is_challenge_page(&body) {
            return Err(FetchError::ChallengeDetected {
                url: url.to_string(),
            });
        }

        if !self.settle_delay.is_zero() {
            tracing::trace!("Settling {:?} after loading {}", self.settle_delay, url);
            tokio::time::sleep(self.settle_delay).await;
        }

        Ok(body)
    }
}

/// Maps a transport error onto the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Network {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
