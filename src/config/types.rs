use crate::output::ExportFormat;
use crate::ConfigError;
use serde::Deserialize;

/// Main configuration structure for ScrapeSmart
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl and chunking behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched per crawl
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Whether links discovered on a page are queued for fetching
    #[serde(default)]
    pub follow_links: bool,

    /// Whether image URLs are collected from the most recent page
    #[serde(default)]
    pub extract_images: bool,

    /// Maximum number of image URLs collected
    #[serde(default = "default_max_images")]
    pub max_images: usize,

    /// Whether extraction walks the corpus chunk by chunk
    #[serde(default)]
    pub chunking: bool,

    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Which discovered link set the session keeps after a crawl
    #[serde(default)]
    pub link_set: LinkSetPolicy,
}

/// Page fetcher configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FetcherConfig {
    /// User agent sent with every page request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pause after a page loads before its markup is used (milliseconds)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// URL substrings that mark a bot-protected site; hitting one stops the crawl
    #[serde(default = "default_challenge_markers")]
    pub challenge_markers: Vec<String>,
}

/// Generative model configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModelConfig {
    /// Model identifier, e.g. `gemini-2.0-flash-lite`
    #[serde(default = "default_model_id")]
    pub id: String,

    /// Literal API key (takes precedence over `api-key-env`)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Override for the provider endpoint
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory export files and downloaded images are written to
    #[serde(default = "default_output_directory")]
    pub directory: String,

    /// Export format for extraction results
    #[serde(default)]
    pub format: ExportFormat,
}

/// Which discovered URLs survive a multi-page crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkSetPolicy {
    /// Only the links found on the most recently fetched page
    #[default]
    LastPage,
    /// Every link found on any page of the crawl
    Union,
}

/// Model provider, resolved once from the model id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProvider {
    Gemini,
    DeepSeek,
}

impl ModelProvider {
    /// Picks the provider for a model id
    pub fn from_model_id(id: &str) -> Result<Self, ConfigError> {
        let lower = id.to_ascii_lowercase();
        if lower.contains("gemini") {
            Ok(Self::Gemini)
        } else if lower.contains("deepseek") {
            Ok(Self::DeepSeek)
        } else {
            Err(ConfigError::UnsupportedModel(id.to_string()))
        }
    }

    /// Human readable provider name
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Gemini => "Google Gemini",
            Self::DeepSeek => "DeepSeek",
        }
    }

    /// Environment variable consulted when no key is configured
    pub fn default_key_env(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }

    /// Default API endpoint
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::DeepSeek => "https://openrouter.ai/api/v1",
        }
    }
}

impl ModelConfig {
    /// Resolves the provider for the configured model id
    pub fn provider(&self) -> Result<ModelProvider, ConfigError> {
        ModelProvider::from_model_id(&self.id)
    }

    /// Name of the environment variable the key is read from
    pub fn key_env(&self) -> Result<String, ConfigError> {
        match &self.api_key_env {
            Some(name) => Ok(name.clone()),
            None => Ok(self.provider()?.default_key_env().to_string()),
        }
    }

    /// Resolves the API key: literal key first, then the environment
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Ok(key.clone());
        }

        let env_var = self.key_env()?;
        match std::env::var(&env_var) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingApiKey {
                provider: self.provider()?.display_name().to_string(),
                env_var,
            }),
        }
    }

    /// Endpoint used for model calls
    pub fn endpoint(&self) -> Result<String, ConfigError> {
        match &self.base_url {
            Some(url) => Ok(url.trim_end_matches('/').to_string()),
            None => Ok(self.provider()?.default_base_url().to_string()),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            follow_links: false,
            extract_images: false,
            max_images: default_max_images(),
            chunking: false,
            chunk_size: default_chunk_size(),
            link_set: LinkSetPolicy::default(),
        }
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            settle_delay_ms: default_settle_delay_ms(),
            timeout_secs: default_timeout_secs(),
            challenge_markers: default_challenge_markers(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            id: default_model_id(),
            api_key: None,
            api_key_env: None,
            base_url: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            format: ExportFormat::default(),
        }
    }
}

fn default_max_pages() -> usize {
    1
}

fn default_max_images() -> usize {
    50
}

fn default_chunk_size() -> usize {
    crate::chunker::DEFAULT_CHUNK_SIZE
}

fn default_user_agent() -> String {
    format!("ScrapeSmart/{}", env!("CARGO_PKG_VERSION"))
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_challenge_markers() -> Vec<String> {
    vec!["cloudflare".to_string()]
}

fn default_model_id() -> String {
    "gemini-2.0-flash-lite".to_string()
}

fn default_output_directory() -> String {
    "./output".to_string()
}
