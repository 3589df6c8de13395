use crate::config::types::{Config, CrawlerConfig, FetcherConfig, ModelConfig, OutputConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on collected image URLs
const MAX_IMAGES_LIMIT: usize = 500;

/// Upper bound on pages per crawl
const MAX_PAGES_LIMIT: usize = 500;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_model_config(&config.model)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, config.max_pages
        )));
    }

    if config.max_images < 1 || config.max_images > MAX_IMAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_images must be between 1 and {}, got {}",
            MAX_IMAGES_LIMIT, config.max_images
        )));
    }

    if config.chunk_size < 1 {
        return Err(ConfigError::Validation(format!(
            "chunk_size must be >= 1, got {}",
            config.chunk_size
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 || config.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            config.timeout_secs
        )));
    }

    if config.challenge_markers.iter().any(|m| m.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "challenge_markers cannot contain empty entries".to_string(),
        ));
    }

    Ok(())
}

/// Validates model configuration
fn validate_model_config(config: &ModelConfig) -> Result<(), ConfigError> {
    if config.id.trim().is_empty() {
        return Err(ConfigError::Validation("model id cannot be empty".to_string()));
    }

    // Resolving the provider is the only place the model id is inspected
    config.provider()?;

    if let Some(base_url) = &config.base_url {
        let url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidUrl(format!(
                "base_url '{}' must use http or https",
                base_url
            )));
        }
    }

    if let Some(env_var) = &config.api_key_env {
        validate_env_var_name(env_var)?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Environment variable names: letters, digits and underscores, not starting with a digit
fn validate_env_var_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !valid {
        return Err(ConfigError::Validation(format!(
            "api_key_env must be a valid environment variable name, got '{}'",
            name
        )));
    }

    Ok(())
}
