use crate::config::types::{Config, CrawlerConfig, FetchConfig};
use crate::ConfigError;
use url::Url;

/// Upper bound on concurrent crawl workers
const MAX_WORKERS: u32 = 100;

/// Upper bound on either timeout (seconds)
const MAX_TIMEOUT_SECS: u64 = 600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.workers < 1 || config.workers > MAX_WORKERS {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and {}, got {}",
            MAX_WORKERS, config.workers
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if !config
        .user_agent
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "user-agent must contain only alphanumeric characters and hyphens, got '{}'",
            config.user_agent
        )));
    }

    if config.version.trim().is_empty() {
        return Err(ConfigError::Validation("version cannot be empty".to_string()));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    validate_timeout("request-timeout-secs", config.request_timeout_secs)?;
    validate_timeout("connect-timeout-secs", config.connect_timeout_secs)?;

    Ok(())
}

fn validate_timeout(key: &str, secs: u64) -> Result<(), ConfigError> {
    if secs < 1 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "{} must be between 1 and {}, got {}",
            key, MAX_TIMEOUT_SECS, secs
        )));
    }
    Ok(())
}
