use crate::config::types::{
    BufferConfig, Config, CrawlConfig, OutputConfig, RateLimitConfig, ScheduleConfig,
    UserAgentConfig,
};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawl_config(&config.crawl)?;
    validate_rate_limits(&config.rate_limits)?;
    validate_buffers(&config.buffers)?;
    validate_schedule(&config.schedule)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the crawl target and worker settings
fn validate_crawl_config(config: &CrawlConfig) -> ConfigResult<()> {
    let seed = Url::parse(&config.seed_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", config.seed_url, e))
    })?;

    if seed.scheme() != "http" && seed.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            config.seed_url
        )));
    }

    match config.target_domain() {
        Some(domain) => validate_domain_string(&domain)?,
        None => {
            return Err(ConfigError::Validation(
                "domain is not set and cannot be derived from the seed URL".to_string(),
            ))
        }
    }

    if !config.article_path.starts_with('/') || config.article_path.len() < 2 {
        return Err(ConfigError::Validation(format!(
            "article_path must start with '/' and name a path, got '{}'",
            config.article_path
        )));
    }

    if config.workers < 1 || config.workers > 256 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 256, got {}",
            config.workers
        )));
    }

    Ok(())
}

/// Validates the three budget ceilings
fn validate_rate_limits(config: &RateLimitConfig) -> ConfigResult<()> {
    for (name, value) in [
        ("per_second", config.per_second),
        ("per_minute", config.per_minute),
        ("per_hour", config.per_hour),
    ] {
        if value < 1 {
            return Err(ConfigError::Validation(format!(
                "rate limit {} must be >= 1, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

fn validate_buffers(config: &BufferConfig) -> ConfigResult<()> {
    if config.frontier_ceiling < 1 {
        return Err(ConfigError::Validation(
            "frontier_ceiling must be >= 1".to_string(),
        ));
    }

    if config.content_ceiling < 1 {
        return Err(ConfigError::Validation(
            "content_ceiling must be >= 1".to_string(),
        ));
    }

    if config.refill_batch < 1 {
        return Err(ConfigError::Validation(
            "refill_batch must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_schedule(config: &ScheduleConfig) -> ConfigResult<()> {
    for (name, value) in [
        ("overseer_frequency", config.overseer_frequency),
        ("worker_frequency", config.worker_frequency),
    ] {
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be a positive number of ticks per second, got {}",
                name, value
            )));
        }
    }

    if config.metrics_every < 1 {
        return Err(ConfigError::Validation(
            "metrics_every must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates a bare host name
fn validate_domain_string(domain: &str) -> ConfigResult<()> {
    if domain.is_empty() {
        return Err(ConfigError::Validation("Domain cannot be empty".to_string()));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
        || domain.contains("..")
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' is malformed",
            domain
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> ConfigResult<()> {
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !parts[1].contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
