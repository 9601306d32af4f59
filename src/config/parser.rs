use crate::config::types::Config;
use crate::config::validation::validate;
use crate::{ConfigError, ConfigResult};
use sha2::{Digest, Sha256};
use std::path::Path;
use std::str::FromStr;

/// Environment variables that override values from the TOML file
pub const ENV_SEED_URL: &str = "TRAWL_SEED_URL";
pub const ENV_RATE_LIMITS: &str = "TRAWL_RATE_LIMITS";
pub const ENV_FRONTIER_CEILING: &str = "TRAWL_FRONTIER_CEILING";
pub const ENV_CONTENT_CEILING: &str = "TRAWL_CONTENT_CEILING";
pub const ENV_OVERSEER_FREQUENCY: &str = "TRAWL_OVERSEER_FREQUENCY";
pub const ENV_WORKER_FREQUENCY: &str = "TRAWL_WORKER_FREQUENCY";
pub const ENV_WORKERS: &str = "TRAWL_WORKERS";

/// Loads and parses a configuration file from the given path
///
/// Values from the `TRAWL_*` environment variables take precedence over the
/// file. The merged result is validated before it is returned.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, override, or validate the configuration
pub fn load_config(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, |key| std::env::var(key).ok())
}

/// Parses configuration text, applies overrides from `lookup`, and validates
pub fn parse_config<F>(content: &str, lookup: F) -> ConfigResult<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = toml::from_str(content)?;
    apply_env_overrides(&mut config, lookup)?;
    validate(&config)?;
    Ok(config)
}

/// Applies environment-style overrides to a parsed configuration
///
/// `lookup` maps a variable name to its value, which keeps this testable
/// without touching the process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> ConfigResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(seed) = lookup(ENV_SEED_URL) {
        config.crawl.seed_url = seed;
    }

    if let Some(raw) = lookup(ENV_RATE_LIMITS) {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(env_error(ENV_RATE_LIMITS, &raw));
        }
        config.rate_limits.per_second = parse_value(ENV_RATE_LIMITS, parts[0])?;
        config.rate_limits.per_minute = parse_value(ENV_RATE_LIMITS, parts[1])?;
        config.rate_limits.per_hour = parse_value(ENV_RATE_LIMITS, parts[2])?;
    }

    if let Some(raw) = lookup(ENV_FRONTIER_CEILING) {
        config.buffers.frontier_ceiling = parse_value(ENV_FRONTIER_CEILING, &raw)?;
    }

    if let Some(raw) = lookup(ENV_CONTENT_CEILING) {
        config.buffers.content_ceiling = parse_value(ENV_CONTENT_CEILING, &raw)?;
    }

    if let Some(raw) = lookup(ENV_OVERSEER_FREQUENCY) {
        config.schedule.overseer_frequency = parse_value(ENV_OVERSEER_FREQUENCY, &raw)?;
    }

    if let Some(raw) = lookup(ENV_WORKER_FREQUENCY) {
        config.schedule.worker_frequency = parse_value(ENV_WORKER_FREQUENCY, &raw)?;
    }

    if let Some(raw) = lookup(ENV_WORKERS) {
        config.crawl.workers = parse_value(ENV_WORKERS, &raw)?;
    }

    Ok(())
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> ConfigResult<T> {
    raw.trim().parse().map_err(|_| env_error(key, raw))
}

fn env_error(key: &str, value: &str) -> ConfigError {
    ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> ConfigResult<(Config, String)> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
