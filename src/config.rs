use crate::domain::Asset;
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub indexer_url: String,
    pub chain_snapshot_url: String,
    /// Live overlay is disabled without a feed.
    pub price_feed_url: Option<String>,
    pub price_staleness_ms: i64,
    pub price_poll_interval_ms: u64,
    pub indexer_page_size: usize,
    pub markets: Vec<Asset>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;

        let indexer_url = env_map
            .get("INDEXER_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("INDEXER_URL".to_string()))?;

        let chain_snapshot_url = env_map
            .get("CHAIN_SNAPSHOT_URL")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("CHAIN_SNAPSHOT_URL".to_string()))?;

        let price_feed_url = env_map
            .get("PRICE_FEED_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let price_staleness_ms =
            parse_or(&env_map, "PRICE_STALENESS_MS", 60_000i64, "must be a valid i64")?;
        if price_staleness_ms <= 0 {
            return Err(ConfigError::InvalidValue(
                "PRICE_STALENESS_MS".to_string(),
                "must be positive".to_string(),
            ));
        }

        let price_poll_interval_ms =
            parse_or(&env_map, "PRICE_POLL_INTERVAL_MS", 1_000u64, "must be a valid u64")?;

        let indexer_page_size =
            parse_or(&env_map, "INDEXER_PAGE_SIZE", 1_000usize, "must be a valid usize")?;
        if indexer_page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "INDEXER_PAGE_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let markets = parse_markets_from_map(&env_map)?;

        Ok(Config {
            port,
            indexer_url,
            chain_snapshot_url,
            price_feed_url,
            price_staleness_ms,
            price_poll_interval_ms,
            indexer_page_size,
            markets,
        })
    }
}

fn parse_or<T: FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    expected: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), expected.to_string())),
        None => Ok(default),
    }
}

/// `MARKETS` (comma separated) wins over `MARKETS_FILE` (one per line); every market
/// when neither is set.
fn parse_markets_from_map(env_map: &HashMap<String, String>) -> Result<Vec<Asset>, ConfigError> {
    let (key, entries): (&str, Vec<String>) = if let Some(list) = env_map.get("MARKETS") {
        ("MARKETS", list.split(',').map(str::to_string).collect())
    } else if let Some(file_path) = env_map.get("MARKETS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "MARKETS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        ("MARKETS_FILE", content.lines().map(str::to_string).collect())
    } else {
        return Ok(Asset::ALL.to_vec());
    };

    let mut markets = Vec::new();
    for entry in entries.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let asset = Asset::from_str(entry)
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e))?;
        if !markets.contains(&asset) {
            markets.push(asset);
        }
    }
    if markets.is_empty() {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must name at least one market".to_string(),
        ));
    }
    Ok(markets)
}
