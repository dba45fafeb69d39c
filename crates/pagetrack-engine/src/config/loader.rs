use super::{API_URL_ENV, TrackerConfig};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid collector URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from default locations:
    /// 1. ./pagetrack.yaml
    /// 2. ~/.pagetrack/config.yaml
    /// 3. Default configuration
    ///
    /// `PAGETRACK_API_URL` then overrides the collector base URL.
    pub async fn load_default() -> Result<TrackerConfig, ConfigError> {
        let local_config = PathBuf::from("./pagetrack.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".pagetrack").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Self::finish(TrackerConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<TrackerConfig, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<TrackerConfig, ConfigError> {
        let config: TrackerConfig = serde_yaml::from_str(content)?;
        Self::finish(config)
    }

    fn finish(config: TrackerConfig) -> Result<TrackerConfig, ConfigError> {
        let config = config.with_api_url(std::env::var(API_URL_ENV).ok());
        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &TrackerConfig) -> Result<(), ConfigError> {
        url::Url::parse(&config.collector.base_url).map_err(|source| ConfigError::InvalidUrl {
            url: config.collector.base_url.clone(),
            source,
        })?;
        Ok(())
    }
}
