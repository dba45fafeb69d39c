use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides `collector.base_url`.
pub const API_URL_ENV: &str = "PAGETRACK_API_URL";

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001/api";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub dev_proxy: DevProxyConfig,
}

impl TrackerConfig {
    /// Replace the collector base URL when `value` is set and non-empty.
    pub fn with_api_url(mut self, value: Option<String>) -> Self {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            self.collector.base_url = url;
        }
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    10000
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory for the file-backed session store. In-memory when unset.
    #[serde(default)]
    pub store_dir: Option<PathBuf>,
}

/// Local development forwarding. Only honoured by builds with the `dev-proxy` feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevProxyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_proxy_target")]
    pub target: String,
}

impl Default for DevProxyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            target: default_proxy_target(),
        }
    }
}

fn default_proxy_target() -> String {
    "http://localhost:3001".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: TrackerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.collector.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.collector.timeout_ms, 10000);
        assert!(config.session.store_dir.is_none());
        assert!(!config.dev_proxy.enabled);
    }

    #[test]
    fn api_url_override_ignores_blank() {
        let config = TrackerConfig::default().with_api_url(Some("   ".into()));
        assert_eq!(config.collector.base_url, DEFAULT_BASE_URL);

        let config = TrackerConfig::default().with_api_url(Some("https://stats.example.com/api".into()));
        assert_eq!(config.collector.base_url, "https://stats.example.com/api");
    }
}
