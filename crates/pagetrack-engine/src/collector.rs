use async_trait::async_trait;
use pagetrack_common::protocol::EventKind;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Collector responded with status {0}")]
    Status(u16),
    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The remote service that receives analytics events.
#[async_trait]
pub trait Collector: Send + Sync {
    /// POST a JSON body to the sub-resource selected by `kind`.
    async fn post(&self, kind: EventKind, body: serde_json::Value) -> Result<(), DispatchError>;

    /// GET the collector root. Any 2xx counts as reachable.
    async fn ping(&self) -> Result<(), DispatchError>;
}

pub struct HttpCollector {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCollector {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, kind: EventKind) -> String {
        format!("{}/{}", self.base_url, kind.path())
    }

    pub fn root_url(&self) -> String {
        root_url(&self.base_url)
    }
}

/// The collector root: the base URL with a trailing `/api` segment removed.
pub fn root_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let root = base.strip_suffix("/api").unwrap_or(base);
    format!("{}/", root)
}

fn check_status(status: reqwest::StatusCode) -> Result<(), DispatchError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(DispatchError::Status(status.as_u16()))
    }
}

#[async_trait]
impl Collector for HttpCollector {
    async fn post(&self, kind: EventKind, body: serde_json::Value) -> Result<(), DispatchError> {
        let url = self.endpoint(kind);
        debug!("POST {}", url);
        // `json` sets `Content-Type: application/json`.
        let response = self.client.post(&url).json(&body).send().await?;
        check_status(response.status())
    }

    async fn ping(&self) -> Result<(), DispatchError> {
        let url = self.root_url();
        debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        check_status(response.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_url_strips_api_suffix() {
        assert_eq!(root_url("http://localhost:3001/api"), "http://localhost:3001/");
        assert_eq!(root_url("http://localhost:3001/api/"), "http://localhost:3001/");
        assert_eq!(root_url("https://stats.example.com"), "https://stats.example.com/");
    }

    #[test]
    fn endpoints_join_kind() {
        let collector = HttpCollector::with_client(reqwest::Client::new(), "http://host/api/");
        assert_eq!(collector.endpoint(EventKind::Track), "http://host/api/track");
        assert_eq!(collector.endpoint(EventKind::Events), "http://host/api/events");
        assert_eq!(collector.root_url(), "http://host/");
    }
}
