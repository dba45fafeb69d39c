pub mod loader;

pub use loader::{ConfigError, ConfigLoader};
pub use pagetrack_common::config::*;

/// Base URL requests are actually sent to.
///
/// With the `dev-proxy` feature and `dev_proxy.enabled`, traffic is forwarded
/// to `dev_proxy.target`. Other builds always use `collector.base_url`.
pub fn effective_base_url(config: &TrackerConfig) -> String {
    #[cfg(feature = "dev-proxy")]
    {
        if config.dev_proxy.enabled {
            let target = config.dev_proxy.target.trim_end_matches('/');
            return format!("{}/api", target);
        }
    }
    #[cfg(not(feature = "dev-proxy"))]
    {
        if config.dev_proxy.enabled {
            tracing::warn!("dev_proxy is enabled but this build lacks the dev-proxy feature; ignoring");
        }
    }
    config.collector.base_url.clone()
}
