use crate::collector::Collector;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Advisory reachability of the collector. Never gates tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    Checking,
    Online,
    Offline,
}

impl fmt::Display for ConnectivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectivityStatus::Checking => "checking",
            ConnectivityStatus::Online => "online",
            ConnectivityStatus::Offline => "offline",
        };
        f.write_str(label)
    }
}

/// One-shot probe: starts in `Checking` and settles exactly once.
pub struct ConnectivityProbe {
    status: watch::Sender<ConnectivityStatus>,
}

impl Default for ConnectivityProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityProbe {
    pub fn new() -> Self {
        let (status, _) = watch::channel(ConnectivityStatus::Checking);
        Self { status }
    }

    pub fn status(&self) -> ConnectivityStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectivityStatus> {
        self.status.subscribe()
    }

    /// Ping the collector and settle. Later calls return the settled status
    /// without probing again.
    pub async fn run(&self, collector: &dyn Collector) -> ConnectivityStatus {
        if self.status() != ConnectivityStatus::Checking {
            return self.status();
        }

        let settled = match collector.ping().await {
            Ok(()) => {
                info!("Collector is online");
                ConnectivityStatus::Online
            }
            Err(e) => {
                warn!("Collector is offline: {}", e);
                ConnectivityStatus::Offline
            }
        };
        self.status.send_replace(settled);
        settled
    }

    pub fn spawn(
        self: Arc<Self>,
        collector: Arc<dyn Collector>,
    ) -> JoinHandle<ConnectivityStatus> {
        tokio::spawn(async move { self.run(collector.as_ref()).await })
    }
}
