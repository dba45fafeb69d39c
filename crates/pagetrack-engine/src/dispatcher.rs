//! Best-effort delivery of events to the collector.
//!
//! Two paths share one collector:
//! - `submit_detached` spawns the request and returns immediately. Failures are
//!   logged and dropped; the caller never sees them.
//! - `submit` is awaited and reports the outcome, for interactive feedback.
//!
//! Each call issues exactly one request. There is no retry or batching, and a
//! spawned request is never cancelled by later submissions. Spawned requests
//! are tracked so the host can give them a bounded chance to finish with
//! [`EventDispatcher::flush`] before shutting the runtime down.

use crate::collector::{Collector, DispatchError};
use pagetrack_common::protocol::EventKind;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

struct InFlight {
    kind: EventKind,
    handle: JoinHandle<()>,
}

#[derive(Clone)]
pub struct EventDispatcher {
    collector: Arc<dyn Collector>,
    in_flight: Arc<Mutex<Vec<InFlight>>>,
}

impl EventDispatcher {
    pub fn new(collector: Arc<dyn Collector>) -> Self {
        Self {
            collector,
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn collector(&self) -> Arc<dyn Collector> {
        Arc::clone(&self.collector)
    }

    /// Submit and wait for the collector's answer.
    pub async fn submit<T: Serialize + ?Sized>(
        &self,
        kind: EventKind,
        payload: &T,
    ) -> Result<(), DispatchError> {
        let body = serde_json::to_value(payload)?;
        debug!("Submitting to /{}", kind);
        self.collector.post(kind, body).await
    }

    /// Fire-and-forget submission.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit_detached<T: Serialize + ?Sized>(&self, kind: EventKind, payload: &T) {
        let body = serde_json::to_value(payload);
        let collector = Arc::clone(&self.collector);

        let handle = tokio::spawn(async move {
            let body = match body {
                Ok(body) => body,
                Err(e) => {
                    error!("Dropping /{} event: {}", kind, e);
                    return;
                }
            };
            match collector.post(kind, body).await {
                Ok(()) => debug!("Delivered /{} event", kind),
                Err(e) => error!("Failed to deliver /{} event: {}", kind, e),
            }
        });

        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight.retain(|task| !task.handle.is_finished());
        in_flight.push(InFlight { kind, handle });
    }

    /// Number of detached submissions that have not completed yet.
    pub fn pending(&self) -> usize {
        let in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight
            .iter()
            .filter(|task| !task.handle.is_finished())
            .count()
    }

    /// Wait up to `timeout` for every detached submission to finish.
    ///
    /// Returns how many were still running at the deadline. Those are logged
    /// and left to be dropped with the runtime.
    pub async fn flush(&self, timeout: Duration) -> usize {
        let tasks = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *in_flight)
        };
        if tasks.is_empty() {
            return 0;
        }

        debug!("Waiting for {} detached submission(s)", tasks.len());
        let deadline = tokio::time::Instant::now() + timeout;
        let mut abandoned = 0;
        for mut task in tasks {
            match tokio::time::timeout_at(deadline, &mut task.handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!("Detached /{} submission failed: {}", task.kind, e),
                Err(_) => {
                    warn!(
                        "Abandoning /{} submission still in flight after {:?}",
                        task.kind, timeout
                    );
                    abandoned += 1;
                }
            }
        }
        abandoned
    }
}
