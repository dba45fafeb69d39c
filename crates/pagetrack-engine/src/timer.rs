//! Dwell-time attribution.
//!
//! On every path change the timer charges the time elapsed since the last
//! change to the page being *left*, then records the new page as current.
//! Only the previous page is ever reported; the page being entered starts a
//! fresh interval.

use crate::clock::Clock;
use crate::dispatcher::EventDispatcher;
use crate::router::PathObserver;
use crate::session::{CURRENT_PAGE_KEY, SessionStore};
use pagetrack_common::protocol::{EventKind, TimingRecord};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Views whose own dwell time is never reported.
pub const EXCLUDED_PAGE: &str = "/analytics";

/// Dwell times at or below this many seconds are dropped as noise.
pub const MIN_DWELL_SECS: f64 = 0.5;

/// The page currently being viewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationEvent {
    pub path: String,
    pub entered_at: Instant,
}

pub fn should_report(page: &str, time_spent: f64) -> bool {
    page != EXCLUDED_PAGE && time_spent > MIN_DWELL_SECS
}

pub struct VisitTimer {
    store: Arc<dyn SessionStore>,
    dispatcher: EventDispatcher,
    clock: Arc<dyn Clock>,
    active: NavigationEvent,
}

impl VisitTimer {
    /// The first interval starts now, before any path is known.
    pub fn new(
        store: Arc<dyn SessionStore>,
        dispatcher: EventDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let active = NavigationEvent {
            path: String::new(),
            entered_at: clock.now(),
        };
        Self {
            store,
            dispatcher,
            clock,
            active,
        }
    }

    pub fn active(&self) -> &NavigationEvent {
        &self.active
    }

    /// Handle a path change. Returns the record handed to the dispatcher, if any.
    ///
    /// Delivery runs on a detached task; its outcome is never observed here.
    pub fn on_navigation_change(&mut self, new_path: &str) -> Option<TimingRecord> {
        let now = self.clock.now();
        let previous = self
            .store
            .get(CURRENT_PAGE_KEY)
            .filter(|page| !page.is_empty());
        let time_spent = now
            .saturating_duration_since(self.active.entered_at)
            .as_secs_f64();

        let record = match previous {
            Some(page) if should_report(&page, time_spent) => {
                Some(TimingRecord::new(page, time_spent))
            }
            Some(page) => {
                debug!("Skipping {} ({:.3}s)", page, time_spent);
                None
            }
            None => None,
        };

        if let Some(record) = &record {
            info!("Recording {:.3}s on {}", record.time_spent, record.page);
            self.dispatcher.submit_detached(EventKind::Track, record);
        }

        self.store.set(CURRENT_PAGE_KEY, new_path);
        self.active = NavigationEvent {
            path: new_path.to_string(),
            entered_at: now,
        };

        record
    }
}

impl PathObserver for VisitTimer {
    fn on_path_change(&mut self, path: &str) {
        self.on_navigation_change(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        assert!(!should_report("/", 0.5));
        assert!(should_report("/", 0.501));
        assert!(!should_report("/", 0.0));
    }

    #[test]
    fn excluded_page_never_reports() {
        assert!(!should_report(EXCLUDED_PAGE, 3600.0));
        assert!(should_report("/analytics/extra", 2.0));
    }
}
