use super::store::{CURRENT_PAGE_KEY, FileSessionStore, MemorySessionStore, SessionStore};
use crate::clock::{Clock, SystemClock};
use crate::collector::{Collector, DispatchError, HttpCollector};
use crate::config::{TrackerConfig, effective_base_url};
use crate::dispatcher::EventDispatcher;
use crate::form::{CustomEventForm, FormError};
use crate::notify::{Notifier, TracingNotifier};
use crate::probe::{ConnectivityProbe, ConnectivityStatus};
use crate::router::{PathObserver, Router};
use crate::timer::VisitTimer;
use pagetrack_common::error::NavigationError;
use pagetrack_common::protocol::CustomEvent;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),
    #[error("Failed to create collector client: {0}")]
    Collector(#[from] DispatchError),
}

/// Everything one tracked session owns.
///
/// Built once by the application root. Call [`end`] when the session closes;
/// simply dropping it leaves session state in place for the next start, the
/// way a page reload would.
///
/// [`end`]: SessionContext::end
pub struct SessionContext {
    config: TrackerConfig,
    store: Arc<dyn SessionStore>,
    dispatcher: EventDispatcher,
    router: Router,
    probe: Arc<ConnectivityProbe>,
    notifier: Arc<dyn Notifier>,
    referrer: Option<String>,
}

pub struct SessionBuilder {
    config: TrackerConfig,
    collector: Option<Arc<dyn Collector>>,
    store: Option<Arc<dyn SessionStore>>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    referrer: Option<String>,
}

impl SessionBuilder {
    pub fn collector(mut self, collector: Arc<dyn Collector>) -> Self {
        self.collector = Some(collector);
        self
    }

    pub fn store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn referrer(mut self, referrer: Option<String>) -> Self {
        self.referrer = referrer.filter(|r| !r.is_empty());
        self
    }

    /// Start tracking on `initial_path` and launch the connectivity probe.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(self, initial_path: &str) -> Result<SessionContext, SessionError> {
        let collector: Arc<dyn Collector> = match self.collector {
            Some(collector) => collector,
            None => {
                let timeout = Duration::from_millis(self.config.collector.timeout_ms);
                Arc::new(HttpCollector::new(
                    effective_base_url(&self.config),
                    timeout,
                )?)
            }
        };
        let store: Arc<dyn SessionStore> = match self.store {
            Some(store) => store,
            None => match &self.config.session.store_dir {
                Some(dir) => Arc::new(FileSessionStore::new(dir)),
                None => Arc::new(MemorySessionStore::new()),
            },
        };

        let mut router = Router::new(initial_path)?;
        store.set(CURRENT_PAGE_KEY, initial_path);

        let dispatcher = EventDispatcher::new(Arc::clone(&collector));
        let timer = VisitTimer::new(Arc::clone(&store), dispatcher.clone(), self.clock);
        router.subscribe(Box::new(timer));

        let probe = Arc::new(ConnectivityProbe::new());
        Arc::clone(&probe).spawn(collector);

        info!("Session started on {}", initial_path);
        Ok(SessionContext {
            config: self.config,
            store,
            dispatcher,
            router,
            probe,
            notifier: self.notifier,
            referrer: self.referrer,
        })
    }
}

impl SessionContext {
    pub fn builder(config: TrackerConfig) -> SessionBuilder {
        SessionBuilder {
            config,
            collector: None,
            store: None,
            clock: Arc::new(SystemClock),
            notifier: Arc::new(TracingNotifier),
            referrer: None,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn current_path(&self) -> &str {
        self.router.current_path()
    }

    /// Last path written to the session store.
    pub fn stored_page(&self) -> Option<String> {
        self.store.get(CURRENT_PAGE_KEY)
    }

    pub fn referrer(&self) -> Option<&str> {
        self.referrer.as_deref()
    }

    pub fn navigate(&mut self, path: &str) -> Result<(), NavigationError> {
        self.router.navigate(path)
    }

    /// Attach another observer to path changes.
    pub fn observe(&mut self, observer: Box<dyn PathObserver>) {
        self.router.subscribe(observer);
    }

    pub async fn submit_event(
        &self,
        form: &mut CustomEventForm,
    ) -> Result<CustomEvent, FormError> {
        form.submit(
            &self.dispatcher,
            self.notifier.as_ref(),
            self.router.current_path(),
            self.referrer.as_deref(),
        )
        .await
    }

    pub fn connectivity(&self) -> ConnectivityStatus {
        self.probe.status()
    }

    pub fn watch_connectivity(&self) -> watch::Receiver<ConnectivityStatus> {
        self.probe.subscribe()
    }

    /// Give detached submissions up to `timeout` to finish. Call before the
    /// runtime shuts down; returns how many were abandoned.
    pub async fn flush(&self, timeout: Duration) -> usize {
        self.dispatcher.flush(timeout).await
    }

    /// Clear session-scoped state.
    pub fn end(&self) {
        info!("Session ended on {}", self.router.current_path());
        self.store.clear();
    }
}
