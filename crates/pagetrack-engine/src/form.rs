use crate::collector::DispatchError;
use crate::dispatcher::EventDispatcher;
use crate::notify::{Notification, Notifier};
use pagetrack_common::protocol::{CustomEvent, EventKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormError {
    #[error("Please enter an event type")]
    EmptyEventType,
    #[error("Failed to send event: {0}")]
    Dispatch(#[from] DispatchError),
}

/// The two inputs of the custom event panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomEventForm {
    pub event_type: String,
    pub event_data: String,
}

impl CustomEventForm {
    pub fn new(event_type: impl Into<String>, event_data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            event_data: event_data.into(),
        }
    }

    pub fn clear(&mut self) {
        self.event_type.clear();
        self.event_data.clear();
    }

    pub fn build_event(
        &self,
        page: &str,
        referrer: Option<&str>,
    ) -> Result<CustomEvent, FormError> {
        if self.event_type.trim().is_empty() {
            return Err(FormError::EmptyEventType);
        }
        Ok(CustomEvent::new(
            self.event_type.clone(),
            self.event_data.clone(),
            page,
            referrer.map(str::to_string),
        ))
    }

    /// Validate, send and wait for the collector.
    ///
    /// The fields are cleared only after a successful send, so a failed
    /// attempt can be retried as-is.
    pub async fn submit(
        &mut self,
        dispatcher: &EventDispatcher,
        notifier: &dyn Notifier,
        page: &str,
        referrer: Option<&str>,
    ) -> Result<CustomEvent, FormError> {
        let event = match self.build_event(page, referrer) {
            Ok(event) => event,
            Err(e) => {
                notifier.notify(Notification::warning(e.to_string()));
                return Err(e);
            }
        };

        match dispatcher.submit(EventKind::Events, &event).await {
            Ok(()) => {
                notifier.notify(Notification::success(format!(
                    "Event '{}' sent",
                    event.event_type
                )));
                self.clear();
                Ok(event)
            }
            Err(e) => {
                let e = FormError::from(e);
                notifier.notify(Notification::error(e.to_string()));
                Err(e)
            }
        }
    }
}
