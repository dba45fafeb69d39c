use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Collector sub-resource an event is posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Automatic time-on-page records.
    Track,
    /// User-triggered custom events.
    Events,
}

impl EventKind {
    pub fn path(&self) -> &'static str {
        match self {
            EventKind::Track => "track",
            EventKind::Events => "events",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Dwell time attributed to the page being left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingRecord {
    pub page: String,
    /// Seconds, fractional.
    pub time_spent: f64,
}

impl TimingRecord {
    pub fn new(page: impl Into<String>, time_spent: f64) -> Self {
        Self {
            page: page.into(),
            time_spent,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub data: String,
}

/// An ad-hoc event entered by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub details: EventDetails,
    /// ISO 8601 in UTC with millisecond precision, e.g. `2024-05-01T12:00:00.000Z`.
    #[serde(serialize_with = "serialize_millis")]
    pub timestamp: DateTime<Utc>,
    pub page: String,
    /// Always present on the wire; `null` when the session has no referrer.
    pub referrer: Option<String>,
}

impl CustomEvent {
    /// Build an event stamped with the current time.
    pub fn new(
        event_type: impl Into<String>,
        data: impl Into<String>,
        page: impl Into<String>,
        referrer: Option<String>,
    ) -> Self {
        Self::at(Utc::now(), event_type, data, page, referrer)
    }

    pub fn at(
        timestamp: DateTime<Utc>,
        event_type: impl Into<String>,
        data: impl Into<String>,
        page: impl Into<String>,
        referrer: Option<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            details: EventDetails { data: data.into() },
            timestamp,
            page: page.into(),
            // An empty referrer means "none".
            referrer: referrer.filter(|r| !r.is_empty()),
        }
    }
}

fn serialize_millis<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&timestamp.to_rfc3339_opts(SecondsFormat::Millis, true))
}
