// src/events/sink.rs
// Destinations for recorded security events.

use std::fmt;

use chrono::{DateTime, Utc};

use super::SecurityEvent;
use crate::config::DEFAULT_EVENT_RETENTION_HOURS;
use crate::storage::{read_u64, KeyValueStore};

/// Records are immutable: `secevent:v1:<hour>:<eventId>` and
/// `secalert:v1:<hour>:<eventId>`, where `<hour>` is unix hours of the event.
pub const SECURITY_EVENT_PREFIX: &str = "secevent:v1";
pub const SECURITY_ALERT_PREFIX: &str = "secalert:v1";
/// Hour of the last retention sweep, shared by every component instance.
pub const EVENT_CLEANUP_MARKER_KEY: &str = "secevent:last_cleanup_hour";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkError {
    Store(String),
    Serialization,
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Store(key) => write!(f, "KV write failed for {}", key),
            SinkError::Serialization => f.write_str("event serialization failed"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Where normalised events go. `alert` is only called for escalated events and
/// always after `record` for the same event.
pub trait EventSink {
    fn record(&self, event: &SecurityEvent) -> Result<(), SinkError>;
    fn alert(&self, event: &SecurityEvent) -> Result<(), SinkError>;
}

impl<T: EventSink + ?Sized> EventSink for &T {
    fn record(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        (**self).record(event)
    }

    fn alert(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        (**self).alert(event)
    }
}

/// Writes one JSON line per event to stdout, which the host collects as the
/// component log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogLineSink;

impl EventSink for LogLineSink {
    fn record(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        let payload = serde_json::to_string(event).map_err(|_| SinkError::Serialization)?;
        crate::log_line(&format!("[security-event] {}", payload));
        Ok(())
    }

    fn alert(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        let payload = serde_json::to_string(event).map_err(|_| SinkError::Serialization)?;
        crate::log_line(&format!("[security-alert] HIGH SEVERITY {}", payload));
        Ok(())
    }
}

/// Persists each event as an immutable record keyed by hour and id, so
/// concurrent requests never read-modify-write the same key. Records older
/// than the retention window are swept on the first write of each hour.
pub struct KvEventSink<'a> {
    store: &'a dyn KeyValueStore,
    retention_hours: u64,
}

impl<'a> KvEventSink<'a> {
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self {
            store,
            retention_hours: DEFAULT_EVENT_RETENTION_HOURS,
        }
    }

    /// 0 disables the sweep.
    pub fn with_retention_hours(mut self, hours: u64) -> Self {
        self.retention_hours = hours;
        self
    }

    fn write(&self, prefix: &str, event: &SecurityEvent) -> Result<(), SinkError> {
        let key = event_key(prefix, event_hour(event), &event.event_id);
        let payload = serde_json::to_vec(event).map_err(|_| SinkError::Serialization)?;
        self.store
            .set(&key, &payload)
            .map_err(|_| SinkError::Store(key))
    }

    fn prune_expired(&self, current_hour: u64) {
        if self.retention_hours == 0 {
            return;
        }
        if read_u64(self.store, EVENT_CLEANUP_MARKER_KEY) == current_hour {
            return;
        }
        if self
            .store
            .set(EVENT_CLEANUP_MARKER_KEY, current_hour.to_string().as_bytes())
            .is_err()
        {
            crate::log_line("[security-event] failed to update cleanup marker; skipping sweep");
            return;
        }

        let cutoff_hour = current_hour.saturating_sub(self.retention_hours);
        let Ok(keys) = self.store.get_keys() else {
            crate::log_line("[security-event] failed to list keys for retention sweep");
            return;
        };
        for key in keys {
            let Some(hour) = parse_event_hour(&key) else {
                continue;
            };
            if hour < cutoff_hour && self.store.delete(&key).is_err() {
                crate::log_line(&format!(
                    "[security-event] failed deleting expired key {}",
                    key
                ));
            }
        }
    }
}

impl EventSink for KvEventSink<'_> {
    fn record(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        self.write(SECURITY_EVENT_PREFIX, event)?;
        self.prune_expired(event_hour(event));
        Ok(())
    }

    fn alert(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        self.write(SECURITY_ALERT_PREFIX, event)
    }
}

pub fn event_key(prefix: &str, hour: u64, event_id: &str) -> String {
    format!("{}:{}:{}", prefix, hour, event_id)
}

/// Unix hour of the event's recorded timestamp; falls back to the current hour
/// if the timestamp does not parse.
pub fn event_hour(event: &SecurityEvent) -> u64 {
    let seconds = DateTime::parse_from_rfc3339(&event.timestamp)
        .map(|at| at.timestamp())
        .unwrap_or_else(|_| Utc::now().timestamp());
    seconds.max(0) as u64 / 3600
}

/// Hour bucket of a persisted event or alert key, `None` for any other key.
pub fn parse_event_hour(key: &str) -> Option<u64> {
    let mut parts = key.splitn(4, ':');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some("secevent" | "secalert"), Some("v1"), Some(hour), Some(_)) => hour.parse().ok(),
        _ => None,
    }
}

/// Fan-out: both sinks always see the event; the first failure is reported.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn record(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        let first = self.0.record(event);
        let second = self.1.record(event);
        first.and(second)
    }

    fn alert(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        let first = self.0.alert(event);
        let second = self.1.alert(event);
        first.and(second)
    }
}
