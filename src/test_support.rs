use once_cell::sync::Lazy;
use serde_json::Value;
use spin_sdk::http::{Method, Request, Response};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::events::{EventSink, SecurityEvent, SinkError};
use crate::storage::KeyValueStore;

#[derive(Default)]
pub(crate) struct InMemoryStore {
    map: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: bool,
}

impl InMemoryStore {
    pub(crate) fn failing_writes() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
            fail_writes: true,
        }
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, ()> {
        let map = self
            .map
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), ()> {
        if self.fail_writes {
            return Err(());
        }
        let mut map = self
            .map
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), ()> {
        let mut map = self
            .map
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.remove(key);
        Ok(())
    }

    fn get_keys(&self) -> Result<Vec<String>, ()> {
        let map = self
            .map
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(map.keys().cloned().collect())
    }
}

/// Captures the ids of recorded and alerted events.
#[derive(Default)]
pub(crate) struct RecordingSink {
    recorded: Mutex<Vec<String>>,
    alerted: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub(crate) fn recorded_ids(&self) -> Vec<String> {
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub(crate) fn alerted_ids(&self) -> Vec<String> {
        self.alerted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        self.recorded
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.event_id.clone());
        Ok(())
    }

    fn alert(&self, event: &SecurityEvent) -> Result<(), SinkError> {
        self.alerted
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event.event_id.clone());
        Ok(())
    }
}

pub(crate) struct FailingSink;

impl EventSink for FailingSink {
    fn record(&self, _event: &SecurityEvent) -> Result<(), SinkError> {
        Err(SinkError::Store("test".to_string()))
    }

    fn alert(&self, _event: &SecurityEvent) -> Result<(), SinkError> {
        Err(SinkError::Store("test".to_string()))
    }
}

pub(crate) fn sample_event(event_id: &str, severity_escalated: bool) -> SecurityEvent {
    SecurityEvent {
        event_id: event_id.to_string(),
        timestamp: "2026-10-19T12:00:00.000Z".to_string(),
        kind: if severity_escalated { "attack" } else { "probe" }.to_string(),
        user_agent: "Mozilla/5.0".to_string(),
        client_address: "203.0.113.10".to_string(),
        url: "https://example.com/".to_string(),
        reputation_score: 12,
        action: "logged".to_string(),
        country: "unknown".to_string(),
        network_origin: "unknown".to_string(),
        reported_at: None,
        severity_escalated,
    }
}

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub(crate) fn lock_env() -> MutexGuard<'static, ()> {
    ENV_MUTEX
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub(crate) fn request_with_headers(path: &str, headers: &[(&str, &str)]) -> Request {
    request_with_method_and_headers(Method::Get, path, headers)
}

pub(crate) fn request_with_method_and_headers(
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
) -> Request {
    request_with_body(method, path, headers, Vec::new())
}

pub(crate) fn request_with_body(
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
    body: Vec<u8>,
) -> Request {
    let mut builder = Request::builder();
    builder.method(method).uri(path);
    for (key, value) in headers {
        builder.header(*key, *value);
    }
    builder.body(body);
    builder.build()
}

/// POST to the security report endpoint with a JSON content type.
pub(crate) fn report_request(body: &[u8]) -> Request {
    request_with_body(
        Method::Post,
        crate::runtime::request_router::SECURITY_REPORT_PATH,
        &[("content-type", "application/json")],
        body.to_vec(),
    )
}

pub(crate) fn header_value(resp: &Response, name: &str) -> Option<String> {
    resp.headers()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.as_str().map(str::to_string))
}

pub(crate) fn body_json(resp: &Response) -> Value {
    serde_json::from_slice(resp.body()).unwrap_or(Value::Null)
}
