// src/events/mod.rs
// Security event recorder: accepts client-submitted reports, normalises them into a
// fully-populated SecurityEvent and hands the record to the configured sink.

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use spin_sdk::http::{Method, Request, Response};

use crate::config::{GateConfig, ScoreThresholds};
use crate::input_validation::{enforce_body_size, sanitize_event_field};
use crate::observability::metrics::{self, MetricName};
use crate::signals::request_signal::{clamp_precise_score, parse_precise_score, truncate_score};
use crate::signals::RequestSignal;
use crate::storage::KeyValueStore;

pub mod sink;

pub use sink::{EventSink, KvEventSink, LogLineSink, SinkError};

pub const DEFAULT_EVENT_KIND: &str = "unknown";
pub const DEFAULT_EVENT_ACTION: &str = "logged";
pub const UNKNOWN_VALUE: &str = "unknown";
pub const ATTACK_EVENT_KIND: &str = "attack";

const EVENT_ID_PREFIX: &str = "sec";
const EVENT_ID_SUFFIX_LEN: usize = 9;
const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// A normalised security report. Every field is populated; see
/// `normalize_security_event` for the precedence rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityEvent {
    pub event_id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub user_agent: String,
    #[serde(rename = "clientIP")]
    pub client_address: String,
    pub url: String,
    #[serde(rename = "botScore")]
    pub reputation_score: u8,
    pub action: String,
    pub country: String,
    #[serde(rename = "asn")]
    pub network_origin: String,
    /// Client-side timestamp from the report, kept for correlation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<String>,
    pub severity_escalated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportError {
    MethodNotAllowed,
    PayloadTooLarge,
    InvalidJson,
    SinkUnavailable,
}

impl ReportError {
    pub fn status(&self) -> u16 {
        match self {
            ReportError::MethodNotAllowed => 405,
            ReportError::PayloadTooLarge | ReportError::InvalidJson => 400,
            ReportError::SinkUnavailable => 503,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ReportError::MethodNotAllowed => "Method not allowed",
            ReportError::PayloadTooLarge | ReportError::InvalidJson => "Invalid request data",
            ReportError::SinkUnavailable => "Event sink unavailable",
        }
    }

    pub fn metric_label(&self) -> &'static str {
        match self {
            ReportError::MethodNotAllowed => "method_not_allowed",
            ReportError::PayloadTooLarge => "payload_too_large",
            ReportError::InvalidJson => "invalid_json",
            ReportError::SinkUnavailable => "sink_unavailable",
        }
    }

    pub fn into_response(self) -> Response {
        if self == ReportError::MethodNotAllowed {
            return Response::builder()
                .status(self.status())
                .header("Allow", "POST")
                .header("Content-Type", "text/plain; charset=utf-8")
                .body(self.user_message())
                .build();
        }
        Response::builder()
            .status(self.status())
            .header("Content-Type", "application/json")
            .body(json!({ "error": self.user_message() }).to_string())
            .build()
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metric_label())
    }
}

impl std::error::Error for ReportError {}

/// `sec_<unix millis>_<9 base36 chars>`; the random tail keeps ids distinct
/// within the same millisecond.
pub fn generate_event_id(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..EVENT_ID_SUFFIX_LEN)
        .map(|_| BASE36_ALPHABET[rng.gen_range(0..BASE36_ALPHABET.len())] as char)
        .collect();
    format!("{}_{}_{}", EVENT_ID_PREFIX, now.timestamp_millis(), suffix)
}

fn payload_string(payload: &Map<String, Value>, key: &str) -> Option<String> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .map(sanitize_event_field)
        .filter(|value| !value.is_empty())
}

/// Clamped to 0..=100 but not truncated, so `90.5` still escalates above 90.
fn payload_score(payload: &Map<String, Value>, key: &str) -> Option<f64> {
    match payload.get(key)? {
        Value::Number(number) => match number.as_i64() {
            Some(value) => Some(value.clamp(0, 100) as f64),
            None => number.as_f64().and_then(clamp_precise_score),
        },
        Value::String(raw) => parse_precise_score(raw),
        _ => None,
    }
}

fn context_string(value: &str) -> Option<String> {
    Some(sanitize_event_field(value)).filter(|v| !v.is_empty())
}

pub fn is_severity_escalated(kind: &str, score: f64, thresholds: &ScoreThresholds) -> bool {
    score > f64::from(thresholds.alert_above) || kind == ATTACK_EVENT_KIND
}

/// Build a SecurityEvent from an arbitrary JSON payload.
///
/// Precedence per field: explicit payload value, then request metadata, then a
/// fixed default. Payloads that are valid JSON but not objects are treated as
/// empty objects.
pub fn normalize_security_event(
    payload: &Value,
    context: &RequestSignal,
    thresholds: &ScoreThresholds,
    now: DateTime<Utc>,
    event_id: String,
) -> SecurityEvent {
    let empty = Map::new();
    let fields = payload.as_object().unwrap_or(&empty);

    let kind = payload_string(fields, "type").unwrap_or_else(|| DEFAULT_EVENT_KIND.to_string());
    let precise_score = payload_score(fields, "botScore")
        .unwrap_or_else(|| f64::from(context.reputation_score));
    let severity_escalated = is_severity_escalated(&kind, precise_score, thresholds);
    let reputation_score = truncate_score(precise_score);

    SecurityEvent {
        event_id,
        timestamp: crate::iso_timestamp(now),
        user_agent: payload_string(fields, "userAgent")
            .or_else(|| context_string(&context.user_agent))
            .unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
        client_address: payload_string(fields, "ip")
            .or_else(|| context_string(&context.client_address))
            .unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
        url: payload_string(fields, "url")
            .or_else(|| context_string(&context.referer))
            .unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
        reputation_score,
        action: payload_string(fields, "action").unwrap_or_else(|| DEFAULT_EVENT_ACTION.to_string()),
        country: context
            .country
            .clone()
            .unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
        network_origin: context
            .network_origin
            .clone()
            .unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
        reported_at: payload_string(fields, "timestamp"),
        kind,
        severity_escalated,
    }
}

/// Validate, normalise and deliver one report. The method check happens before
/// the body is looked at.
pub fn record_security_report(
    req: &Request,
    cfg: &GateConfig,
    context: &RequestSignal,
    sink: &dyn EventSink,
    now: DateTime<Utc>,
) -> Result<SecurityEvent, ReportError> {
    if *req.method() != Method::Post {
        return Err(ReportError::MethodNotAllowed);
    }

    let body = req.body();
    enforce_body_size(body, cfg.max_report_bytes).map_err(|_| ReportError::PayloadTooLarge)?;
    let payload: Value = serde_json::from_slice(body).map_err(|_| ReportError::InvalidJson)?;

    let event = normalize_security_event(
        &payload,
        context,
        &cfg.thresholds,
        now,
        generate_event_id(now),
    );

    let delivered = sink.record(&event);
    if let Err(err) = &delivered {
        crate::log_line(&format!(
            "[security-report] sink failed to record {}: {}",
            event.event_id, err
        ));
    }
    if event.severity_escalated {
        if let Err(err) = sink.alert(&event) {
            crate::log_line(&format!(
                "[security-report] sink failed to raise alert for {}: {}",
                event.event_id, err
            ));
        }
    }
    if cfg.strict_event_delivery && delivered.is_err() {
        return Err(ReportError::SinkUnavailable);
    }

    Ok(event)
}

pub fn render_acknowledgment(event: &SecurityEvent) -> Response {
    let body = json!({
        "status": "recorded",
        "eventId": event.event_id,
        "timestamp": event.timestamp,
    });
    Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(body.to_string())
        .build()
}

pub fn handle_security_report(
    req: &Request,
    cfg: &GateConfig,
    context: &RequestSignal,
    sink: &dyn EventSink,
    store: Option<&dyn KeyValueStore>,
) -> Response {
    match record_security_report(req, cfg, context, sink, Utc::now()) {
        Ok(event) => {
            if let Some(store) = store {
                metrics::increment(store, MetricName::SecurityEventsTotal, None);
                if event.severity_escalated {
                    metrics::increment(store, MetricName::SecurityAlertsTotal, None);
                }
            }
            render_acknowledgment(&event)
        }
        Err(err) => {
            if let Some(store) = store {
                metrics::increment(
                    store,
                    MetricName::SecurityReportsRejectedTotal,
                    Some(err.metric_label()),
                );
            }
            err.into_response()
        }
    }
}
