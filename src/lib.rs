// src/lib.rs
// Entry point for the edge bot gate Spin component

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use spin_sdk::http::{Request, Response};
#[cfg(target_arch = "wasm32")]
use spin_sdk::http_component;
use spin_sdk::key_value::Store;

pub mod classifier;       // Bot-detection verdict policy and responses
pub mod config;           // EDGE_GATE_* environment configuration
pub mod crawler_policy;   // Dynamic robots.txt
pub mod events;           // Security event recorder and sinks
pub mod input_validation; // Payload limits and field sanitising
pub mod observability;    // KV-backed counters
pub mod runtime;          // Request routing
pub mod signals;          // Request signal extraction and UA denylist
pub mod storage;          // Key-value store seam

#[cfg(test)]
mod lib_tests;
#[cfg(test)]
mod test_support;

pub use classifier::{classify, ClassificationResult, Verdict};
pub use events::{EventSink, SecurityEvent};
pub use runtime::request_router::route_request;
pub use signals::RequestSignal;

pub const EDGE_SECRET_HEADER: &str = "x-edge-secret";

pub(crate) fn write_log_line<W: Write>(out: &mut W, msg: &str) {
    let _ = writeln!(out, "{}", msg);
}

/// Emit one log line on stdout; the Spin host forwards it to the component log.
pub(crate) fn log_line(msg: &str) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_log_line(&mut handle, msg);
}

pub(crate) fn header_str<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
    req.header(name).and_then(|v| v.as_str())
}

/// ISO-8601 UTC with millisecond precision, e.g. `2026-10-19T12:00:00.000Z`.
pub(crate) fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Returns true if edge-provided metadata headers (score, verification, geo,
/// client address) should be trusted for this request.
/// If an edge secret is configured, require a matching `x-edge-secret` header.
pub fn edge_headers_trusted(req: &Request, cfg: &config::GateConfig) -> bool {
    match &cfg.edge_secret {
        Some(secret) => header_str(req, EDGE_SECRET_HEADER)
            .map(|v| v.trim() == secret.as_str())
            .unwrap_or(false),
        None => true,
    }
}

fn valid_ip(value: &str) -> Option<String> {
    crate::input_validation::parse_ip_addr(value)
}

/// Extract the best available client address. Only trusted edge headers are
/// consulted; an untrusted or absent address yields an empty string.
pub fn extract_client_ip(req: &Request, trusted: bool) -> String {
    if !trusted {
        return String::new();
    }
    if let Some(ip) = header_str(req, "cf-connecting-ip").and_then(valid_ip) {
        return ip;
    }
    // X-Forwarded-For may be a comma-separated list; the client is first.
    if let Some(ip) = header_str(req, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .and_then(valid_ip)
    {
        return ip;
    }
    header_str(req, "x-real-ip")
        .and_then(valid_ip)
        .unwrap_or_default()
}

/// Main handler logic, testable as a plain Rust function apart from the KV open.
pub fn handle_edge_request_impl(req: &Request) -> Response {
    let cfg = config::GateConfig::from_env();
    match Store::open_default() {
        Ok(store) => {
            let sink = (
                events::LogLineSink,
                events::KvEventSink::new(&store).with_retention_hours(cfg.event_retention_hours),
            );
            route_request(req, &cfg, Some(&store), &sink)
        }
        Err(e) => {
            log_line(&format!(
                "[KV OUTAGE] Store unavailable during request handling ({:?}); continuing log-only",
                e
            ));
            route_request(req, &cfg, None, &events::LogLineSink)
        }
    }
}

#[cfg_attr(target_arch = "wasm32", http_component)]
pub fn spin_entrypoint(req: Request) -> Response {
    handle_edge_request_impl(&req)
}
