use super::*;
use crate::test_support::{
    body_json, header_value, report_request, request_with_headers,
    request_with_method_and_headers, InMemoryStore, RecordingSink,
};
use spin_sdk::http::Method;

fn route(req: &Request, store: &InMemoryStore, sink: &RecordingSink) -> Response {
    route_request(req, &GateConfig::default(), Some(store), sink)
}

#[test]
fn bot_challenge_denies_curl_and_counts_verdict() {
    let store = InMemoryStore::default();
    let sink = RecordingSink::default();
    let req = request_with_headers(
        BOT_CHALLENGE_PATH,
        &[("user-agent", "curl/8.4.0"), ("x-bot-verified", "true")],
    );

    let resp = route(&req, &store, &sink);

    assert_eq!(*resp.status(), 403u16);
    assert_eq!(
        metrics::get_counter(&store, MetricName::ClassificationsTotal, Some("denied")),
        1
    );
}

#[test]
fn bot_challenge_challenges_middle_scores() {
    let store = InMemoryStore::default();
    let req = request_with_headers(
        BOT_CHALLENGE_PATH,
        &[("x-bot-score", "55"), ("user-agent", "Mozilla/5.0")],
    );
    let resp = route(&req, &store, &RecordingSink::default());

    assert_eq!(*resp.status(), 200u16);
    assert_eq!(body_json(&resp)["challenge"], true);
}

#[test]
fn bot_challenge_ignores_untrusted_edge_score() {
    let cfg = GateConfig {
        edge_secret: Some("edge-secret".to_string()),
        ..GateConfig::default()
    };
    let req = request_with_headers(
        BOT_CHALLENGE_PATH,
        &[("x-bot-score", "99"), ("user-agent", "Mozilla/5.0")],
    );
    let resp = route_request(&req, &cfg, None, &RecordingSink::default());

    assert_eq!(*resp.status(), 200u16);
    assert_eq!(body_json(&resp)["status"], "allowed");
}

#[test]
fn bot_challenge_honours_edge_score_with_matching_secret() {
    let cfg = GateConfig {
        edge_secret: Some("edge-secret".to_string()),
        ..GateConfig::default()
    };
    let req = request_with_headers(
        BOT_CHALLENGE_PATH,
        &[
            ("x-bot-score", "99"),
            ("x-edge-secret", "edge-secret"),
            ("user-agent", "Mozilla/5.0"),
        ],
    );
    let resp = route_request(&req, &cfg, None, &RecordingSink::default());

    assert_eq!(*resp.status(), 403u16);
    assert_eq!(header_value(&resp, "x-bot-score").as_deref(), Some("99"));
}

#[test]
fn security_report_records_and_acknowledges() {
    let store = InMemoryStore::default();
    let sink = RecordingSink::default();
    let req = report_request(br#"{"type":"attack"}"#);

    let resp = route(&req, &store, &sink);

    assert_eq!(*resp.status(), 200u16);
    assert_eq!(sink.alerted_ids().len(), 1);
    assert_eq!(
        metrics::get_counter(&store, MetricName::SecurityAlertsTotal, None),
        1
    );
}

#[test]
fn security_report_rejects_get() {
    let store = InMemoryStore::default();
    let req = request_with_method_and_headers(Method::Get, SECURITY_REPORT_PATH, &[]);
    let resp = route(&req, &store, &RecordingSink::default());
    assert_eq!(*resp.status(), 405u16);
    assert_eq!(
        metrics::get_counter(
            &store,
            MetricName::SecurityReportsRejectedTotal,
            Some("method_not_allowed")
        ),
        1
    );
}

#[test]
fn robots_is_served_and_counted() {
    let store = InMemoryStore::default();
    let req = request_with_headers(ROBOTS_PATH, &[("user-agent", "GPTBot/1.0")]);
    let resp = route(&req, &store, &RecordingSink::default());

    assert_eq!(*resp.status(), 200u16);
    assert!(String::from_utf8_lossy(resp.body()).contains("User-agent: GPTBot\nDisallow: /"));
    assert_eq!(metrics::get_counter(&store, MetricName::RobotsServedTotal, None), 1);
}

#[test]
fn metrics_endpoint_renders_counters() {
    let store = InMemoryStore::default();
    metrics::increment(&store, MetricName::SecurityEventsTotal, None);
    let req = request_with_headers(METRICS_PATH, &[]);
    let resp = route(&req, &store, &RecordingSink::default());

    assert_eq!(*resp.status(), 200u16);
    assert!(String::from_utf8_lossy(resp.body()).contains("edge_gate_security_events_total 1"));
}

#[test]
fn unknown_path_is_not_found() {
    let req = request_with_headers("/wp-login.php", &[]);
    let resp = route_request(&req, &GateConfig::default(), None, &RecordingSink::default());
    assert_eq!(*resp.status(), 404u16);
}

#[test]
fn handlers_answer_without_store() {
    let req = request_with_headers(BOT_CHALLENGE_PATH, &[("user-agent", "Mozilla/5.0")]);
    let resp = route_request(&req, &GateConfig::default(), None, &RecordingSink::default());
    assert_eq!(*resp.status(), 200u16);

    let req = report_request(b"{}");
    let resp = route_request(&req, &GateConfig::default(), None, &RecordingSink::default());
    assert_eq!(*resp.status(), 200u16);
}
