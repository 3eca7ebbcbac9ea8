// src/observability/metrics.rs
// Prometheus-compatible counters for the edge gate.
// Counters live in the KV store and are exported in Prometheus text format.

use spin_sdk::http::Response;

use crate::classifier::Verdict;
use crate::storage::{read_u64, KeyValueStore};

const METRICS_PREFIX: &str = "metrics:";
const VERDICT_LABELS: [Verdict; 3] = [Verdict::Allowed, Verdict::Challenged, Verdict::Denied];
const REJECTION_LABELS: [&str; 4] = [
    "method_not_allowed",
    "payload_too_large",
    "invalid_json",
    "sink_unavailable",
];

#[derive(Debug, Clone, Copy)]
pub enum MetricName {
    ClassificationsTotal,
    SecurityEventsTotal,
    SecurityAlertsTotal,
    SecurityReportsRejectedTotal,
    RobotsServedTotal,
}

impl MetricName {
    fn as_str(&self) -> &'static str {
        match self {
            MetricName::ClassificationsTotal => "classifications_total",
            MetricName::SecurityEventsTotal => "security_events_total",
            MetricName::SecurityAlertsTotal => "security_alerts_total",
            MetricName::SecurityReportsRejectedTotal => "security_reports_rejected_total",
            MetricName::RobotsServedTotal => "robots_served_total",
        }
    }
}

fn metric_key(metric: MetricName, label: Option<&str>) -> String {
    match label {
        Some(l) => format!("{}{}:{}", METRICS_PREFIX, metric.as_str(), l),
        None => format!("{}{}", METRICS_PREFIX, metric.as_str()),
    }
}

/// Increment a counter, optionally with a label. Best effort: concurrent
/// requests may lose increments, and a failed write is only logged.
pub fn increment(store: &dyn KeyValueStore, metric: MetricName, label: Option<&str>) {
    let key = metric_key(metric, label);
    let next = read_u64(store, &key).saturating_add(1);
    if store.set(&key, next.to_string().as_bytes()).is_err() {
        crate::log_line(&format!("[metrics] failed to write metric {} -> {}", key, next));
    }
}

pub fn get_counter(store: &dyn KeyValueStore, metric: MetricName, label: Option<&str>) -> u64 {
    read_u64(store, &metric_key(metric, label))
}

pub fn render_metrics(store: &dyn KeyValueStore) -> String {
    let mut output = String::new();

    output.push_str("# Edge Bot Gate Metrics\n");
    output.push_str("# HELP edge_gate_classifications_total Requests classified by verdict\n");
    output.push_str("# TYPE edge_gate_classifications_total counter\n");
    for verdict in VERDICT_LABELS {
        let count = get_counter(store, MetricName::ClassificationsTotal, Some(verdict.as_str()));
        output.push_str(&format!(
            "edge_gate_classifications_total{{verdict=\"{}\"}} {}\n",
            verdict.as_str(),
            count
        ));
    }

    output.push_str("\n# TYPE edge_gate_security_events_total counter\n");
    output.push_str(&format!(
        "edge_gate_security_events_total {}\n",
        get_counter(store, MetricName::SecurityEventsTotal, None)
    ));

    output.push_str("\n# TYPE edge_gate_security_alerts_total counter\n");
    output.push_str(&format!(
        "edge_gate_security_alerts_total {}\n",
        get_counter(store, MetricName::SecurityAlertsTotal, None)
    ));

    output.push_str("\n# HELP edge_gate_security_reports_rejected_total Rejected security reports by reason\n");
    output.push_str("# TYPE edge_gate_security_reports_rejected_total counter\n");
    for reason in REJECTION_LABELS {
        let count = get_counter(store, MetricName::SecurityReportsRejectedTotal, Some(reason));
        output.push_str(&format!(
            "edge_gate_security_reports_rejected_total{{reason=\"{}\"}} {}\n",
            reason, count
        ));
    }

    output.push_str("\n# TYPE edge_gate_robots_served_total counter\n");
    output.push_str(&format!(
        "edge_gate_robots_served_total {}\n",
        get_counter(store, MetricName::RobotsServedTotal, None)
    ));

    output
}

pub fn handle_metrics(store: Option<&dyn KeyValueStore>) -> Response {
    let Some(store) = store else {
        return Response::new(503, "Metrics unavailable (KV store error)");
    };
    Response::builder()
        .status(200)
        .header("Content-Type", "text/plain; version=0.0.4")
        .header("Cache-Control", "no-store")
        .body(render_metrics(store))
        .build()
}
