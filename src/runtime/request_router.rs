use spin_sdk::http::{Request, Response};

use crate::classifier;
use crate::config::GateConfig;
use crate::events::{self, EventSink};
use crate::observability::metrics::{self, MetricName};
use crate::signals::RequestSignal;
use crate::storage::KeyValueStore;

pub const BOT_CHALLENGE_PATH: &str = "/api/bot-challenge";
pub const SECURITY_REPORT_PATH: &str = "/api/security-report";
pub const ROBOTS_PATH: &str = "/robots.txt";
pub const METRICS_PATH: &str = "/metrics";

fn handle_bot_challenge(
    req: &Request,
    cfg: &GateConfig,
    store: Option<&dyn KeyValueStore>,
) -> Response {
    let signal = RequestSignal::from_request(req, crate::edge_headers_trusted(req, cfg));
    let result = classifier::classify(&signal, &cfg.thresholds);
    crate::log_line(&format!(
        "[bot-challenge] verdict={} rule={} score={} verified={} ip={}",
        result.verdict.as_str(),
        result.rule,
        result.score,
        signal.verified,
        result.client_address
    ));
    if let Some(store) = store {
        metrics::increment(
            store,
            MetricName::ClassificationsTotal,
            Some(result.verdict.as_str()),
        );
    }
    classifier::response::render_classification(&result)
}

/// Dispatch one request. `store` is `None` when the KV store could not be
/// opened; handlers then skip counters and persistence but still answer.
pub fn route_request(
    req: &Request,
    cfg: &GateConfig,
    store: Option<&dyn KeyValueStore>,
    sink: &dyn EventSink,
) -> Response {
    match req.path() {
        BOT_CHALLENGE_PATH => handle_bot_challenge(req, cfg, store),
        SECURITY_REPORT_PATH => {
            let context = RequestSignal::from_request(req, crate::edge_headers_trusted(req, cfg));
            events::handle_security_report(req, cfg, &context, sink, store)
        }
        ROBOTS_PATH => {
            let ua = crate::header_str(req, "user-agent").unwrap_or("");
            let response = crate::crawler_policy::robots::robots_response(cfg, ua);
            if let (Some(store), true) = (store, *response.status() == 200) {
                metrics::increment(store, MetricName::RobotsServedTotal, None);
            }
            response
        }
        METRICS_PATH => metrics::handle_metrics(store),
        _ => Response::new(404, "Not Found"),
    }
}

#[cfg(test)]
mod tests;
