// src/classifier/response.rs
// HTTP rendering for classification verdicts.

use serde_json::json;
use spin_sdk::http::Response;

use super::{ClassificationResult, Verdict};

pub const BOT_SCORE_RESPONSE_HEADER: &str = "X-Bot-Score";
pub const CHALLENGE_HINT_HEADER: &str = "CF-Challenge";
pub const CHALLENGE_MECHANISM: &str = "js_challenge";

const JSON_CONTENT_TYPE: &str = "application/json";

pub fn render_classification(result: &ClassificationResult) -> Response {
    match result.verdict {
        Verdict::Denied => {
            let body = json!({
                "error": "Access denied",
                "reason": "Automated traffic detected",
                "timestamp": result.timestamp,
                "ip": result.client_address,
            });
            Response::builder()
                .status(403)
                .header("Content-Type", JSON_CONTENT_TYPE)
                .header("Cache-Control", "no-store")
                .header(BOT_SCORE_RESPONSE_HEADER, result.score.to_string())
                .body(body.to_string())
                .build()
        }
        Verdict::Challenged => {
            let body = json!({
                "challenge": true,
                "message": "Please complete verification",
                "botScore": result.score,
            });
            Response::builder()
                .status(200)
                .header("Content-Type", JSON_CONTENT_TYPE)
                .header(CHALLENGE_HINT_HEADER, CHALLENGE_MECHANISM)
                .body(body.to_string())
                .build()
        }
        Verdict::Allowed => {
            let body = json!({
                "status": "allowed",
                "botScore": result.score,
                "timestamp": result.timestamp,
            });
            Response::builder()
                .status(200)
                .header("Content-Type", JSON_CONTENT_TYPE)
                .body(body.to_string())
                .build()
        }
    }
}
