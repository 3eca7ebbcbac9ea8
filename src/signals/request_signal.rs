// src/signals/request_signal.rs
// Per-request classification input, normalised from edge-provided headers.

use spin_sdk::http::Request;

pub const BOT_SCORE_HEADER: &str = "x-bot-score";
pub const BOT_VERIFIED_HEADER: &str = "x-bot-verified";
pub const GEO_COUNTRY_HEADER: &str = "x-geo-country";
pub const GEO_ASN_HEADER: &str = "x-geo-asn";

const SCORE_MAX: i64 = 100;

/// Everything the classifier and event recorder read from one request.
/// All fields are already defaulted; nothing here is optional to the policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestSignal {
    pub reputation_score: u8,
    pub verified: bool,
    pub user_agent: String,
    pub referer: String,
    pub client_address: String,
    pub country: Option<String>,
    pub network_origin: Option<String>,
}

impl RequestSignal {
    pub fn new(reputation_score: u8, verified: bool, user_agent: impl Into<String>) -> Self {
        Self {
            reputation_score: reputation_score.min(SCORE_MAX as u8),
            verified,
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }

    pub fn with_client_address(mut self, address: impl Into<String>) -> Self {
        self.client_address = address.into();
        self
    }

    /// Read the signal from an inbound request. Score, verification and geo
    /// headers are only honoured when the edge proxy is trusted; otherwise they
    /// take their defaults (score 0, unverified, no geo).
    pub fn from_request(req: &Request, edge_trusted: bool) -> Self {
        let header = |name: &str| crate::header_str(req, name);

        let (reputation_score, verified, country, network_origin) = if edge_trusted {
            (
                header(BOT_SCORE_HEADER).map(parse_reputation_score).unwrap_or(0),
                header(BOT_VERIFIED_HEADER)
                    .and_then(crate::config::parse_bool_like)
                    .unwrap_or(false),
                header(GEO_COUNTRY_HEADER).and_then(crate::input_validation::normalize_country_code),
                header(GEO_ASN_HEADER).and_then(crate::input_validation::normalize_network_origin),
            )
        } else {
            (0, false, None, None)
        };

        Self {
            reputation_score,
            verified,
            user_agent: header("user-agent").unwrap_or("").to_string(),
            referer: header("referer").unwrap_or("").to_string(),
            client_address: crate::extract_client_ip(req, edge_trusted),
            country,
            network_origin,
        }
    }
}

/// Parse a reputation score, clamping into 0..=100. Unparseable values count as
/// "no score available" and yield 0.
pub fn parse_reputation_score(raw: &str) -> u8 {
    parse_score_value(raw).unwrap_or(0)
}

/// Like `parse_reputation_score` but keeps "not a number" distinguishable from 0.
pub fn parse_score_value(raw: &str) -> Option<u8> {
    parse_precise_score(raw).map(truncate_score)
}

/// Clamped score without truncating a fractional part ("90.5" stays 90.5).
pub(crate) fn parse_precise_score(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value.clamp(0, SCORE_MAX) as f64);
    }
    // Some edges forward the score as a float ("87.0").
    trimmed.parse::<f64>().ok().and_then(clamp_precise_score)
}

pub(crate) fn clamp_precise_score(value: f64) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    Some(value.clamp(0.0, SCORE_MAX as f64))
}

pub(crate) fn truncate_score(value: f64) -> u8 {
    value as u8
}
