// src/config/mod.rs
// Runtime configuration for the edge gate.
// Every tunable comes from an EDGE_GATE_* environment variable and falls back to a
// validated default, so a missing or broken value never stops request handling.

use std::env;

pub const DEFAULT_DENY_SCORE_THRESHOLD: u8 = 80;
pub const DEFAULT_CHALLENGE_SCORE_THRESHOLD: u8 = 30;
pub const DEFAULT_ALERT_SCORE_THRESHOLD: u8 = 90;
pub const DEFAULT_MAX_REPORT_BYTES: usize = 16 * 1024;
pub const DEFAULT_ROBOTS_CRAWL_DELAY: u32 = 1;
pub const DEFAULT_EVENT_RETENTION_HOURS: u64 = 168;

const MAX_REPORT_BYTES_MIN: usize = 256;
const MAX_REPORT_BYTES_MAX: usize = 64 * 1024;
const ROBOTS_CRAWL_DELAY_MAX: u32 = 60;
const EVENT_RETENTION_HOURS_MAX: u64 = 24 * 365;
const SCORE_MAX: u8 = 100;

const ENV_DENY_SCORE_THRESHOLD: &str = "EDGE_GATE_DENY_SCORE_THRESHOLD";
const ENV_CHALLENGE_SCORE_THRESHOLD: &str = "EDGE_GATE_CHALLENGE_SCORE_THRESHOLD";
const ENV_ALERT_SCORE_THRESHOLD: &str = "EDGE_GATE_ALERT_SCORE_THRESHOLD";
const ENV_MAX_REPORT_BYTES: &str = "EDGE_GATE_MAX_REPORT_BYTES";
const ENV_EDGE_SECRET: &str = "EDGE_GATE_EDGE_SECRET";
const ENV_STRICT_EVENT_DELIVERY: &str = "EDGE_GATE_STRICT_EVENT_DELIVERY";
const ENV_ROBOTS_ENABLED: &str = "EDGE_GATE_ROBOTS_ENABLED";
const ENV_ROBOTS_CRAWL_DELAY: &str = "EDGE_GATE_ROBOTS_CRAWL_DELAY";
const ENV_SITEMAP_URL: &str = "EDGE_GATE_SITEMAP_URL";
const ENV_EVENT_RETENTION_HOURS: &str = "EDGE_GATE_EVENT_RETENTION_HOURS";

/// Score cut-offs for the classifier and the event escalation rule.
///
/// Invariant: `challenge_above < deny_above <= 100`. The score bands are
/// `0..=challenge_above` (allow), `challenge_above+1..=deny_above` (challenge)
/// and `deny_above+1..=100` (deny unless verified).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreThresholds {
    pub deny_above: u8,
    pub challenge_above: u8,
    pub alert_above: u8,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            deny_above: DEFAULT_DENY_SCORE_THRESHOLD,
            challenge_above: DEFAULT_CHALLENGE_SCORE_THRESHOLD,
            alert_above: DEFAULT_ALERT_SCORE_THRESHOLD,
        }
    }
}

impl ScoreThresholds {
    pub fn is_valid(&self) -> bool {
        self.challenge_above < self.deny_above
            && self.deny_above <= SCORE_MAX
            && self.alert_above <= SCORE_MAX
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateConfig {
    pub thresholds: ScoreThresholds,
    pub max_report_bytes: usize,
    /// Shared secret the edge proxy presents in `x-edge-secret`. When unset,
    /// edge metadata headers are trusted as-is.
    pub edge_secret: Option<String>,
    pub strict_event_delivery: bool,
    pub robots_enabled: bool,
    pub robots_crawl_delay: u32,
    pub sitemap_url: Option<String>,
    /// Hours a persisted security event is kept in KV. 0 keeps records forever.
    pub event_retention_hours: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            thresholds: ScoreThresholds::default(),
            max_report_bytes: DEFAULT_MAX_REPORT_BYTES,
            edge_secret: None,
            strict_event_delivery: false,
            robots_enabled: true,
            robots_crawl_delay: DEFAULT_ROBOTS_CRAWL_DELAY,
            sitemap_url: None,
            event_retention_hours: DEFAULT_EVENT_RETENTION_HOURS,
        }
    }
}

impl GateConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup. Used by `from_env` and
    /// by tests that should not touch the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ScoreThresholds::default();
        let parsed = ScoreThresholds {
            deny_above: parse_score(lookup(ENV_DENY_SCORE_THRESHOLD).as_deref(), defaults.deny_above),
            challenge_above: parse_score(
                lookup(ENV_CHALLENGE_SCORE_THRESHOLD).as_deref(),
                defaults.challenge_above,
            ),
            alert_above: parse_score(lookup(ENV_ALERT_SCORE_THRESHOLD).as_deref(), defaults.alert_above),
        };
        let thresholds = if parsed.is_valid() {
            parsed
        } else {
            crate::log_line(&format!(
                "[config] invalid score thresholds deny={} challenge={} alert={}; using defaults",
                parsed.deny_above, parsed.challenge_above, parsed.alert_above
            ));
            defaults
        };

        Self {
            thresholds,
            max_report_bytes: parse_max_report_bytes(lookup(ENV_MAX_REPORT_BYTES).as_deref()),
            edge_secret: non_empty(lookup(ENV_EDGE_SECRET)),
            strict_event_delivery: lookup(ENV_STRICT_EVENT_DELIVERY)
                .as_deref()
                .and_then(parse_bool_like)
                .unwrap_or(false),
            robots_enabled: lookup(ENV_ROBOTS_ENABLED)
                .as_deref()
                .and_then(parse_bool_like)
                .unwrap_or(true),
            robots_crawl_delay: parse_crawl_delay(lookup(ENV_ROBOTS_CRAWL_DELAY).as_deref()),
            sitemap_url: non_empty(lookup(ENV_SITEMAP_URL)),
            event_retention_hours: parse_event_retention_hours(
                lookup(ENV_EVENT_RETENTION_HOURS).as_deref(),
            ),
        }
    }
}

pub fn parse_bool_like(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_score(value: Option<&str>, default_value: u8) -> u8 {
    value
        .and_then(|v| v.trim().parse::<u8>().ok())
        .unwrap_or(default_value)
}

pub(crate) fn parse_max_report_bytes(value: Option<&str>) -> usize {
    value
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(DEFAULT_MAX_REPORT_BYTES)
        .clamp(MAX_REPORT_BYTES_MIN, MAX_REPORT_BYTES_MAX)
}

pub(crate) fn parse_crawl_delay(value: Option<&str>) -> u32 {
    value
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(DEFAULT_ROBOTS_CRAWL_DELAY)
        .min(ROBOTS_CRAWL_DELAY_MAX)
}

pub(crate) fn parse_event_retention_hours(value: Option<&str>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_EVENT_RETENTION_HOURS)
        .min(EVENT_RETENTION_HOURS_MAX)
}
