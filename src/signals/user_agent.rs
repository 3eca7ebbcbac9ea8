// src/signals/user_agent.rs
// User-agent denylist for automation tools, headless browsers and fetch libraries.

/// Lowercase substrings that mark a client as automated. Matching is ASCII
/// case-insensitive against the raw `User-Agent` value.
pub const SUSPICIOUS_AGENT_PATTERNS: &[&str] = &[
    "headless",
    "phantom",
    "selenium",
    "crawl",
    "bot",
    "spider",
    "scraper",
    "python-requests",
    "curl",
    "wget",
    "httpclient",
    "scanner",
    "attack",
];

/// Return the first denylist entry found in `user_agent`, if any.
pub fn matched_suspicious_pattern(user_agent: &str) -> Option<&'static str> {
    if user_agent.is_empty() {
        return None;
    }
    let lowered = user_agent.to_ascii_lowercase();
    SUSPICIOUS_AGENT_PATTERNS
        .iter()
        .copied()
        .find(|pattern| lowered.contains(pattern))
}

pub fn is_suspicious_user_agent(user_agent: &str) -> bool {
    matched_suspicious_pattern(user_agent).is_some()
}
