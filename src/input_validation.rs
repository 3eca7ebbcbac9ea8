use std::net::IpAddr;

pub const MAX_EVENT_FIELD_CHARS: usize = 512;
pub const MAX_NETWORK_ORIGIN_CHARS: usize = 64;

pub fn enforce_body_size(body: &[u8], max_bytes: usize) -> Result<(), &'static str> {
    if body.len() > max_bytes {
        return Err("Payload too large");
    }
    Ok(())
}

pub fn parse_ip_addr(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<IpAddr>().ok().map(|addr| addr.to_string())
}

/// Strip control characters and cap the length of a caller-supplied string so
/// it can be written to a log line or KV record verbatim.
pub fn sanitize_event_field(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_EVENT_FIELD_CHARS)
        .collect()
}

/// Normalise an edge-provided country code to two uppercase ASCII characters.
/// Edges use a few non-ISO placeholders (`XX`, `T1`), so only the shape is checked.
pub fn normalize_country_code(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.len() != 2 || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(trimmed.to_ascii_uppercase())
}

pub fn normalize_network_origin(value: &str) -> Option<String> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' '))
        .take(MAX_NETWORK_ORIGIN_CHARS)
        .collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}
