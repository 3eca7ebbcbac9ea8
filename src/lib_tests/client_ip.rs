// src/lib_tests/client_ip.rs
// Edge header trust and client address extraction

use crate::config::GateConfig;
use crate::test_support::request_with_headers;
use crate::{edge_headers_trusted, extract_client_ip};

fn with_secret(secret: &str) -> GateConfig {
    GateConfig {
        edge_secret: Some(secret.to_string()),
        ..GateConfig::default()
    }
}

#[test]
fn headers_trusted_when_no_secret_configured() {
    let req = request_with_headers("/", &[]);
    assert!(edge_headers_trusted(&req, &GateConfig::default()));
}

#[test]
fn headers_require_matching_secret_when_configured() {
    let cfg = with_secret("edge-secret");
    let missing = request_with_headers("/", &[]);
    let wrong = request_with_headers("/", &[("x-edge-secret", "nope")]);
    let right = request_with_headers("/", &[("x-edge-secret", "edge-secret")]);

    assert!(!edge_headers_trusted(&missing, &cfg));
    assert!(!edge_headers_trusted(&wrong, &cfg));
    assert!(edge_headers_trusted(&right, &cfg));
}

#[test]
fn connecting_ip_header_wins() {
    let req = request_with_headers(
        "/",
        &[
            ("cf-connecting-ip", "203.0.113.1"),
            ("x-forwarded-for", "198.51.100.2, 10.0.0.1"),
        ],
    );
    assert_eq!(extract_client_ip(&req, true), "203.0.113.1");
}

#[test]
fn forwarded_for_uses_first_entry() {
    let req = request_with_headers("/", &[("x-forwarded-for", "198.51.100.2, 10.0.0.1")]);
    assert_eq!(extract_client_ip(&req, true), "198.51.100.2");
}

#[test]
fn invalid_addresses_are_skipped() {
    let req = request_with_headers(
        "/",
        &[
            ("cf-connecting-ip", "unknown"),
            ("x-forwarded-for", "garbage"),
            ("x-real-ip", "192.0.2.77"),
        ],
    );
    assert_eq!(extract_client_ip(&req, true), "192.0.2.77");
}

#[test]
fn untrusted_or_missing_address_is_empty() {
    let req = request_with_headers("/", &[("cf-connecting-ip", "203.0.113.1")]);
    assert_eq!(extract_client_ip(&req, false), "");
    assert_eq!(extract_client_ip(&request_with_headers("/", &[]), true), "");
}
