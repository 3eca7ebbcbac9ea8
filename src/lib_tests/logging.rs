// src/lib_tests/logging.rs
// Tests for the log line helpers

use std::io::{self, Write};

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"))
    }
}

#[test]
fn write_log_line_ignores_write_errors() {
    let mut out = FailingWriter;
    crate::write_log_line(&mut out, "[security-event] {}");
}

#[test]
fn write_log_line_terminates_each_message() {
    let mut out: Vec<u8> = Vec::new();
    crate::write_log_line(&mut out, "[robots] first");
    crate::write_log_line(&mut out, "[robots] second");
    assert_eq!(String::from_utf8(out).unwrap(), "[robots] first\n[robots] second\n");
}

#[test]
fn iso_timestamp_uses_zulu_and_millis() {
    use chrono::TimeZone;
    let at = chrono::Utc
        .timestamp_millis_opt(1_792_396_800_123)
        .unwrap();
    let formatted = crate::iso_timestamp(at);
    assert!(formatted.ends_with(".123Z"), "{formatted}");
    assert_eq!(formatted.len(), "2026-10-19T00:00:00.123Z".len());
}
