//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDate, Utc};
use rand::Rng;
use regex::Regex;
use uuid::Uuid;

/// Date format used for audit dates and report file names
pub const AUDIT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Generate a new UUID v4
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a random 6-digit numeric invite code
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();
    rng.gen_range(100_000..1_000_000u32).to_string()
}

/// Check that an invite code is exactly six ASCII digits
pub fn is_valid_invite_code(code: &str) -> bool {
    static INVITE_CODE: OnceLock<Regex> = OnceLock::new();
    INVITE_CODE
        .get_or_init(|| Regex::new(r"^\d{6}$").expect("invite code pattern is valid"))
        .is_match(code)
}

/// Validate email format
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"))
        .is_match(email)
}

/// Calendar day (local timezone) a record created at `timestamp` belongs to
pub fn audit_date_for(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format(AUDIT_DATE_FORMAT).to_string()
}

/// Format an audit date
pub fn format_audit_date(date: NaiveDate) -> String {
    date.format(AUDIT_DATE_FORMAT).to_string()
}

/// Parse an audit date string
pub fn parse_audit_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, AUDIT_DATE_FORMAT).ok()
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%d.%m.%Y %H:%M").to_string()
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept.trim_end())
    }
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Sanitize a filename component for safe storage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Convert a byte count to megabytes
pub fn bytes_to_megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// Convert bytes to human readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invite_code_shape() {
        for _ in 0..100 {
            let code = generate_invite_code();
            assert_eq!(code.len(), 6);
            assert!(is_valid_invite_code(&code));
        }
        assert!(!is_valid_invite_code("12345"));
        assert!(!is_valid_invite_code("12a456"));
        assert!(!is_valid_invite_code(" 123456"));
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello world", 8), "hello...");
        assert_eq!(truncate_text("çğüşöı çğüşöı", 9), "çğüşöı...");
    }

    #[test]
    fn test_audit_date_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(format_audit_date(date), "2024-03-09");
        assert_eq!(parse_audit_date("2024-03-09"), Some(date));
        assert_eq!(parse_audit_date("09.03.2024"), None);
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("line.lead@plant.example"));
        assert!(!is_valid_email("line.lead"));
        assert!(!is_valid_email("a b@c.d"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("user-1_a"), "user-1_a");
        assert_eq!(sanitize_filename("../etc/passwd"), "___etc_passwd");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(1024), "1.0 KB");
        assert_eq!(format_bytes(500), "500 B");
        assert!((bytes_to_megabytes(1_048_576) - 1.0).abs() < f64::EPSILON);
    }
}
