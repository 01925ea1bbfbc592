//! Shared utility functions for payload coercion and common operations.
//!
//! ## JSON Extraction Helpers
//!
//! Ergonomic helpers for extracting values from `serde_json::Value`:
//! - `json_string`, `json_non_empty` - Extract strings
//! - `json_string_array` - Extract string arrays
//! - `json_seconds` - Extract a time value given as number or `MM:SS` string
//!
//! ## Time Helpers
//!
//! - `parse_time_string` - `HH:MM:SS` / `MM:SS` to seconds
//! - `now_millis`, `now_rfc3339` - timestamps in the persisted formats

use serde::Serialize;
use std::fmt::Display;

// =============================================================================
// JSON Value Extraction Helpers
// =============================================================================

/// Extract string from JSON value by key.
#[inline]
pub fn json_string(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(String::from)
}

/// Extract a non-blank string.
#[inline]
pub fn json_non_empty(value: &serde_json::Value, key: &str) -> Option<String> {
    json_string(value, key).filter(|s| !s.trim().is_empty())
}

/// Extract string array from JSON value by key. Non-string items are skipped.
#[inline]
pub fn json_string_array(value: &serde_json::Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|s| s.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// Extract a time value in seconds.
///
/// Numbers are taken as seconds (negatives clamp to 0); numeric strings are
/// seconds too; anything else goes through [`parse_time_string`].
pub fn json_seconds(value: &serde_json::Value, key: &str) -> u64 {
    match value.get(key) {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0).round() as u64))
            .unwrap_or(0),
        Some(serde_json::Value::String(s)) => {
            let trimmed = s.trim();
            trimmed
                .parse::<u64>()
                .unwrap_or_else(|_| parse_time_string(trimmed))
        }
        _ => 0,
    }
}

// =============================================================================
// Time Utilities
// =============================================================================

/// Convert `MM:SS` or `HH:MM:SS` into seconds.
///
/// Components are read right to left and weighted by powers of 60. An empty
/// input, an input without `:`, or any non-numeric component yields 0.
pub fn parse_time_string(input: &str) -> u64 {
    let input = input.trim();
    if input.is_empty() || !input.contains(':') {
        return 0;
    }

    let mut total: u64 = 0;
    for (index, part) in input.split(':').rev().enumerate() {
        let Ok(value) = part.trim().parse::<u64>() else {
            return 0;
        };
        let weight = 60u64.saturating_pow(index as u32);
        total = total.saturating_add(value.saturating_mul(weight));
    }
    total
}

/// Split a chapter range like `"00:00-05:30"` into start and end seconds.
pub fn parse_time_range(range: &str) -> (u64, u64) {
    match range.split_once('-') {
        Some((start, end)) => (parse_time_string(start), parse_time_string(end)),
        None => (parse_time_string(range), 0),
    }
}

/// Format seconds as `MM:SS`, or `H:MM:SS` past one hour.
pub fn format_seconds(total: u64) -> String {
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Current time as epoch milliseconds.
#[inline]
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Current time as an RFC 3339 UTC string.
#[inline]
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

// =============================================================================
// Misc
// =============================================================================

/// Serialize an enum to its serde string representation (without quotes).
pub fn enum_to_str<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_default()
        .trim_matches('"')
        .to_string()
}

/// Filter an iterator of Results, logging errors at warn level before discarding.
pub fn log_filter_warn<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}: {}", context, e);
            None
        }
    }
}
