use chrono::{DateTime, Local};
use humansize::DECIMAL;

use crate::core::system_monitor::Reading;

/// Placeholder for values the sampler could not read this tick
pub const NOT_AVAILABLE: &str = "N/A";

/// Format a byte count in human-readable format (kB, MB, GB)
pub fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, DECIMAL)
}

/// Format a transfer rate, e.g. `1.20 MB/s`
pub fn format_rate(bytes_per_sec: f64) -> String {
    let bytes = if bytes_per_sec.is_finite() && bytes_per_sec > 0.0 {
        bytes_per_sec.round() as u64
    } else {
        0
    };
    format!("{}/s", format_size(bytes))
}

/// Format a Unix timestamp as local wall-clock time (HH:MM:SS)
pub fn format_timestamp(timestamp: i64) -> String {
    if timestamp <= 0 {
        return "--:--:--".to_string();
    }
    match DateTime::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(&Local).format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

/// Render an available reading with `f`, or "N/A"
pub fn or_na<T, F>(reading: &Reading<T>, f: F) -> String
where
    F: FnOnce(&T) -> String,
{
    reading.map(f).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
