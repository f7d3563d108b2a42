//! Common utilities for document generation.
//!
//! Shared helpers for Indonesian date formatting, download filenames and
//! report column keys.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use serde_json::Value;

const MONTHS: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Format current date in Indonesian format (e.g., "30 Desember 2025").
pub fn format_indonesian_date() -> String {
    format_long_date(Local::now().date_naive())
}

/// Format a date as "<day> <month name> <year>" using the fixed month table.
pub fn format_long_date(date: NaiveDate) -> String {
    let month = MONTHS[(date.month0() as usize).min(MONTHS.len() - 1)];
    format!("{} {} {}", date.day(), month, date.year())
}

/// Parse a machine date: `2024-07-28`, an RFC 3339 timestamp, or a naive
/// `2024-07-28T10:00:00` timestamp.
pub fn parse_machine_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|dt| dt.date())
}

/// Reformat a machine date into the long Indonesian form.
///
/// Strings that are not machine dates are returned unchanged.
pub fn reformat_date(value: &str) -> String {
    match parse_machine_date(value) {
        Some(date) => format_long_date(date),
        None => value.to_string(),
    }
}

/// Replace every whitespace run with a single underscore.
pub fn underscore_spaces(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Build a download filename: `<label>_<entity with underscores>.<ext>`.
pub fn download_filename(label: &str, entity: &str, extension: &str) -> String {
    let entity = underscore_spaces(entity);
    let raw = if entity.is_empty() {
        format!("{}.{}", label, extension)
    } else {
        format!("{}_{}.{}", label, entity, extension)
    };
    sanitize_filename::sanitize(raw)
}

/// Map a report column label to the record key holding its value.
///
/// `"Nama Siswa"` becomes `nama_siswa`, `"NIS"` becomes `nis`.
pub fn column_key(label: &str) -> String {
    label
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// Keep at most `max` characters.
pub fn truncate_chars(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Render a JSON value as display text. Null becomes empty.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}
