//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;

/// Format an overdue duration for display, e.g. `1h 15m`
pub fn format_overdue(overdue: Duration) -> String {
    let minutes = overdue.num_minutes().max(0);
    match (minutes / 60, minutes % 60) {
        (0, m) => format!("{}m", m),
        (h, 0) => format!("{}h", h),
        (h, m) => format!("{}h {}m", h, m),
    }
}

/// Format a report date for display
pub fn format_report_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Truncate text to a maximum number of characters with ellipsis
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// A full name is two to four words made of letters, hyphens or apostrophes
pub fn is_valid_full_name(text: &str) -> bool {
    static FULL_NAME: OnceLock<Option<Regex>> = OnceLock::new();
    FULL_NAME
        .get_or_init(|| Regex::new(r"^\p{L}[\p{L}'\-]*(\s+\p{L}[\p{L}'\-]*){1,3}$").ok())
        .as_ref()
        .map(|re| re.is_match(text.trim()))
        .unwrap_or(false)
}

/// Parse a Telegram user id typed as plain digits or a `tg://user?id=` link
pub fn parse_user_id(text: &str) -> Option<i64> {
    let text = text.trim();
    text.strip_prefix("tg://user?id=")
        .unwrap_or(text)
        .parse::<i64>()
        .ok()
}
