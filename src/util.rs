//! Small formatting helpers shared by the handlers and scripts.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]").expect("valid regex"));

/// Strip everything but ASCII digits and keep the last ten, so
/// `+91 98765-43210` and `09876543210` both resolve to the stored
/// `9876543210`. Shorter inputs are returned with only the non-digits removed.
pub fn extract_last10_digits(phone: &str) -> String {
    let digits = NON_DIGITS.replace_all(phone, "");
    // Only ASCII remains, so byte offsets are char boundaries.
    let skip = digits.len().saturating_sub(10);
    digits[skip..].to_string()
}

/// Referral codes are stored as `"CODE - Referrer Name"`; return the code part.
pub fn extract_referral_code(referred_by: &str) -> String {
    referred_by
        .split_once(" - ")
        .map(|(code, _)| code)
        .unwrap_or(referred_by)
        .trim()
        .to_string()
}

/// Long-form date such as `October 18, 2026`.
pub fn format_long_date(at: &DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}
