// Utility helpers for parsing and number formatting.
//
// This module centralizes the "dirty" CSV number/date handling so the rest
// of the code can assume clean, typed values.
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in warehouse exports.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Strips thousands separators like `","` before parsing.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Same as [`parse_f64_safe`] but degrades to zero, which is what every
/// quantity and cost column wants.
pub fn parse_f64_or_zero(s: Option<&str>) -> f64 {
    parse_f64_safe(s).unwrap_or(0.0)
}

pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    // Exports carry either `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS` or `YYYYMMDD`.
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

/// Round half away from zero to `decimals` places.
pub fn round_to(n: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let r = (n * factor).round() / factor;
    // Avoid printing "-0.0" in outputs.
    if r == 0.0 {
        0.0
    } else {
        r
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimal places plus thousands separators (`1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in log lines (e.g. `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}
