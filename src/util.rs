// Utility helpers for cell coercion and basic statistics.
//
// This module centralizes all the "dirty" spreadsheet/number handling so the
// rest of the code can work with `Option<f64>` where `None` means "missing"
// and is never silently turned into zero.
use crate::types::CellValue;
use num_format::{Locale, ToFormattedString};

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in spreadsheet exports (commas, spaces).
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

/// Numeric view of a cell: numbers pass through, text goes through
/// `parse_f64_safe`, everything else is missing.
pub fn coerce_number(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Number(n) if n.is_finite() => Some(*n),
        CellValue::Text(s) => parse_f64_safe(Some(s)),
        _ => None,
    }
}

/// `true` for an optionally signed decimal such as `-12`, `35.5` or `.5`.
fn is_signed_decimal(s: &str) -> bool {
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    let mut seen_digit = false;
    let mut seen_dot = false;
    for c in digits.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return false,
        }
    }
    seen_digit
}

/// Normalize a host utilization cell into a fraction in `[0, 1]`.
///
/// Accepts `"35%"`, `35` and `0.35` alike: a trailing `%` is stripped and any
/// magnitude above 1 is read as a percentage. Exactly `1` stays `1.0`.
/// Unparseable input is `None`, not zero.
pub fn normalize_percentage(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Number(n) if n.is_finite() => *n,
        CellValue::Text(s) => {
            let s = s.trim();
            let s = s.strip_suffix('%').unwrap_or(s).trim();
            if !is_signed_decimal(s) {
                return None;
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    let value = if value.abs() > 1.0 { value / 100.0 } else { value };
    Some(value.clamp(0.0, 1.0))
}

/// Sum of the present values; missing ones contribute nothing.
pub fn sum_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    values.into_iter().flatten().sum()
}

/// Mean of the present values; `0.0` when nothing is present.
pub fn mean_present<I>(values: I) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    average(&present)
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Format a floating-point value with:
    // - a fixed number of decimal places, and
    // - locale-aware thousands separators (e.g., `1,234,567.89`).
    let neg = n.is_sign_negative() && n != 0.0;
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
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
    // Thin wrapper around `num-format` for integer-like values, used for
    // counts in console messages and the summary (e.g., `1,024 VMs`).
    n.to_formatted_string(&Locale::en)
}

/// `part / whole` as a percentage string with one decimal, `0.0%` when empty.
pub fn format_share(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", part as f64 * 100.0 / whole as f64)
}
