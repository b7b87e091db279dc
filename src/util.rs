// Utility helpers for cell cleaning, header keys and number formatting.
//
// This module centralizes the "dirty" spreadsheet handling so the rest of
// the code can assume trimmed, typed values.
use num_format::{Locale, ToFormattedString};

/// Turn a raw cell into `None` when it carries no value.
///
/// Spreadsheet exports represent blanks as empty strings, whitespace, or the
/// literal `NaN`; all of them count as missing.
pub fn clean_cell(s: Option<&str>) -> Option<&str> {
    let s = s?.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") {
        return None;
    }
    Some(s)
}

/// Canonical comparison key for a column label.
///
/// - trims and lowercases,
/// - maps space, `/` and `-` to `_`,
/// - drops `(`, `)` and `.`.
///
/// `None` and empty input give an empty key. Applying it twice gives the
/// same result as applying it once.
pub fn normalize_header(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };
    let key: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '/' | '-' => Some('_'),
            '(' | ')' | '.' => None,
            other => Some(other),
        })
        .collect();
    // Dropping a trailing `)` can expose a tab or other whitespace.
    key.trim().to_string()
}

/// Numeric reading of a spreadsheet cell.
///
/// Surrounding whitespace and `,` thousands separators are tolerated. Text
/// with letters in it (other than an exponent marker) is not a number, which
/// keeps `n/a`, `nan` and `inf` out. Non-finite results are rejected too.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let cell = s?.trim();
    if cell.is_empty()
        || cell
            .chars()
            .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E'))
    {
        return None;
    }
    cell.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Arithmetic mean, 0 for an empty slice.
pub fn average(values: &[f64]) -> f64 {
    match values.len() {
        0 => 0.0,
        n => values.iter().sum::<f64>() / n as f64,
    }
}

/// `decimals` fixed places with `en` thousands grouping (`1,234.5`).
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (whole, frac) = match fixed.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (fixed.as_str(), None),
    };
    let grouped = whole
        .parse::<u64>()
        .map(|w| w.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| whole.to_string());
    let sign = if n.is_sign_negative() && n != 0.0 { "-" } else { "" };
    match frac {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Counts in console messages, e.g. `1,204 rows`.
pub fn format_int<T: ToFormattedString>(n: T) -> String {
    n.to_formatted_string(&Locale::en)
}
