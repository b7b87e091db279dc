// Cell-level normalization: statuses, progress percentages, display text.
//
// Every function here is total. Coercion failures fall back to a safe
// default and never leave this module.
use crate::util::{clean_cell, parse_f64_safe};
use serde::{Deserialize, Serialize};

/// How a sector file stores its progress columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressEncoding {
    /// `0.85` means 85%. The default for every sector file seen so far.
    #[default]
    Fraction,
    /// `85` means 85%.
    Percentage,
}

/// Fraction-encoded values above this are almost certainly percentages that
/// will be amplified by the x100 policy.
pub const SUSPICIOUS_FRACTION: f64 = 1.5;

/// Trimmed, uppercased status or `None` for a blank cell.
///
/// Values outside the four known categories pass through unchanged here; the
/// aggregator leaves them out of its counts.
pub fn normalize_status(raw: Option<&str>) -> Option<String> {
    clean_cell(raw).map(|s| s.to_uppercase())
}

/// Progress fraction to percentage, `0.0` when the cell is blank or not a
/// number.
///
/// The value is always multiplied by 100. A file that already stores `85`
/// for 85% comes out as `8500`; sectors like that are configured with
/// [`ProgressEncoding::Percentage`] and go through [`normalize_progress`].
pub fn normalize_fraction_to_percentage(raw: Option<&str>) -> f64 {
    parse_f64_safe(clean_cell(raw)).map_or(0.0, |v| v * 100.0)
}

pub fn normalize_progress(raw: Option<&str>, encoding: ProgressEncoding) -> f64 {
    match encoding {
        ProgressEncoding::Fraction => normalize_fraction_to_percentage(raw),
        ProgressEncoding::Percentage => parse_f64_safe(clean_cell(raw)).unwrap_or(0.0),
    }
}

/// Like [`normalize_progress`] but keeps "no number here" distinct from zero,
/// for means that should skip blank cells.
pub fn progress_percentage(raw: Option<&str>, encoding: ProgressEncoding) -> Option<f64> {
    let v = parse_f64_safe(clean_cell(raw))?;
    Some(match encoding {
        ProgressEncoding::Fraction => v * 100.0,
        ProgressEncoding::Percentage => v,
    })
}

/// Render a cell for a metric card.
///
/// - blank → `N/A`
/// - numeric → one decimal, then ` unit` when there is a unit
/// - anything else → the raw text, then ` unit` when there is a unit
pub fn format_display_value(raw: Option<&str>, unit: Option<&str>) -> String {
    let Some(value) = clean_cell(raw) else {
        return "N/A".to_string();
    };
    let unit = clean_cell(unit);
    match (parse_f64_safe(Some(value)), unit) {
        (Some(n), Some(u)) => format!("{:.1} {}", n, u),
        (Some(n), None) => format!("{:.1}", n),
        (None, Some(u)) => format!("{} {}", value, u),
        (None, None) => value.to_string(),
    }
}

/// Render a progress cell as a percentage.
///
/// Text that already carries a `%` is shown as written.
pub fn format_progress_display(raw: Option<&str>, encoding: ProgressEncoding) -> String {
    let Some(value) = clean_cell(raw) else {
        return "N/A".to_string();
    };
    if value.contains('%') {
        return value.to_string();
    }
    match progress_percentage(Some(value), encoding) {
        Some(pct) => format!("{:.1}%", pct),
        None => value.to_string(),
    }
}

/// Colour band of a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressBand {
    OnTrack,
    NeedsAttention,
    OffTrack,
}

impl ProgressBand {
    pub fn from_percentage(pct: f64) -> ProgressBand {
        if pct >= 80.0 {
            ProgressBand::OnTrack
        } else if pct >= 50.0 {
            ProgressBand::NeedsAttention
        } else {
            ProgressBand::OffTrack
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProgressBand::OnTrack => "on track",
            ProgressBand::NeedsAttention => "needs attention",
            ProgressBand::OffTrack => "off track",
        }
    }
}
