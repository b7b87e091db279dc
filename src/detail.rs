//! Selection-driven detail lookup.
//!
//! The selection cascades: picking only a group fills in its first subgroup,
//! and a missing item falls back to the first item under what has been
//! selected so far. This lets a detail panel render right after the top
//! level is chosen.

use crate::reports::{item_options, subgroup_options};
use crate::schema::CanonicalSchema;
use crate::types::{DetailFieldRow, Horizon, Record};
use crate::values::{
    format_display_value, format_progress_display, normalize_progress, ProgressBand,
    ProgressEncoding,
};
use serde::Serialize;

/// User selection; `None` means "not selected yet".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub group: Option<String>,
    pub subgroup: Option<String>,
    pub item: Option<String>,
}

impl Selection {
    pub fn group(group: impl Into<String>) -> Self {
        Selection {
            group: Some(group.into()),
            ..Selection::default()
        }
    }
}

/// Fill unselected levels with the first available value.
pub fn cascade(records: &[Record], schema: &CanonicalSchema, selection: &Selection) -> Selection {
    let group = selection.group.clone();
    let mut subgroup = selection.subgroup.clone();
    if subgroup.is_none() && schema.has_subgroup_level() {
        if let Some(g) = group.as_deref() {
            subgroup = subgroup_options(records, schema, g).into_iter().next();
        }
    }
    let mut item = selection.item.clone();
    if item.is_none() && (group.is_some() || subgroup.is_some()) {
        item = item_options(records, schema, group.as_deref(), subgroup.as_deref())
            .into_iter()
            .next();
    }
    Selection { group, subgroup, item }
}

/// First record matching the cascaded selection, or `None` (not found).
///
/// Matching is exact and case-sensitive on the normalized values.
pub fn resolve_detail<'a>(
    records: &'a [Record],
    schema: &CanonicalSchema,
    group_value: Option<&str>,
    subgroup_value: Option<&str>,
    item_value: Option<&str>,
) -> Option<&'a Record> {
    if !schema.is_complete() {
        return None;
    }
    let selection = cascade(
        records,
        schema,
        &Selection {
            group: group_value.map(str::to_string),
            subgroup: subgroup_value.map(str::to_string),
            item: item_value.map(str::to_string),
        },
    );
    let item = selection.item.as_deref()?;
    records.iter().find(|r| {
        r.item_name.as_deref() == Some(item)
            && selection
                .group
                .as_deref()
                .map_or(true, |g| r.group.as_deref() == Some(g))
            && selection
                .subgroup
                .as_deref()
                .map_or(true, |s| r.subgroup.as_deref() == Some(s))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressDisplay {
    pub text: String,
    /// Bar value; 0 when the cell is blank or not a number.
    pub percentage: f64,
    pub band: ProgressBand,
}

impl ProgressDisplay {
    fn from_cell(raw: Option<&str>, encoding: ProgressEncoding) -> Self {
        let percentage = normalize_progress(raw, encoding);
        ProgressDisplay {
            text: format_progress_display(raw, encoding),
            percentage,
            band: ProgressBand::from_percentage(percentage),
        }
    }
}

/// Display-ready fields of one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub group: String,
    pub subgroup: Option<String>,
    pub item: String,
    pub unit: Option<String>,
    pub baseline: String,
    pub target_near: String,
    pub target_far: String,
    pub current_progress: String,
    pub progress_near: ProgressDisplay,
    pub progress_far: ProgressDisplay,
    pub status_near: String,
    pub status_far: String,
    pub drivers: String,
    pub challenges: String,
    pub catch_up: String,
}

fn text_or_na(v: Option<&str>) -> String {
    v.unwrap_or("N/A").to_string()
}

impl DetailView {
    pub fn from_record(record: &Record, encoding: ProgressEncoding) -> Self {
        let unit = record.unit.as_deref();
        DetailView {
            group: record.group.clone().unwrap_or_default(),
            subgroup: record.subgroup.clone(),
            item: record.item_name.clone().unwrap_or_default(),
            unit: record.unit.clone(),
            baseline: format_display_value(record.baseline.as_deref(), unit),
            target_near: format_display_value(record.target_near.as_deref(), unit),
            target_far: format_display_value(record.target_far.as_deref(), unit),
            current_progress: format_display_value(record.current_progress.as_deref(), unit),
            progress_near: ProgressDisplay::from_cell(record.progress(Horizon::Near), encoding),
            progress_far: ProgressDisplay::from_cell(record.progress(Horizon::Far), encoding),
            status_near: text_or_na(record.status(Horizon::Near)),
            status_far: text_or_na(record.status(Horizon::Far)),
            drivers: text_or_na(record.drivers.as_deref()),
            challenges: text_or_na(record.challenges.as_deref()),
            catch_up: text_or_na(record.catch_up.as_deref()),
        }
    }

    pub fn field_rows(&self) -> Vec<DetailFieldRow> {
        let mut rows = vec![("Group", self.group.clone())];
        if let Some(s) = &self.subgroup {
            rows.push(("Subgroup", s.clone()));
        }
        rows.extend([
            ("Item", self.item.clone()),
            ("Baseline", self.baseline.clone()),
            ("FY 2024/25 Target", self.target_near.clone()),
            ("Mid Term Target (2026/27)", self.target_far.clone()),
            ("Current Progress", self.current_progress.clone()),
            (
                "FY 2024/25 Percentage Progress",
                format!("{} ({})", self.progress_near.text, self.progress_near.band.as_str()),
            ),
            ("Status based on 2024/25 Target", self.status_near.clone()),
            (
                "Mid Term Percentage Progress",
                format!("{} ({})", self.progress_far.text, self.progress_far.band.as_str()),
            ),
            ("Status based on 2026/27 Target", self.status_far.clone()),
            ("Major drivers of performance", self.drivers.clone()),
            ("Challenges", self.challenges.clone()),
            ("Catch up plans", self.catch_up.clone()),
        ]);
        rows.into_iter()
            .map(|(field, value)| DetailFieldRow {
                field: field.to_string(),
                value,
            })
            .collect()
    }
}
