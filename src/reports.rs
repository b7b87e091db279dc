use crate::schema::CanonicalSchema;
use crate::types::{
    AggregateSummary, CanonicalKey, GroupBreakdown, GroupCountRow, GroupOverview, Horizon, Record,
    StatusBreakdown, StatusCategory, StatusTableRow,
};
use crate::util::average;
use crate::values::{progress_percentage, ProgressEncoding};
use std::collections::HashSet;

/// Distinct non-missing values of one field, in first-occurrence order.
fn distinct_in_order<'a, I>(values: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .flatten()
        .filter(|v| seen.insert(*v))
        .collect()
}

fn count_statuses<'a, I>(records: I, horizon: Horizon) -> StatusBreakdown
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut breakdown = StatusBreakdown::default();
    for r in records {
        if let Some(cat) = r.status(horizon).and_then(StatusCategory::from_normalized) {
            breakdown.increment(cat);
        }
    }
    breakdown
}

/// Status counts for one group and horizon.
///
/// All four categories are always present. Against an incomplete schema, or
/// when the horizon has no status column, every count is zero.
pub fn compute_breakdown(
    records: &[Record],
    schema: &CanonicalSchema,
    group_value: &str,
    horizon: Horizon,
) -> StatusBreakdown {
    if !schema.is_complete() || !schema.has_status(horizon) {
        return StatusBreakdown::default();
    }
    count_statuses(
        records
            .iter()
            .filter(|r| r.group.as_deref() == Some(group_value)),
        horizon,
    )
}

/// Status counts across every record of the sector.
pub fn compute_overall_breakdown(
    records: &[Record],
    schema: &CanonicalSchema,
    horizon: Horizon,
) -> StatusBreakdown {
    if !schema.is_complete() || !schema.has_status(horizon) {
        return StatusBreakdown::default();
    }
    count_statuses(records, horizon)
}

pub fn compute_summary(records: &[Record], schema: &CanonicalSchema) -> AggregateSummary {
    if !schema.is_complete() || records.is_empty() {
        return AggregateSummary::default();
    }

    let groups = distinct_in_order(records.iter().map(|r| r.group.as_deref()));
    let subgroups = distinct_in_order(records.iter().map(|r| r.subgroup.as_deref()));
    let items = distinct_in_order(records.iter().map(|r| r.item_name.as_deref()));

    let breakdowns = groups
        .iter()
        .map(|g| GroupBreakdown {
            group: g.to_string(),
            near: compute_breakdown(records, schema, g, Horizon::Near),
            far: compute_breakdown(records, schema, g, Horizon::Far),
        })
        .collect();

    AggregateSummary {
        record_count: records.len(),
        group_count: groups.len(),
        subgroup_count: subgroups.len(),
        item_count: items.len(),
        breakdowns,
        overall_near: compute_overall_breakdown(records, schema, Horizon::Near),
        overall_far: compute_overall_breakdown(records, schema, Horizon::Far),
    }
}

/// Mean progress percentage for a horizon, skipping blank and non-numeric
/// cells. `None` when there is nothing to average.
pub fn mean_progress(
    records: &[Record],
    schema: &CanonicalSchema,
    horizon: Horizon,
    encoding: ProgressEncoding,
) -> Option<f64> {
    if !schema.is_complete() || !schema.is_present(horizon.progress_key()) {
        return None;
    }
    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| progress_percentage(r.progress(horizon), encoding))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(average(&values))
    }
}

/// Counts and breakdowns for one selected group.
pub fn group_overview(
    records: &[Record],
    schema: &CanonicalSchema,
    group_value: &str,
) -> GroupOverview {
    if !schema.is_complete() {
        return GroupOverview {
            group: group_value.to_string(),
            ..GroupOverview::default()
        };
    }
    let in_group: Vec<&Record> = records
        .iter()
        .filter(|r| r.group.as_deref() == Some(group_value))
        .collect();
    GroupOverview {
        group: group_value.to_string(),
        subgroup_count: distinct_in_order(in_group.iter().map(|r| r.subgroup.as_deref())).len(),
        item_count: distinct_in_order(in_group.iter().map(|r| r.item_name.as_deref())).len(),
        near: compute_breakdown(records, schema, group_value, Horizon::Near),
        far: compute_breakdown(records, schema, group_value, Horizon::Far),
    }
}

pub fn group_options(records: &[Record], schema: &CanonicalSchema) -> Vec<String> {
    if !schema.is_complete() {
        return Vec::new();
    }
    distinct_in_order(records.iter().map(|r| r.group.as_deref()))
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Subgroups under a group, for the second selection level. Empty for
/// sectors without a subgroup level.
pub fn subgroup_options(records: &[Record], schema: &CanonicalSchema, group: &str) -> Vec<String> {
    if !schema.is_complete() || !schema.is_present(CanonicalKey::Subgroup) {
        return Vec::new();
    }
    distinct_in_order(
        records
            .iter()
            .filter(|r| r.group.as_deref() == Some(group))
            .map(|r| r.subgroup.as_deref()),
    )
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Items under a group, narrowed to a subgroup when one is given.
pub fn item_options(
    records: &[Record],
    schema: &CanonicalSchema,
    group: Option<&str>,
    subgroup: Option<&str>,
) -> Vec<String> {
    if !schema.is_complete() {
        return Vec::new();
    }
    distinct_in_order(
        records
            .iter()
            .filter(|r| group.map_or(true, |g| r.group.as_deref() == Some(g)))
            .filter(|r| subgroup.map_or(true, |s| r.subgroup.as_deref() == Some(s)))
            .map(|r| r.item_name.as_deref()),
    )
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Rows of the status table: one per category, in legend order.
pub fn status_table(near: &StatusBreakdown, far: &StatusBreakdown) -> Vec<StatusTableRow> {
    StatusCategory::ALL
        .into_iter()
        .map(|cat| StatusTableRow {
            status: cat.as_str().to_string(),
            near: near.get(cat),
            far: far.get(cat),
        })
        .collect()
}

/// One row per group with its counts and near-horizon breakdown.
pub fn group_count_rows(records: &[Record], schema: &CanonicalSchema) -> Vec<GroupCountRow> {
    group_options(records, schema)
        .iter()
        .map(|g| {
            let overview = group_overview(records, schema, g);
            GroupCountRow {
                group: overview.group,
                subgroups: overview.subgroup_count,
                items: overview.item_count,
                completed: overview.near.completed,
                good: overview.near.good,
                satisfactory: overview.near.satisfactory,
                low: overview.near.low,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{national_vocabulary, sector_vocabulary};
    use crate::schema::resolve_schema;
    use pretty_assertions::assert_eq;

    fn rec(group: &str, subgroup: Option<&str>, item: &str, near: &str, far: &str) -> Record {
        Record {
            group: Some(group.to_string()),
            subgroup: subgroup.map(str::to_string),
            item_name: Some(item.to_string()),
            status_near: Some(near.to_string()),
            status_far: Some(far.to_string()),
            ..Record::default()
        }
    }

    fn full_schema() -> CanonicalSchema {
        resolve_schema(
            &[
                "Pillar",
                "NST2 Outcome",
                "Indicators",
                "Status based on 2024/25 Target",
                "Status based on 2026/27 Target",
                "% Progress based on 2024/25 Target",
            ],
            &national_vocabulary(),
        )
    }

    fn pillars() -> Vec<Record> {
        vec![
            rec("Pillar A", Some("O1"), "I1", "GOOD", "LOW"),
            rec("Pillar A", Some("O2"), "I2", "COMPLETED", "LOW"),
            rec("Pillar B", Some("O3"), "I3", "LOW", "GOOD"),
            rec("Pillar B", Some("O3"), "I4", "LOW", "GOOD"),
            rec("Pillar B", Some("O4"), "I5", "SATISFACTORY", "COMPLETED"),
        ]
    }

    fn bd(completed: usize, good: usize, satisfactory: usize, low: usize) -> StatusBreakdown {
        StatusBreakdown { completed, good, satisfactory, low }
    }

    #[test]
    fn breakdown_per_group_scenario() {
        let records = pillars();
        let schema = full_schema();
        assert_eq!(
            compute_breakdown(&records, &schema, "Pillar A", Horizon::Near),
            bd(1, 1, 0, 0)
        );
        assert_eq!(
            compute_breakdown(&records, &schema, "Pillar B", Horizon::Near),
            bd(0, 0, 1, 2)
        );
        assert_eq!(
            compute_breakdown(&records, &schema, "Pillar B", Horizon::Far),
            bd(1, 2, 0, 0)
        );
    }

    #[test]
    fn breakdown_covers_all_categories_for_unknown_group_and_odd_values() {
        let mut records = pillars();
        records.push(rec("Pillar A", Some("O1"), "I6", "ON TRACK", "N/A"));
        let schema = full_schema();
        let none = compute_breakdown(&records, &schema, "Pillar Z", Horizon::Near);
        assert_eq!(none, bd(0, 0, 0, 0));
        assert_eq!(none.iter().count(), 4);
        let a = compute_breakdown(&records, &schema, "Pillar A", Horizon::Near);
        assert_eq!(a, bd(1, 1, 0, 0));
        assert_eq!(a.iter().count(), 4);
    }

    #[test]
    fn summary_counts_distinct_values() {
        let records = pillars();
        let schema = full_schema();
        let summary = compute_summary(&records, &schema);
        assert_eq!(summary.record_count, 5);
        assert_eq!(summary.group_count, 2);
        assert_eq!(summary.subgroup_count, 4);
        assert_eq!(summary.item_count, 5);
        let groups: Vec<&str> = summary.breakdowns.iter().map(|b| b.group.as_str()).collect();
        assert_eq!(groups, vec!["Pillar A", "Pillar B"]);
        assert_eq!(summary.breakdowns[1].for_horizon(Horizon::Near), &bd(0, 0, 1, 2));
        assert_eq!(summary.overall_near, bd(1, 1, 1, 2));
        assert_eq!(summary.overall_far, bd(1, 2, 0, 2));
    }

    #[test]
    fn incomplete_schema_gates_aggregation() {
        let records = pillars();
        let schema = resolve_schema(&["NST2 Outcome", "Indicators"], &national_vocabulary());
        assert!(!schema.is_complete());
        assert_eq!(compute_summary(&records, &schema), AggregateSummary::default());
        assert_eq!(
            compute_breakdown(&records, &schema, "Pillar A", Horizon::Near),
            bd(0, 0, 0, 0)
        );
        assert!(group_options(&records, &schema).is_empty());
        assert_eq!(mean_progress(&records, &schema, Horizon::Near, ProgressEncoding::Fraction), None);
    }

    #[test]
    fn empty_dataset_gives_zero_summary() {
        let summary = compute_summary(&[], &full_schema());
        assert_eq!(summary.group_count, 0);
        assert_eq!(summary.subgroup_count, 0);
        assert_eq!(summary.item_count, 0);
        assert!(summary.breakdowns.is_empty());
    }

    #[test]
    fn missing_status_column_counts_zero() {
        let schema = resolve_schema(&["Outcome", "Indicators"], &sector_vocabulary());
        let records = vec![rec("A", None, "I1", "GOOD", "GOOD")];
        assert_eq!(compute_breakdown(&records, &schema, "A", Horizon::Near), bd(0, 0, 0, 0));
    }

    #[test]
    fn mean_progress_skips_blank_cells() {
        let schema = full_schema();
        let mut records = pillars();
        records[0].progress_near = Some("0.5".into());
        records[1].progress_near = Some("1".into());
        records[2].progress_near = Some("n/a".into());
        let mean = mean_progress(&records, &schema, Horizon::Near, ProgressEncoding::Fraction).unwrap();
        assert!((mean - 75.0).abs() < 1e-9);
        // No far progress column in this schema.
        assert_eq!(mean_progress(&records, &schema, Horizon::Far, ProgressEncoding::Fraction), None);
    }

    #[test]
    fn options_follow_first_occurrence() {
        let records = pillars();
        let schema = full_schema();
        assert_eq!(group_options(&records, &schema), vec!["Pillar A", "Pillar B"]);
        assert_eq!(subgroup_options(&records, &schema, "Pillar B"), vec!["O3", "O4"]);
        assert_eq!(
            item_options(&records, &schema, Some("Pillar B"), Some("O3")),
            vec!["I3", "I4"]
        );
        assert_eq!(item_options(&records, &schema, None, None).len(), 5);
    }

    #[test]
    fn group_overview_and_rows() {
        let records = pillars();
        let schema = full_schema();
        let b = group_overview(&records, &schema, "Pillar B");
        assert_eq!(b.subgroup_count, 2);
        assert_eq!(b.item_count, 3);
        assert_eq!(b.near, bd(0, 0, 1, 2));

        let rows = group_count_rows(&records, &schema);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].group, "Pillar A");
        assert_eq!(rows[0].good, 1);
    }

    #[test]
    fn status_table_rows_in_legend_order() {
        let rows = status_table(&bd(1, 2, 3, 4), &bd(5, 6, 7, 8));
        let labels: Vec<&str> = rows.iter().map(|r| r.status.as_str()).collect();
        assert_eq!(labels, vec!["COMPLETED", "GOOD", "SATISFACTORY", "LOW"]);
        assert_eq!((rows[3].near, rows[3].far), (4, 8));
    }
}
