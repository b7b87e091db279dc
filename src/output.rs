use crate::detail::DetailView;
use crate::error::DashboardError;
use crate::loader::LoadReport;
use crate::reports::{group_count_rows, status_table};
use crate::types::{AggregateSummary, Horizon, LoadedSector, Notice, NoticeLevel};
use crate::util::{format_int, format_number};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), DashboardError> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DashboardError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Markdown table, or `(no rows)` when empty.
pub fn render_table<T>(rows: &[T]) -> String
where
    T: Tabled + Clone,
{
    if rows.is_empty() {
        return "(no rows)".to_string();
    }
    Table::new(rows.to_vec()).with(Style::markdown()).to_string()
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    println!("{}\n", render_table(&slice));
}

pub fn print_notices(sector: &LoadedSector) {
    for notice in &sector.notices {
        match notice.level {
            NoticeLevel::Error | NoticeLevel::Warning => eprintln!("{}", notice),
            NoticeLevel::Info => println!("{}", notice),
        }
    }
    if !sector.notices.is_empty() {
        println!();
    }
}

fn mean_text(v: Option<f64>) -> String {
    match v {
        Some(pct) => format!("{}%", format_number(pct, 1)),
        None => "N/A".to_string(),
    }
}

pub fn print_summary(sector: &LoadedSector, summary: &AggregateSummary) {
    println!("{} Progress Summary\n", sector.name);
    print_notices(sector);
    if !sector.schema.is_complete() {
        return;
    }

    let outer = if sector.schema.has_subgroup_level() { "Groups" } else { "Outcomes" };
    println!("Total {}: {}", outer, format_int(summary.group_count));
    if sector.schema.has_subgroup_level() {
        println!("Total Subgroups: {}", format_int(summary.subgroup_count));
    }
    println!("Total Items: {}", format_int(summary.item_count));
    println!("Total Rows: {}", format_int(summary.record_count));
    println!(
        "Average {} progress: {}",
        Horizon::Near.label(),
        mean_text(sector.mean_progress(Horizon::Near))
    );
    println!(
        "Average {} progress: {}\n",
        Horizon::Far.label(),
        mean_text(sector.mean_progress(Horizon::Far))
    );

    println!("Overall Status Breakdown");
    println!("{}\n", render_table(&status_table(&summary.overall_near, &summary.overall_far)));

    println!("Per-Group Counts ({} status)", Horizon::Near.label());
    println!("{}\n", render_table(&group_count_rows(&sector.records, &sector.schema)));

    for b in &summary.breakdowns {
        println!("{}", b.group);
        preview_table_rows(&status_table(&b.near, &b.far), 4);
    }
}

pub fn print_detail(detail: Option<&DetailView>) {
    match detail {
        Some(view) => {
            println!("Details for Indicator: {}\n", view.item);
            println!("{}\n", render_table(&view.field_rows()));
        }
        None => println!("No data for selected combination.\n"),
    }
}

#[derive(Debug, Serialize)]
struct SummaryExport<'a> {
    sector: &'a str,
    name: &'a str,
    generated_at: String,
    notices: &'a [Notice],
    missing_columns: Vec<String>,
    mean_progress_near: Option<f64>,
    mean_progress_far: Option<f64>,
    load_report: &'a LoadReport,
    summary: &'a AggregateSummary,
}

/// Write `<slug>_status_table.csv` and `<slug>_summary.json` into `out_dir`.
pub fn export_sector(sector: &LoadedSector, out_dir: &Path) -> Result<Vec<PathBuf>, DashboardError> {
    std::fs::create_dir_all(out_dir)?;
    let summary = sector.summary();

    let table_path = out_dir.join(format!("{}_status_table.csv", sector.slug));
    write_csv(
        &table_path,
        &status_table(&summary.overall_near, &summary.overall_far),
    )?;

    let json_path = out_dir.join(format!("{}_summary.json", sector.slug));
    let export = SummaryExport {
        sector: &sector.slug,
        name: &sector.name,
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        notices: &sector.notices,
        missing_columns: sector
            .schema_incomplete()
            .map(|e| e.missing)
            .unwrap_or_default(),
        mean_progress_near: sector.mean_progress(Horizon::Near),
        mean_progress_far: sector.mean_progress(Horizon::Far),
        load_report: &sector.report,
        summary: &summary,
    };
    write_json(&json_path, &export)?;

    Ok(vec![table_path, json_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SectorRegistry;
    use crate::loader::{load_table, read_table_from_reader};

    #[test]
    fn render_table_handles_empty_rows() {
        let rows: Vec<crate::types::StatusTableRow> = Vec::new();
        assert_eq!(render_table(&rows), "(no rows)");
    }

    #[test]
    fn export_writes_csv_and_json() {
        let config = SectorRegistry::builtin().get("transport").unwrap().clone();
        let table = read_table_from_reader(
            "Outcome,Indicators,Status based on 2024/25 Target,Status based on NST2 Midterm target\n\
             Roads,Paved km,LOW,GOOD\n"
                .as_bytes(),
        )
        .unwrap();
        let sector = load_table(&config, &table);
        let dir = tempfile::TempDir::new().unwrap();
        let written = export_sector(&sector, dir.path()).unwrap();
        assert_eq!(written.len(), 2);

        let csv_text = std::fs::read_to_string(&written[0]).unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(
            lines.next(),
            Some("Status,2024/25 Indicator status,2026/27 Indicator status")
        );
        assert_eq!(lines.next(), Some("COMPLETED,0,0"));
        assert_eq!(lines.next(), Some("GOOD,0,1"));

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written[1]).unwrap()).unwrap();
        assert_eq!(json["sector"], "transport");
        assert_eq!(json["summary"]["group_count"], 1);
        assert_eq!(json["summary"]["overall_near"]["LOW"], 1);
        assert!(json["missing_columns"].as_array().unwrap().is_empty());
    }
}
