use crate::config::SectorConfig;
use crate::error::DashboardError;
use crate::schema::{resolve_schema, CanonicalSchema};
use crate::types::{CanonicalKey, Horizon, LoadedSector, Notice, Record, StatusCategory};
use crate::util::{clean_cell, format_int, parse_f64_safe};
use crate::values::{normalize_status, ProgressEncoding, SUSPICIOUS_FRACTION};
use csv::ReaderBuilder;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{self, Read};
use std::path::Path;
use tracing::{info, warn};

/// Headers and cells exactly as the file has them.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub malformed_rows: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    /// Rows without a group value.
    pub dropped_rows: usize,
    pub malformed_rows: usize,
    /// Normalized status values outside the four known categories.
    pub unrecognized_statuses: BTreeMap<String, usize>,
    /// Fraction-encoded progress cells above [`SUSPICIOUS_FRACTION`].
    pub suspicious_progress: usize,
}

impl LoadReport {
    pub fn unrecognized_total(&self) -> usize {
        self.unrecognized_statuses.values().sum()
    }
}

pub fn read_table_from_reader<R: Read>(reader: R) -> Result<RawTable, DashboardError> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    let mut malformed_rows = 0usize;
    for result in rdr.records() {
        match result {
            Ok(record) => rows.push(record.iter().map(str::to_string).collect()),
            Err(_) => malformed_rows += 1,
        }
    }
    Ok(RawTable { headers, rows, malformed_rows })
}

pub fn read_table(path: &Path) -> Result<RawTable, DashboardError> {
    let file = std::fs::File::open(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            DashboardError::SourceUnavailable { path: path.to_path_buf(), source }
        }
        _ => DashboardError::Io(source),
    })?;
    read_table_from_reader(io::BufReader::new(file))
}

/// Project raw rows through the schema and normalize their values.
///
/// - group, subgroup and item are trimmed; rows without a group are dropped,
/// - statuses are trimmed and uppercased,
/// - a unit of `Percent` becomes `%`,
/// - every other cell is kept as text, blank cells become `None`.
pub fn clean_records(
    table: &RawTable,
    schema: &CanonicalSchema,
    encoding: ProgressEncoding,
) -> (Vec<Record>, LoadReport) {
    let mut report = LoadReport {
        total_rows: table.rows.len() + table.malformed_rows,
        malformed_rows: table.malformed_rows,
        ..LoadReport::default()
    };
    let mut records = Vec::with_capacity(table.rows.len());

    for row in &table.rows {
        let mut record = Record::default();
        for key in CanonicalKey::ALL {
            let Some(index) = schema.index(key) else {
                continue;
            };
            let cell = clean_cell(row.get(index).map(String::as_str));
            let value = match key {
                CanonicalKey::StatusNear | CanonicalKey::StatusFar => normalize_status(cell),
                CanonicalKey::Unit => cell.map(|u| u.replace("Percent", "%")),
                _ => cell.map(str::to_string),
            };
            record.set(key, value);
        }
        if record.group.is_none() {
            report.dropped_rows += 1;
            continue;
        }

        for horizon in Horizon::ALL {
            if let Some(status) = record.status(horizon) {
                if StatusCategory::from_normalized(status).is_none() {
                    *report
                        .unrecognized_statuses
                        .entry(status.to_string())
                        .or_insert(0) += 1;
                }
            }
            if encoding == ProgressEncoding::Fraction {
                if let Some(v) = parse_f64_safe(record.progress(horizon)) {
                    if v > SUSPICIOUS_FRACTION {
                        report.suspicious_progress += 1;
                    }
                }
            }
        }
        records.push(record);
    }

    report.kept_rows = records.len();
    (records, report)
}

/// Build a [`LoadedSector`] from an already-read table.
pub fn load_table(config: &SectorConfig, table: &RawTable) -> LoadedSector {
    let schema = resolve_schema(&table.headers, &config.vocabulary);
    let mut notices = Vec::new();

    if let Err(incomplete) = schema.completeness() {
        warn!(sector = %config.slug, missing = ?incomplete.missing, "schema incomplete");
        notices.push(Notice::error(incomplete.to_string()));
        let report = LoadReport {
            total_rows: table.rows.len() + table.malformed_rows,
            malformed_rows: table.malformed_rows,
            ..LoadReport::default()
        };
        return LoadedSector {
            slug: config.slug.clone(),
            name: config.name.clone(),
            encoding: config.progress_encoding,
            schema,
            records: Vec::new(),
            report,
            notices,
        };
    }

    let (records, report) = clean_records(table, &schema, config.progress_encoding);

    if !schema.has_status(Horizon::Near) || !schema.has_status(Horizon::Far) {
        warn!(sector = %config.slug, "status column missing");
        notices.push(Notice::warning(
            "One or both status columns are missing. Status breakdown and table will not be displayed.",
        ));
    }
    if !report.unrecognized_statuses.is_empty() {
        let values: Vec<String> = report
            .unrecognized_statuses
            .iter()
            .map(|(v, n)| format!("{} ({})", v, n))
            .collect();
        warn!(
            sector = %config.slug,
            count = report.unrecognized_total(),
            values = %values.join(", "),
            "status values outside COMPLETED/GOOD/SATISFACTORY/LOW are not counted"
        );
        notices.push(Notice::warning(format!(
            "{} status value(s) not counted in breakdowns: {}",
            format_int(report.unrecognized_total()),
            values.join(", ")
        )));
    }
    if report.suspicious_progress > 0 {
        warn!(
            sector = %config.slug,
            count = report.suspicious_progress,
            "progress cells above 1.5 in a fraction-encoded file"
        );
        notices.push(Notice::warning(format!(
            "{} progress value(s) look like percentages but are read as fractions; check the file's progress encoding.",
            format_int(report.suspicious_progress)
        )));
    }
    if report.malformed_rows > 0 {
        notices.push(Notice::info(format!(
            "{} row(s) skipped due to parse errors.",
            format_int(report.malformed_rows)
        )));
    }

    info!(
        sector = %config.slug,
        total = report.total_rows,
        kept = report.kept_rows,
        dropped = report.dropped_rows,
        "sector loaded"
    );

    LoadedSector {
        slug: config.slug.clone(),
        name: config.name.clone(),
        encoding: config.progress_encoding,
        schema,
        records,
        report,
        notices,
    }
}

/// Load one sector. Never fails: an unreadable file yields an empty sector
/// carrying a notice.
pub fn load_sector(config: &SectorConfig, data_dir: Option<&Path>) -> LoadedSector {
    let path = config.source_path(data_dir);
    match read_table(&path) {
        Ok(table) => load_table(config, &table),
        Err(err) => {
            warn!(sector = %config.slug, path = %path.display(), error = %err, "source unavailable");
            let message = match &err {
                DashboardError::SourceUnavailable { .. } => format!(
                    "Data file not found. Please ensure '{}' exists.",
                    path.display()
                ),
                other => format!(
                    "An error occurred while loading or processing data: {}",
                    other
                ),
            };
            LoadedSector {
                slug: config.slug.clone(),
                name: config.name.clone(),
                encoding: config.progress_encoding,
                schema: CanonicalSchema::default(),
                records: Vec::new(),
                report: LoadReport::default(),
                notices: vec![Notice::error(message)],
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SectorRegistry;
    use crate::types::NoticeLevel;

    fn energy() -> SectorConfig {
        SectorRegistry::builtin().get("energy").unwrap().clone()
    }

    fn table(csv_text: &str) -> RawTable {
        read_table_from_reader(csv_text.as_bytes()).unwrap()
    }

    const ENERGY_CSV: &str = "\
Outcome,Indicators,Units,Baseline,2024/25 Target,2026/27 Target,Current progress,Percentage Progress based on 2024/25 Target,Percentage Progress based on 2026/27 Target,Status based on 2024/25 Target,Status based on NST2 Midterm target
 Access ,Households connected,Percent,72,85,100,80,0.94,0.8, good ,satisfactory
,Orphan row,%,1,2,3,4,0.1,0.1,LOW,LOW
Access,Off-grid share,Percent,NaN,,50,,,,on track,Low
Generation,Installed MW,MW,330,400,556,350,0.875,0.63,Completed,GOOD
";

    #[test]
    fn cleans_rows_and_normalizes_values() {
        let sector = load_table(&energy(), &table(ENERGY_CSV));
        assert!(sector.schema.is_complete());
        assert_eq!(sector.records.len(), 3);
        assert_eq!(sector.report.total_rows, 4);
        assert_eq!(sector.report.dropped_rows, 1);

        let first = &sector.records[0];
        assert_eq!(first.group.as_deref(), Some("Access"));
        assert_eq!(first.unit.as_deref(), Some("%"));
        assert_eq!(first.status_near.as_deref(), Some("GOOD"));
        assert_eq!(first.status_far.as_deref(), Some("SATISFACTORY"));

        let second = &sector.records[1];
        assert_eq!(second.baseline, None);
        assert_eq!(second.target_near, None);
        assert_eq!(second.progress_near, None);
    }

    #[test]
    fn unrecognized_statuses_are_counted_and_surfaced() {
        let sector = load_table(&energy(), &table(ENERGY_CSV));
        assert_eq!(sector.report.unrecognized_statuses.get("ON TRACK"), Some(&1));
        assert!(sector
            .notices
            .iter()
            .any(|n| n.level == NoticeLevel::Warning && n.message.contains("ON TRACK (1)")));
    }

    #[test]
    fn missing_status_columns_produce_a_warning() {
        let sector = load_table(&energy(), &table("Outcome,Indicators\nA,One\n"));
        assert!(sector.schema.is_complete());
        assert_eq!(sector.records.len(), 1);
        assert_eq!(sector.notices.len(), 1);
        assert_eq!(sector.notices[0].level, NoticeLevel::Warning);
    }

    #[test]
    fn incomplete_schema_yields_no_records() {
        let sector = load_table(&energy(), &table("Indicators,Units\nOne,%\n"));
        assert!(sector.records.is_empty());
        assert_eq!(sector.report.total_rows, 1);
        let incomplete = sector.schema_incomplete().unwrap();
        assert_eq!(incomplete.missing, vec!["Outcome".to_string()]);
        assert_eq!(sector.notices[0].level, NoticeLevel::Error);
    }

    #[test]
    fn percentage_looking_fractions_are_flagged() {
        let csv_text = "\
Outcome,Indicators,Percentage Progress based on 2024/25 Target,Status based on 2024/25 Target,Status based on MidTerm Target
A,One,85,GOOD,GOOD
A,Two,0.5,LOW,LOW
";
        let sector = load_table(&energy(), &table(csv_text));
        assert_eq!(sector.report.suspicious_progress, 1);

        let mut pct = energy();
        pct.progress_encoding = ProgressEncoding::Percentage;
        let sector = load_table(&pct, &table(csv_text));
        assert_eq!(sector.report.suspicious_progress, 0);
    }

    #[test]
    fn short_rows_leave_trailing_fields_empty() {
        let sector = load_table(&energy(), &table("Outcome,Indicators,Units\nA,One\n"));
        assert_eq!(sector.records.len(), 1);
        assert_eq!(sector.records[0].unit, None);
    }

    #[test]
    fn missing_file_degrades_to_empty_sector() {
        let dir = tempfile::TempDir::new().unwrap();
        let sector = load_sector(&energy(), Some(dir.path()));
        assert!(sector.records.is_empty());
        assert_eq!(sector.notices.len(), 1);
        assert_eq!(sector.notices[0].level, NoticeLevel::Error);
        assert!(sector.notices[0].message.contains("energy.csv"));
    }
}
