use crate::error::SchemaIncomplete;
use crate::loader::LoadReport;
use crate::schema::CanonicalSchema;
use crate::values::ProgressEncoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// The fixed set of fields a sector file is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalKey {
    Group,
    Subgroup,
    ItemName,
    Unit,
    Baseline,
    TargetNear,
    TargetFar,
    CurrentProgress,
    ProgressNear,
    ProgressFar,
    StatusNear,
    StatusFar,
    Drivers,
    Challenges,
    CatchUp,
}

impl CanonicalKey {
    pub const ALL: [CanonicalKey; 15] = [
        CanonicalKey::Group,
        CanonicalKey::Subgroup,
        CanonicalKey::ItemName,
        CanonicalKey::Unit,
        CanonicalKey::Baseline,
        CanonicalKey::TargetNear,
        CanonicalKey::TargetFar,
        CanonicalKey::CurrentProgress,
        CanonicalKey::ProgressNear,
        CanonicalKey::ProgressFar,
        CanonicalKey::StatusNear,
        CanonicalKey::StatusFar,
        CanonicalKey::Drivers,
        CanonicalKey::Challenges,
        CanonicalKey::CatchUp,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalKey::Group => "group",
            CanonicalKey::Subgroup => "subgroup",
            CanonicalKey::ItemName => "item_name",
            CanonicalKey::Unit => "unit",
            CanonicalKey::Baseline => "baseline",
            CanonicalKey::TargetNear => "target_near",
            CanonicalKey::TargetFar => "target_far",
            CanonicalKey::CurrentProgress => "current_progress",
            CanonicalKey::ProgressNear => "progress_near",
            CanonicalKey::ProgressFar => "progress_far",
            CanonicalKey::StatusNear => "status_near",
            CanonicalKey::StatusFar => "status_far",
            CanonicalKey::Drivers => "drivers",
            CanonicalKey::Challenges => "challenges",
            CanonicalKey::CatchUp => "catch_up",
        }
    }

    pub fn from_name(name: &str) -> Option<CanonicalKey> {
        CanonicalKey::ALL
            .into_iter()
            .find(|k| k.as_str() == name.trim())
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target window progress is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    /// Next fiscal year target (2024/25).
    Near,
    /// Mid-term target (2026/27).
    Far,
}

impl Horizon {
    pub const ALL: [Horizon; 2] = [Horizon::Near, Horizon::Far];

    pub fn label(self) -> &'static str {
        match self {
            Horizon::Near => "2024/25",
            Horizon::Far => "2026/27",
        }
    }

    pub fn status_key(self) -> CanonicalKey {
        match self {
            Horizon::Near => CanonicalKey::StatusNear,
            Horizon::Far => CanonicalKey::StatusFar,
        }
    }

    pub fn progress_key(self) -> CanonicalKey {
        match self {
            Horizon::Near => CanonicalKey::ProgressNear,
            Horizon::Far => CanonicalKey::ProgressFar,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusCategory {
    Completed,
    Good,
    Satisfactory,
    Low,
}

impl StatusCategory {
    /// Legend and table order.
    pub const ALL: [StatusCategory; 4] = [
        StatusCategory::Completed,
        StatusCategory::Good,
        StatusCategory::Satisfactory,
        StatusCategory::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatusCategory::Completed => "COMPLETED",
            StatusCategory::Good => "GOOD",
            StatusCategory::Satisfactory => "SATISFACTORY",
            StatusCategory::Low => "LOW",
        }
    }

    /// Exact match against an already normalized (trimmed, uppercased) value.
    pub fn from_normalized(s: &str) -> Option<StatusCategory> {
        StatusCategory::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of sector data projected through a [`CanonicalSchema`].
///
/// Every field is `None` when the column is absent from the file or the cell
/// is blank. Status fields hold normalized values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub group: Option<String>,
    pub subgroup: Option<String>,
    pub item_name: Option<String>,
    pub unit: Option<String>,
    pub baseline: Option<String>,
    pub target_near: Option<String>,
    pub target_far: Option<String>,
    pub current_progress: Option<String>,
    pub progress_near: Option<String>,
    pub progress_far: Option<String>,
    pub status_near: Option<String>,
    pub status_far: Option<String>,
    pub drivers: Option<String>,
    pub challenges: Option<String>,
    pub catch_up: Option<String>,
}

impl Record {
    pub fn get(&self, key: CanonicalKey) -> Option<&str> {
        let v = match key {
            CanonicalKey::Group => &self.group,
            CanonicalKey::Subgroup => &self.subgroup,
            CanonicalKey::ItemName => &self.item_name,
            CanonicalKey::Unit => &self.unit,
            CanonicalKey::Baseline => &self.baseline,
            CanonicalKey::TargetNear => &self.target_near,
            CanonicalKey::TargetFar => &self.target_far,
            CanonicalKey::CurrentProgress => &self.current_progress,
            CanonicalKey::ProgressNear => &self.progress_near,
            CanonicalKey::ProgressFar => &self.progress_far,
            CanonicalKey::StatusNear => &self.status_near,
            CanonicalKey::StatusFar => &self.status_far,
            CanonicalKey::Drivers => &self.drivers,
            CanonicalKey::Challenges => &self.challenges,
            CanonicalKey::CatchUp => &self.catch_up,
        };
        v.as_deref()
    }

    pub fn set(&mut self, key: CanonicalKey, value: Option<String>) {
        let slot = match key {
            CanonicalKey::Group => &mut self.group,
            CanonicalKey::Subgroup => &mut self.subgroup,
            CanonicalKey::ItemName => &mut self.item_name,
            CanonicalKey::Unit => &mut self.unit,
            CanonicalKey::Baseline => &mut self.baseline,
            CanonicalKey::TargetNear => &mut self.target_near,
            CanonicalKey::TargetFar => &mut self.target_far,
            CanonicalKey::CurrentProgress => &mut self.current_progress,
            CanonicalKey::ProgressNear => &mut self.progress_near,
            CanonicalKey::ProgressFar => &mut self.progress_far,
            CanonicalKey::StatusNear => &mut self.status_near,
            CanonicalKey::StatusFar => &mut self.status_far,
            CanonicalKey::Drivers => &mut self.drivers,
            CanonicalKey::Challenges => &mut self.challenges,
            CanonicalKey::CatchUp => &mut self.catch_up,
        };
        *slot = value;
    }

    pub fn status(&self, horizon: Horizon) -> Option<&str> {
        self.get(horizon.status_key())
    }

    pub fn progress(&self, horizon: Horizon) -> Option<&str> {
        self.get(horizon.progress_key())
    }
}

/// Status counts for one group and one horizon.
///
/// All four categories are always present; a category nobody reported is 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusBreakdown {
    #[serde(rename = "COMPLETED")]
    pub completed: usize,
    #[serde(rename = "GOOD")]
    pub good: usize,
    #[serde(rename = "SATISFACTORY")]
    pub satisfactory: usize,
    #[serde(rename = "LOW")]
    pub low: usize,
}

impl StatusBreakdown {
    pub fn get(&self, category: StatusCategory) -> usize {
        match category {
            StatusCategory::Completed => self.completed,
            StatusCategory::Good => self.good,
            StatusCategory::Satisfactory => self.satisfactory,
            StatusCategory::Low => self.low,
        }
    }

    pub fn increment(&mut self, category: StatusCategory) {
        match category {
            StatusCategory::Completed => self.completed += 1,
            StatusCategory::Good => self.good += 1,
            StatusCategory::Satisfactory => self.satisfactory += 1,
            StatusCategory::Low => self.low += 1,
        }
    }

    /// Categories in legend order, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (StatusCategory, usize)> + '_ {
        StatusCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    pub fn total(&self) -> usize {
        self.completed + self.good + self.satisfactory + self.low
    }

    /// Pie chart series: categories with a non-zero count, in legend order.
    pub fn pie_slices(&self) -> Vec<(StatusCategory, usize)> {
        self.iter().filter(|(_, n)| *n > 0).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupBreakdown {
    pub group: String,
    pub near: StatusBreakdown,
    pub far: StatusBreakdown,
}

impl GroupBreakdown {
    pub fn for_horizon(&self, horizon: Horizon) -> &StatusBreakdown {
        match horizon {
            Horizon::Near => &self.near,
            Horizon::Far => &self.far,
        }
    }
}

/// Metric-card numbers and per-group breakdowns for one sector.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub record_count: usize,
    pub group_count: usize,
    pub subgroup_count: usize,
    pub item_count: usize,
    /// One entry per distinct group, in first-occurrence order.
    pub breakdowns: Vec<GroupBreakdown>,
    pub overall_near: StatusBreakdown,
    pub overall_far: StatusBreakdown,
}

/// Numbers shown when a single group is selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupOverview {
    pub group: String,
    pub subgroup_count: usize,
    pub item_count: usize,
    pub near: StatusBreakdown,
    pub far: StatusBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Error,
    Warning,
    Info,
}

/// A user-visible, non-fatal message produced while loading a sector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Notice { level: NoticeLevel::Error, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notice { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notice { level: NoticeLevel::Info, message: message.into() }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            NoticeLevel::Error => "Error",
            NoticeLevel::Warning => "Warning",
            NoticeLevel::Info => "Info",
        };
        write!(f, "{}: {}", tag, self.message)
    }
}

/// Everything derived from one sector file. Immutable once built; a reload
/// produces a fresh value.
#[derive(Debug, Clone)]
pub struct LoadedSector {
    pub slug: String,
    pub name: String,
    pub encoding: ProgressEncoding,
    pub schema: CanonicalSchema,
    pub records: Vec<Record>,
    pub report: LoadReport,
    pub notices: Vec<Notice>,
}

impl LoadedSector {
    pub fn schema_incomplete(&self) -> Option<SchemaIncomplete> {
        self.schema.completeness().err()
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct StatusTableRow {
    #[serde(rename = "Status")]
    #[tabled(rename = "Status")]
    pub status: String,
    #[serde(rename = "2024/25 Indicator status")]
    #[tabled(rename = "2024/25 Indicator status")]
    pub near: usize,
    #[serde(rename = "2026/27 Indicator status")]
    #[tabled(rename = "2026/27 Indicator status")]
    pub far: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupCountRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Subgroups")]
    #[tabled(rename = "Subgroups")]
    pub subgroups: usize,
    #[serde(rename = "Items")]
    #[tabled(rename = "Items")]
    pub items: usize,
    #[serde(rename = "Completed")]
    #[tabled(rename = "Completed")]
    pub completed: usize,
    #[serde(rename = "Good")]
    #[tabled(rename = "Good")]
    pub good: usize,
    #[serde(rename = "Satisfactory")]
    #[tabled(rename = "Satisfactory")]
    pub satisfactory: usize,
    #[serde(rename = "Low")]
    #[tabled(rename = "Low")]
    pub low: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DetailFieldRow {
    #[tabled(rename = "Field")]
    pub field: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SectorRow {
    #[tabled(rename = "Slug")]
    pub slug: String,
    #[tabled(rename = "Sector")]
    pub name: String,
    #[tabled(rename = "Source")]
    pub path: String,
    #[tabled(rename = "Levels")]
    pub levels: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_key_names_round_trip() {
        for key in CanonicalKey::ALL {
            assert_eq!(CanonicalKey::from_name(key.as_str()), Some(key));
        }
        assert_eq!(CanonicalKey::from_name("pillar"), None);
    }

    #[test]
    fn breakdown_iterates_in_legend_order_with_zeros() {
        let mut b = StatusBreakdown::default();
        b.increment(StatusCategory::Low);
        b.increment(StatusCategory::Low);
        b.increment(StatusCategory::Good);
        let order: Vec<_> = b.iter().collect();
        assert_eq!(
            order,
            vec![
                (StatusCategory::Completed, 0),
                (StatusCategory::Good, 1),
                (StatusCategory::Satisfactory, 0),
                (StatusCategory::Low, 2),
            ]
        );
        assert_eq!(b.total(), 3);
        assert_eq!(
            b.pie_slices(),
            vec![(StatusCategory::Good, 1), (StatusCategory::Low, 2)]
        );
    }

    #[test]
    fn breakdown_serializes_all_four_categories() {
        let json = serde_json::to_value(StatusBreakdown::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        for cat in StatusCategory::ALL {
            assert_eq!(obj[cat.as_str()], 0);
        }
    }

    #[test]
    fn status_category_matches_only_normalized_values() {
        assert_eq!(StatusCategory::from_normalized("GOOD"), Some(StatusCategory::Good));
        assert_eq!(StatusCategory::from_normalized("good"), None);
        assert_eq!(StatusCategory::from_normalized("ON TRACK"), None);
    }

    #[test]
    fn record_get_and_set_address_the_same_field() {
        let mut r = Record::default();
        for key in CanonicalKey::ALL {
            r.set(key, Some(key.as_str().to_string()));
        }
        for key in CanonicalKey::ALL {
            assert_eq!(r.get(key), Some(key.as_str()));
        }
        assert_eq!(r.status(Horizon::Far), Some("status_far"));
        assert_eq!(r.progress(Horizon::Near), Some("progress_near"));
    }
}
