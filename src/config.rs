//! Sector registry.
//!
//! Every sector page runs the same pipeline; what differs is the file it
//! reads, the header labels it expects, and how its progress columns are
//! encoded. The built-in registry covers the national overview and the ten
//! sector files; a TOML file can replace it.

use crate::error::DashboardError;
use crate::schema::HeaderVocabulary;
use crate::types::CanonicalKey;
use crate::values::ProgressEncoding;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub struct SectorConfig {
    pub slug: String,
    pub name: String,
    pub path: PathBuf,
    pub vocabulary: HeaderVocabulary,
    pub progress_encoding: ProgressEncoding,
}

impl SectorConfig {
    /// Source file, resolved against `data_dir` when the path is relative.
    pub fn source_path(&self, data_dir: Option<&Path>) -> PathBuf {
        match data_dir {
            Some(dir) if self.path.is_relative() => dir.join(&self.path),
            _ => self.path.clone(),
        }
    }

    pub fn levels(&self) -> usize {
        if self.vocabulary.has_subgroup_level() {
            3
        } else {
            2
        }
    }
}

/// Pillar → NST2 Outcome → Indicators, as used by the national matrix.
pub fn national_vocabulary() -> HeaderVocabulary {
    HeaderVocabulary::new()
        .with(CanonicalKey::Group, &["Pillar"])
        .with(CanonicalKey::Subgroup, &["NST2 Outcome"])
        .with(CanonicalKey::ItemName, &["Indicators"])
        .with(CanonicalKey::Unit, &["Units"])
        .with(CanonicalKey::Baseline, &["Baseline (2023/24)", "Baseline"])
        .with(CanonicalKey::TargetNear, &["2024/25 target"])
        .with(CanonicalKey::TargetFar, &["2026/27 target"])
        .with(
            CanonicalKey::CurrentProgress,
            &["Current progress (2024/25)", "Current progress"],
        )
        .with(
            CanonicalKey::ProgressNear,
            &[
                "% Progress based on 2024/25 Target",
                "Percentage Progress based on 2024/25 Target",
            ],
        )
        .with(
            CanonicalKey::ProgressFar,
            &[
                "% Progress based on 2026/27 Target",
                "Percentage Progress based on 2026/27 Target",
            ],
        )
        .with(CanonicalKey::StatusNear, &["Status based on 2024/25 Target"])
        .with(CanonicalKey::StatusFar, &["Status based on 2026/27 Target"])
        .with(
            CanonicalKey::Drivers,
            &[
                "Major drivers of performance (Maximum 2)",
                "Major drivers of performance",
            ],
        )
        .with(CanonicalKey::Challenges, &["Challenges, if any", "Challenges"])
        .with(CanonicalKey::CatchUp, &["Catch up Plans"])
}

/// Outcome → Indicators, as used by the per-sector files.
pub fn sector_vocabulary() -> HeaderVocabulary {
    HeaderVocabulary::new()
        .with(CanonicalKey::Group, &["Outcome"])
        .with(CanonicalKey::ItemName, &["Indicators", "Indicator"])
        .with(CanonicalKey::Unit, &["Units", "Unit"])
        .with(CanonicalKey::Baseline, &["Baseline"])
        .with(CanonicalKey::TargetNear, &["2024/25 Target"])
        .with(CanonicalKey::TargetFar, &["2026/27 Target"])
        .with(CanonicalKey::CurrentProgress, &["Current progress"])
        .with(
            CanonicalKey::ProgressNear,
            &["Percentage Progress based on 2024/25 Target"],
        )
        .with(
            CanonicalKey::ProgressFar,
            &["Percentage Progress based on 2026/27 Target"],
        )
        .with(
            CanonicalKey::StatusNear,
            &["Status based on 2024/25 Target", "2024/25 Target Status"],
        )
        .with(
            CanonicalKey::StatusFar,
            &[
                "Status based on NST2 Midterm target",
                "Status based on MidTerm Target",
                "Status based on 2026/27 Target",
            ],
        )
        .with(CanonicalKey::Drivers, &["Major drivers of performance"])
        .with(CanonicalKey::Challenges, &["Challenges"])
        .with(CanonicalKey::CatchUp, &["Catch up Plans"])
}

fn builtin(slug: &str, name: &str, file: &str, vocabulary: HeaderVocabulary) -> SectorConfig {
    SectorConfig {
        slug: slug.to_string(),
        name: name.to_string(),
        path: PathBuf::from(file),
        vocabulary,
        progress_encoding: ProgressEncoding::Fraction,
    }
}

static BUILTIN_SECTORS: Lazy<Vec<SectorConfig>> = Lazy::new(|| {
    let mut sectors = vec![builtin(
        "matrix",
        "NST2 Progress Overview",
        "matrix.csv",
        national_vocabulary(),
    )];
    for (slug, name) in [
        ("cenr", "CENR"),
        ("energy", "Energy"),
        ("fsd", "FSD"),
        ("health", "Health"),
        ("ict", "ICT"),
        ("psdye", "PSDYE"),
        ("sport", "Sport and Culture"),
        ("transport", "Transport"),
        ("urbanisation", "Urbanisation"),
        ("watsan", "WATSAN"),
    ] {
        sectors.push(builtin(
            slug,
            name,
            &format!("{}.csv", slug),
            sector_vocabulary(),
        ));
    }
    sectors
});

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(rename = "sector", default)]
    sectors: Vec<SectorEntry>,
}

#[derive(Debug, Deserialize)]
struct SectorEntry {
    slug: String,
    name: String,
    path: PathBuf,
    #[serde(default)]
    progress_encoding: ProgressEncoding,
    /// Start from the Pillar → Outcome → Indicator vocabulary.
    #[serde(default)]
    three_level: bool,
    /// Canonical key name → labels, replacing the defaults for that key.
    #[serde(default)]
    headers: BTreeMap<String, Vec<String>>,
}

impl SectorEntry {
    fn into_config(self) -> Result<SectorConfig, DashboardError> {
        let mut vocabulary = if self.three_level {
            national_vocabulary()
        } else {
            sector_vocabulary()
        };
        for (key_name, labels) in self.headers {
            let key = CanonicalKey::from_name(&key_name).ok_or_else(|| {
                DashboardError::Config(format!(
                    "sector '{}': unknown header key '{}'",
                    self.slug, key_name
                ))
            })?;
            vocabulary.set(key, labels);
        }
        if vocabulary.labels(CanonicalKey::Group).is_empty()
            || vocabulary.labels(CanonicalKey::ItemName).is_empty()
        {
            return Err(DashboardError::Config(format!(
                "sector '{}': group and item_name need at least one header label",
                self.slug
            )));
        }
        Ok(SectorConfig {
            slug: self.slug,
            name: self.name,
            path: self.path,
            vocabulary,
            progress_encoding: self.progress_encoding,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectorRegistry {
    sectors: Vec<SectorConfig>,
}

impl SectorRegistry {
    pub fn builtin() -> Self {
        SectorRegistry {
            sectors: (*BUILTIN_SECTORS).clone(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, DashboardError> {
        let file: RegistryFile = toml::from_str(s)?;
        if file.sectors.is_empty() {
            return Err(DashboardError::Config(
                "registry declares no [[sector]] entries".to_string(),
            ));
        }
        let mut sectors = Vec::with_capacity(file.sectors.len());
        for entry in file.sectors {
            if sectors.iter().any(|s: &SectorConfig| s.slug == entry.slug) {
                return Err(DashboardError::Config(format!(
                    "duplicate sector slug '{}'",
                    entry.slug
                )));
            }
            sectors.push(entry.into_config()?);
        }
        Ok(SectorRegistry { sectors })
    }

    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn get(&self, slug: &str) -> Result<&SectorConfig, DashboardError> {
        self.sectors
            .iter()
            .find(|s| s.slug.eq_ignore_ascii_case(slug))
            .ok_or_else(|| DashboardError::UnknownSector(slug.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectorConfig> {
        self.sectors.iter()
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_overview_and_ten_sectors() {
        let reg = SectorRegistry::builtin();
        assert_eq!(reg.len(), 11);
        assert_eq!(reg.get("matrix").unwrap().levels(), 3);
        assert_eq!(reg.get("Energy").unwrap().levels(), 2);
        assert_eq!(reg.get("ict").unwrap().path, PathBuf::from("ict.csv"));
        assert!(matches!(
            reg.get("mining"),
            Err(DashboardError::UnknownSector(_))
        ));
    }

    #[test]
    fn source_path_joins_relative_paths_only() {
        let reg = SectorRegistry::builtin();
        let health = reg.get("health").unwrap();
        assert_eq!(
            health.source_path(Some(Path::new("/data"))),
            PathBuf::from("/data/health.csv")
        );
        assert_eq!(health.source_path(None), PathBuf::from("health.csv"));
    }

    #[test]
    fn toml_registry_overrides_headers_and_encoding() {
        let reg = SectorRegistry::from_toml_str(
            r#"
            [[sector]]
            slug = "agri"
            name = "Agriculture"
            path = "agri.csv"
            progress_encoding = "percentage"

            [sector.headers]
            group = ["Programme", "Outcome"]
            catch_up = []

            [[sector]]
            slug = "overview"
            name = "Overview"
            path = "/abs/matrix.csv"
            three_level = true
            "#,
        )
        .unwrap();
        let agri = reg.get("agri").unwrap();
        assert_eq!(agri.progress_encoding, ProgressEncoding::Percentage);
        assert_eq!(
            agri.vocabulary.labels(CanonicalKey::Group),
            &["Programme".to_string(), "Outcome".to_string()]
        );
        assert!(agri.vocabulary.labels(CanonicalKey::CatchUp).is_empty());
        let overview = reg.get("overview").unwrap();
        assert_eq!(overview.levels(), 3);
        assert_eq!(
            overview.source_path(Some(Path::new("/data"))),
            PathBuf::from("/abs/matrix.csv")
        );
    }

    #[test]
    fn toml_registry_rejects_bad_input() {
        let unknown_key = SectorRegistry::from_toml_str(
            r#"
            [[sector]]
            slug = "x"
            name = "X"
            path = "x.csv"
            [sector.headers]
            pillar_name = ["Pillar"]
            "#,
        );
        assert!(matches!(unknown_key, Err(DashboardError::Config(_))));

        let no_group = SectorRegistry::from_toml_str(
            r#"
            [[sector]]
            slug = "x"
            name = "X"
            path = "x.csv"
            [sector.headers]
            group = []
            "#,
        );
        assert!(matches!(no_group, Err(DashboardError::Config(_))));

        let duplicate = SectorRegistry::from_toml_str(
            r#"
            [[sector]]
            slug = "x"
            name = "X"
            path = "x.csv"
            [[sector]]
            slug = "x"
            name = "Y"
            path = "y.csv"
            "#,
        );
        assert!(matches!(duplicate, Err(DashboardError::Config(_))));

        assert!(SectorRegistry::from_toml_str("").is_err());
        assert!(SectorRegistry::from_toml_str("[[sector]]\nslug = 1").is_err());
    }
}
