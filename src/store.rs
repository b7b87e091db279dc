use crate::config::SectorConfig;
use crate::detail::{resolve_detail, DetailView, Selection};
use crate::loader::load_sector;
use crate::reports::{compute_summary, mean_progress};
use crate::types::{AggregateSummary, Horizon, LoadedSector};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::info;

impl LoadedSector {
    pub fn summary(&self) -> AggregateSummary {
        compute_summary(&self.records, &self.schema)
    }

    pub fn mean_progress(&self, horizon: Horizon) -> Option<f64> {
        mean_progress(&self.records, &self.schema, horizon, self.encoding)
    }

    pub fn detail(&self, selection: &Selection) -> Option<DetailView> {
        resolve_detail(
            &self.records,
            &self.schema,
            selection.group.as_deref(),
            selection.subgroup.as_deref(),
            selection.item.as_deref(),
        )
        .map(|r| DetailView::from_record(r, self.encoding))
    }
}

/// Holds the current [`LoadedSector`] of one sector.
///
/// Readers take an `Arc` snapshot; [`SectorStore::reload`] builds the next
/// sector completely before swapping it in, so a snapshot never pairs the
/// schema of one load with the records of another.
#[derive(Debug)]
pub struct SectorStore {
    config: SectorConfig,
    data_dir: Option<PathBuf>,
    current: RwLock<Arc<LoadedSector>>,
}

impl SectorStore {
    pub fn open(config: SectorConfig, data_dir: Option<&Path>) -> Self {
        let loaded = load_sector(&config, data_dir);
        SectorStore {
            config,
            data_dir: data_dir.map(Path::to_path_buf),
            current: RwLock::new(Arc::new(loaded)),
        }
    }

    pub fn config(&self) -> &SectorConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Arc<LoadedSector> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&*guard)
    }

    /// Re-read the source file and replace the current sector.
    pub fn reload(&self) -> Arc<LoadedSector> {
        let next = Arc::new(load_sector(&self.config, self.data_dir.as_deref()));
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        *guard = Arc::clone(&next);
        info!(sector = %self.config.slug, records = next.records.len(), "sector reloaded");
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SectorRegistry;
    use std::fs;

    #[test]
    fn reload_swaps_whole_sector() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = SectorRegistry::builtin().get("health").unwrap().clone();
        let store = SectorStore::open(config, Some(dir.path()));

        let before = store.snapshot();
        assert!(before.records.is_empty());
        assert!(!before.notices.is_empty());

        fs::write(
            dir.path().join("health.csv"),
            "Outcome,Indicators,Status based on 2024/25 Target,Status based on NST2 Midterm target\n\
             Care,Immunization,GOOD,COMPLETED\n",
        )
        .unwrap();
        let after = store.reload();
        assert_eq!(after.records.len(), 1);
        assert!(after.schema.is_complete());
        assert!(after.notices.is_empty());

        // Old snapshot is untouched.
        assert!(before.records.is_empty());
        assert!(Arc::ptr_eq(&after, &store.snapshot()));
        assert_eq!(store.snapshot().summary().overall_near.good, 1);
    }
}
