//! Header vocabulary and schema resolution.
//!
//! A sector declares which labels it expects for each [`CanonicalKey`]; the
//! resolver matches them against whatever headers the file actually has,
//! comparing both sides through [`normalize_header`].

use crate::error::SchemaIncomplete;
use crate::types::{CanonicalKey, Horizon};
use crate::util::normalize_header;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Expected header labels per canonical key.
///
/// The first label of each entry is the primary one (used in user-facing
/// messages); the rest are aliases tried in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderVocabulary {
    labels: BTreeMap<CanonicalKey, Vec<String>>,
}

impl HeaderVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: CanonicalKey, labels: &[&str]) -> Self {
        self.set(key, labels.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Replace the labels of one key. An empty list removes the key.
    pub fn set(&mut self, key: CanonicalKey, labels: Vec<String>) {
        if labels.is_empty() {
            self.labels.remove(&key);
        } else {
            self.labels.insert(key, labels);
        }
    }

    pub fn labels(&self, key: CanonicalKey) -> &[String] {
        self.labels.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn primary_label(&self, key: CanonicalKey) -> Option<&str> {
        self.labels(key).first().map(String::as_str)
    }

    /// Whether the sector nests items under a subgroup level.
    pub fn has_subgroup_level(&self) -> bool {
        self.labels.contains_key(&CanonicalKey::Subgroup)
    }

    /// Keys without which aggregation and detail views are meaningless.
    pub fn essential_keys(&self) -> Vec<CanonicalKey> {
        let mut keys = vec![CanonicalKey::Group];
        if self.has_subgroup_level() {
            keys.push(CanonicalKey::Subgroup);
        }
        keys.push(CanonicalKey::ItemName);
        keys
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub name: String,
    pub index: usize,
}

/// Canonical key to actual column, for one loaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalSchema {
    columns: BTreeMap<CanonicalKey, ResolvedColumn>,
    essential: Vec<CanonicalKey>,
    missing_essential: Vec<String>,
    subgroup_level: bool,
}

impl CanonicalSchema {
    /// The actual header a key resolved to, or `None` when absent.
    pub fn column(&self, key: CanonicalKey) -> Option<&str> {
        self.columns.get(&key).map(|c| c.name.as_str())
    }

    pub fn index(&self, key: CanonicalKey) -> Option<usize> {
        self.columns.get(&key).map(|c| c.index)
    }

    pub fn is_present(&self, key: CanonicalKey) -> bool {
        self.columns.contains_key(&key)
    }

    pub fn is_complete(&self) -> bool {
        self.missing_essential.is_empty()
    }

    pub fn completeness(&self) -> Result<(), SchemaIncomplete> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(SchemaIncomplete {
                missing: self.missing_essential.clone(),
            })
        }
    }

    pub fn has_subgroup_level(&self) -> bool {
        self.subgroup_level
    }

    pub fn essential_keys(&self) -> &[CanonicalKey] {
        &self.essential
    }

    pub fn has_status(&self, horizon: Horizon) -> bool {
        self.is_present(horizon.status_key())
    }

    pub fn resolved(&self) -> impl Iterator<Item = (CanonicalKey, &ResolvedColumn)> {
        self.columns.iter().map(|(k, c)| (*k, c))
    }
}

/// Match a vocabulary against the headers of one file.
///
/// For every key, each expected label is compared (normalized) with each
/// actual header (normalized) in column order; the earliest column wins.
/// Labels are tried primary first, then aliases. Keys with no match are
/// left absent. Missing essential keys are recorded and reported through
/// [`CanonicalSchema::completeness`].
pub fn resolve_schema<S: AsRef<str>>(
    actual_headers: &[S],
    vocabulary: &HeaderVocabulary,
) -> CanonicalSchema {
    let normalized: Vec<String> = actual_headers
        .iter()
        .map(|h| normalize_header(Some(h.as_ref())))
        .collect();

    let mut columns = BTreeMap::new();
    for key in CanonicalKey::ALL {
        let found = vocabulary.labels(key).iter().find_map(|label| {
            let wanted = normalize_header(Some(label));
            if wanted.is_empty() {
                return None;
            }
            normalized.iter().position(|h| *h == wanted)
        });
        match found {
            Some(index) => {
                let name = actual_headers[index].as_ref().to_string();
                debug!(key = %key, column = %name, index, "resolved column");
                columns.insert(key, ResolvedColumn { name, index });
            }
            None if !vocabulary.labels(key).is_empty() => {
                debug!(key = %key, "column not found");
            }
            None => {}
        }
    }

    let essential = vocabulary.essential_keys();
    let missing_essential = essential
        .iter()
        .filter(|k| !columns.contains_key(*k))
        .map(|k| {
            vocabulary
                .primary_label(*k)
                .map(str::to_string)
                .unwrap_or_else(|| k.as_str().to_string())
        })
        .collect();

    CanonicalSchema {
        columns,
        essential,
        missing_essential,
        subgroup_level: vocabulary.has_subgroup_level(),
    }
}
