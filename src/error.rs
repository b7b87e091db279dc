use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Failures that cross a module boundary.
///
/// Data problems inside a sector file never show up here: they degrade to
/// notices on the loaded sector instead. These variants cover the points
/// where something outside the data is wrong (a missing file, an unreadable
/// registry, an export target we cannot write).
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("data file not found: {}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid sector configuration: {0}")]
    Config(String),

    #[error("unknown sector: {0}")]
    UnknownSector(String),
}

impl From<toml::de::Error> for DashboardError {
    fn from(err: toml::de::Error) -> Self {
        DashboardError::Config(err.to_string())
    }
}

/// One or more essential columns could not be matched against the headers.
///
/// `missing` holds the primary expected label of each unresolved column, in
/// canonical key order, ready to be shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("Missing essential columns for dashboard functionality: {}", .missing.join(", "))]
pub struct SchemaIncomplete {
    pub missing: Vec<String>,
}
