//! Progress reporting for sector spreadsheets.
//!
//! Loosely structured sector files (headers that drift between files,
//! optional columns, free-text statuses, fraction-encoded progress) are
//! mapped onto one canonical schema, then summarized into status
//! breakdowns, metric counts and per-indicator details.
//!
//! The pipeline is: [`loader::read_table`] → [`schema::resolve_schema`] →
//! [`loader::clean_records`] → [`reports`] / [`detail`]. [`store::SectorStore`]
//! keeps the result of one load and swaps it on reload.
pub mod config;
pub mod detail;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod schema;
pub mod store;
pub mod types;
pub mod util;
pub mod values;

pub use config::{SectorConfig, SectorRegistry};
pub use detail::{resolve_detail, DetailView, Selection};
pub use error::{DashboardError, SchemaIncomplete};
pub use loader::{load_sector, LoadReport};
pub use reports::{compute_breakdown, compute_summary};
pub use schema::{resolve_schema, CanonicalSchema, HeaderVocabulary};
pub use store::SectorStore;
pub use types::{
    AggregateSummary, CanonicalKey, Horizon, LoadedSector, Record, StatusBreakdown,
    StatusCategory,
};
