//! # Renewable - Renewable Energy Registry
//!
//! A small relational registry for renewable energy installations.
//!
//! Renewable provides:
//! - A region hierarchy (national → state → local) with validated parent chains
//! - Projects, generation measurements, carbon metrics, targets and reports
//! - SQLite-backed storage with enforced referential integrity
//! - A deterministic sample dataset for bootstrapping a fresh store
//! - Aggregate reports and simple carbon / PV / adoption estimators

pub mod region;
pub mod project;
pub mod measurement;
pub mod carbon;
pub mod target;
pub mod report;
pub mod hierarchy;
pub mod forecast;
pub mod seed;
pub mod storage;
pub mod output;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use region::{Region, RegionLevel};
pub use project::{Project, ProjectListing, ProjectStatus, Technology};
pub use measurement::Measurement;
pub use carbon::CarbonMetric;
pub use target::{Target, TargetType};
pub use report::{Report, RegionReport};
pub use hierarchy::RegionTree;
pub use seed::SeedData;
pub use storage::Store;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for registry operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage unavailable at {path}: {source}")]
    StorageUnavailable {
        path: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Constraint violation on {table}.{column}: {reason}")]
    ConstraintViolation {
        table: String,
        column: String,
        reason: String,
    },

    #[error("Store already contains seed data ({regions} regions present)")]
    DuplicateSeedData { regions: usize },

    #[error("Store is not initialized (run `init-db` first)")]
    NotInitialized,

    #[error("Store schema version {found} does not match expected version {expected}")]
    SchemaMismatch { found: i64, expected: i64 },

    #[error("Invalid region hierarchy: {0}")]
    InvalidHierarchy(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a storage-unavailable error for `path`
    pub fn unavailable(
        path: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::StorageUnavailable {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Build a constraint violation for a known table and column
    pub fn constraint(table: &str, column: &str, reason: impl Into<String>) -> Self {
        Error::ConstraintViolation {
            table: table.to_string(),
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}
