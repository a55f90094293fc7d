//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a single SQLite file with tables:
//! - regions(id, name, level, parent_id, geo_code)
//! - projects(id, region_id, name, technology, capacity_mw, status, ...)
//! - measurements(id, project_id, timestamp, generation_mwh)
//! - carbon_metrics(id, project_id, region_id, metric_type, value, ...)
//! - targets(id, region_id, year, target_type, value, status)
//! - reports(id, reporter, region_id, created_at, payload)

pub mod schema;
pub mod sqlite;

pub use sqlite::{Store, TableCounts};
