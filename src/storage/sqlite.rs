//! SQLite storage implementation

use std::path::Path;
use rusqlite::types::{Type, ValueRef};
use rusqlite::{params, Connection, ErrorCode, OpenFlags, OptionalExtension};
use serde::Serialize;
use crate::carbon::{CarbonMetric, NewCarbonMetric};
use crate::hierarchy::RegionTree;
use crate::measurement::{Measurement, NewMeasurement};
use crate::project::{NewProject, Project, ProjectListing};
use crate::region::{NewRegion, Region, RegionLevel};
use crate::report::{self, NewReport, RegionReport, Report};
use crate::seed::{self, SeedData};
use crate::target::{NewTarget, Target};
use crate::{Error, Result};
use super::schema;

/// SQLite-backed registry store.
///
/// A `Store` owns its connection; dropping it releases the file. Multi-row
/// writes run inside a single transaction that rolls back on any error.
pub struct Store {
    conn: Connection,
    location: String,
}

impl Store {
    /// Open a database file, creating it if it doesn't exist.
    ///
    /// Does not create tables; call [`Store::initialize`] for that.
    pub fn open(path: &Path) -> Result<Self> {
        let location = path.display().to_string();
        let conn = Connection::open(path)
            .map_err(|source| Error::unavailable(location.clone(), source))?;
        Self::configure(conn, location)
    }

    /// Create the parent directories of `path`, then open it.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                std::fs::create_dir_all(parent)
                    .map_err(|source| Error::unavailable(path.display().to_string(), source))?;
            }
        }
        Self::open(path)
    }

    /// Open a database file that must already exist.
    ///
    /// A missing file means the store was never initialized.
    pub fn open_existing(path: &Path) -> Result<Self> {
        let location = path.display().to_string();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = match Connection::open_with_flags(path, flags) {
            Ok(conn) => conn,
            Err(_) if !path.exists() => return Err(Error::NotInitialized),
            Err(source) => return Err(Error::unavailable(location, source)),
        };
        Self::configure(conn, location)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let location = ":memory:".to_string();
        let conn = Connection::open_in_memory()
            .map_err(|source| Error::unavailable(location.clone(), source))?;
        Self::configure(conn, location)
    }

    fn configure(conn: Connection, location: String) -> Result<Self> {
        // Reading the header forces SQLite to actually open the file
        let header = conn
            .execute_batch(schema::CONNECTION_PRAGMAS)
            .and_then(|_| conn.query_row("PRAGMA user_version", [], |row| row.get::<_, i64>(0)));

        match header {
            Ok(version) => {
                tracing::debug!("Opened store at {} (schema version {})", location, version);
                Ok(Self { conn, location })
            }
            Err(source) => Err(Error::unavailable(location, source)),
        }
    }

    /// Where this store lives (file path or `:memory:`)
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Create all tables and indexes if they do not exist.
    ///
    /// Safe to call repeatedly; existing rows are never touched. Fails with
    /// [`Error::SchemaMismatch`] when the file already holds registry tables
    /// that are not stamped with the current schema version.
    pub fn initialize(&self) -> Result<()> {
        let version = self.schema_version()?;
        if version != schema::SCHEMA_VERSION && (version != 0 || self.present_tables()? > 0) {
            return Err(Error::SchemaMismatch {
                found: version,
                expected: schema::SCHEMA_VERSION,
            });
        }

        let tx = self.conn.unchecked_transaction().map_err(|e| self.storage_error(e))?;
        for stmt in schema::all_schema_statements() {
            tx.execute(stmt, []).map_err(|e| self.storage_error(e))?;
        }
        tx.pragma_update(None, "user_version", schema::SCHEMA_VERSION)
            .map_err(|e| self.storage_error(e))?;
        tx.commit().map_err(|e| self.storage_error(e))?;
        tracing::info!("Initialized schema v{} at {}", schema::SCHEMA_VERSION, self.location);
        Ok(())
    }

    /// Value of `PRAGMA user_version`; 0 for a file never initialized
    pub fn schema_version(&self) -> Result<i64> {
        self.conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|e| self.storage_error(e))
    }

    /// How many registry tables exist
    fn present_tables(&self) -> Result<usize> {
        let mut present = 0;
        for table in schema::TABLES {
            let exists: bool = self
                .conn
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                    [table],
                    |row| row.get(0),
                )
                .map_err(|e| self.storage_error(e))?;
            if exists {
                present += 1;
            }
        }
        Ok(present)
    }

    /// Whether every registry table exists at the current schema version
    pub fn is_initialized(&self) -> Result<bool> {
        Ok(self.schema_version()? == schema::SCHEMA_VERSION
            && self.present_tables()? == schema::TABLES.len())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized()? {
            return Ok(());
        }
        match self.schema_version()? {
            0 | schema::SCHEMA_VERSION => Err(Error::NotInitialized),
            found => Err(Error::SchemaMismatch {
                found,
                expected: schema::SCHEMA_VERSION,
            }),
        }
    }

    /// Classify low-level failures that mean the file itself is unusable
    fn storage_error(&self, err: rusqlite::Error) -> Error {
        match err.sqlite_error_code() {
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::ReadOnly
                | ErrorCode::DiskFull
                | ErrorCode::PermissionDenied
                | ErrorCode::SystemIoFailure
                | ErrorCode::NotADatabase,
            ) => Error::unavailable(self.location.clone(), err),
            _ => Error::Storage(err),
        }
    }

    // ========== Seeding ==========

    /// Insert the bundled sample dataset.
    ///
    /// Fails with [`Error::DuplicateSeedData`] if the store already holds regions.
    pub fn seed(&mut self) -> Result<TableCounts> {
        let data = SeedData::sample()?;
        self.seed_with(&data)
    }

    /// Insert a caller-provided dataset as one transaction
    pub fn seed_with(&mut self, data: &SeedData) -> Result<TableCounts> {
        self.ensure_initialized()?;

        let tx = self.conn.transaction()?;
        let existing = count_rows(&tx, "regions")?;
        if existing > 0 {
            return Err(Error::DuplicateSeedData { regions: existing });
        }

        let counts = seed::apply(&tx, data)?;
        tx.commit()?;

        tracing::info!(
            "Seeded {} regions, {} projects, {} measurements",
            counts.regions,
            counts.projects,
            counts.measurements
        );
        Ok(counts)
    }

    // ========== Inserts ==========

    /// Insert a region, returning its id
    pub fn insert_region(&self, region: &NewRegion) -> Result<i64> {
        insert_region(&self.conn, region)
    }

    /// Insert a project, returning its id
    pub fn insert_project(&self, project: &NewProject) -> Result<i64> {
        insert_project(&self.conn, project)
    }

    /// Insert a measurement, returning its id
    pub fn insert_measurement(&self, measurement: &NewMeasurement) -> Result<i64> {
        insert_measurement(&self.conn, measurement)
    }

    /// Insert several measurements in one transaction
    pub fn insert_measurements(&mut self, measurements: &[NewMeasurement]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        for m in measurements {
            insert_measurement(&tx, m)?;
        }
        tx.commit()?;
        Ok(measurements.len())
    }

    /// Insert a carbon metric, returning its id
    pub fn insert_carbon_metric(&self, metric: &NewCarbonMetric) -> Result<i64> {
        insert_carbon_metric(&self.conn, metric)
    }

    /// Insert a target, returning its id
    pub fn insert_target(&self, target: &NewTarget) -> Result<i64> {
        insert_target(&self.conn, target)
    }

    /// Insert a report, returning its id
    pub fn insert_report(&self, report: &NewReport) -> Result<i64> {
        insert_report(&self.conn, report)
    }

    // ========== Listing ==========

    /// All regions ordered by id
    pub fn list_regions(&self) -> Result<Vec<Region>> {
        self.ensure_initialized()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, name, level, parent_id, geo_code FROM regions ORDER BY id",
        )?;
        let regions = stmt
            .query_map([], row_to_region)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(regions)
    }

    /// All projects ordered by id, each with its region's name
    pub fn list_projects(&self) -> Result<Vec<ProjectListing>> {
        self.ensure_initialized()?;
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.region_id, p.name, p.technology, p.capacity_mw, p.status,
                   p.commissioning_date, p.owner, p.latitude, p.longitude, r.name
            FROM projects p
            JOIN regions r ON r.id = p.region_id
            ORDER BY p.id
            "#,
        )?;
        let projects = stmt
            .query_map([], |row| {
                Ok(ProjectListing {
                    project: row_to_project(row)?,
                    region_name: row.get(10)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(projects)
    }

    /// Measurements ordered by id, or one project's time series ordered by timestamp
    pub fn list_measurements(&self, project_id: Option<i64>) -> Result<Vec<Measurement>> {
        self.ensure_initialized()?;
        let measurements = match project_id {
            Some(id) => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, project_id, timestamp, generation_mwh FROM measurements WHERE project_id = ?1 ORDER BY timestamp, id",
                )?;
                let rows = stmt
                    .query_map([id], row_to_measurement)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, project_id, timestamp, generation_mwh FROM measurements ORDER BY id",
                )?;
                let rows = stmt
                    .query_map([], row_to_measurement)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(measurements)
    }

    /// All carbon metrics ordered by id
    pub fn list_carbon_metrics(&self) -> Result<Vec<CarbonMetric>> {
        self.ensure_initialized()?;
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, project_id, region_id, metric_type, value, period_start, period_end, source
            FROM carbon_metrics ORDER BY id
            "#,
        )?;
        let metrics = stmt
            .query_map([], |row| {
                Ok(CarbonMetric {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    region_id: row.get(2)?,
                    metric_type: row.get(3)?,
                    value: row.get(4)?,
                    period_start: row.get(5)?,
                    period_end: row.get(6)?,
                    source: row.get(7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(metrics)
    }

    /// All targets ordered by id
    pub fn list_targets(&self) -> Result<Vec<Target>> {
        self.ensure_initialized()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, region_id, year, target_type, value, status FROM targets ORDER BY id",
        )?;
        let targets = stmt
            .query_map([], |row| {
                let kind: String = row.get(3)?;
                Ok(Target {
                    id: row.get(0)?,
                    region_id: row.get(1)?,
                    year: row.get(2)?,
                    target_type: kind.parse().map_err(|e: Error| conversion_failure(3, e))?,
                    value: row.get(4)?,
                    status: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(targets)
    }

    /// All reports ordered by id
    pub fn list_reports(&self) -> Result<Vec<Report>> {
        self.ensure_initialized()?;
        let mut stmt = self.conn.prepare(
            "SELECT id, reporter, region_id, created_at, payload FROM reports ORDER BY id",
        )?;
        let reports = stmt
            .query_map([], |row| {
                let payload: Option<String> = row.get(4)?;
                let payload = payload
                    .map(|text| serde_json::from_str(&text))
                    .transpose()
                    .map_err(|e| conversion_failure(4, e))?;
                Ok(Report {
                    id: row.get(0)?,
                    reporter: row.get(1)?,
                    region_id: row.get(2)?,
                    created_at: row.get(3)?,
                    payload,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reports)
    }

    // ========== Derived views ==========

    /// Load regions into a validated hierarchy
    pub fn region_tree(&self) -> Result<RegionTree> {
        RegionTree::build(self.list_regions()?)
    }

    /// Per-region aggregates over projects, measurements, metrics and targets
    pub fn region_reports(&self) -> Result<Vec<RegionReport>> {
        let tree = self.region_tree()?;
        let projects: Vec<Project> = self.list_projects()?.into_iter().map(|p| p.project).collect();
        let measurements = self.list_measurements(None)?;
        let metrics = self.list_carbon_metrics()?;
        let targets = self.list_targets()?;
        Ok(report::region_reports(&tree, &projects, &measurements, &metrics, &targets))
    }

    /// Row count of every table
    pub fn stats(&self) -> Result<TableCounts> {
        self.ensure_initialized()?;
        Ok(TableCounts {
            regions: count_rows(&self.conn, "regions")?,
            projects: count_rows(&self.conn, "projects")?,
            measurements: count_rows(&self.conn, "measurements")?,
            carbon_metrics: count_rows(&self.conn, "carbon_metrics")?,
            targets: count_rows(&self.conn, "targets")?,
            reports: count_rows(&self.conn, "reports")?,
        })
    }

    /// BLAKE3 digest over the content of every table, ordered by id.
    ///
    /// Two stores with identical rows produce identical digests.
    pub fn digest(&self) -> Result<String> {
        self.ensure_initialized()?;
        let mut hasher = blake3::Hasher::new();

        for table in schema::TABLES {
            hasher.update(table.as_bytes());
            let mut stmt = self.conn.prepare(&format!("SELECT * FROM {} ORDER BY id", table))?;
            let columns = stmt.column_count();
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                for i in 0..columns {
                    match row.get_ref(i)? {
                        ValueRef::Null => {
                            hasher.update(&[0]);
                        }
                        ValueRef::Integer(v) => {
                            hasher.update(&[1]);
                            hasher.update(&v.to_le_bytes());
                        }
                        ValueRef::Real(v) => {
                            hasher.update(&[2]);
                            hasher.update(&v.to_le_bytes());
                        }
                        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
                            hasher.update(&[3]);
                            hasher.update(&(bytes.len() as u64).to_le_bytes());
                            hasher.update(bytes);
                        }
                    }
                }
            }
        }

        Ok(hasher.finalize().to_hex().to_string())
    }
}

// ========== Row-level operations ==========
//
// These take a plain `Connection` so they run unchanged inside a
// `Transaction` (which derefs to `Connection`).

/// Attach table/column context to constraint failures
trait ConstraintContext<T> {
    fn on_column(self, table: &str, column: &str) -> Result<T>;
}

impl<T> ConstraintContext<T> for rusqlite::Result<T> {
    fn on_column(self, table: &str, column: &str) -> Result<T> {
        self.map_err(|err| constraint_error(err, table, column))
    }
}

/// Map a SQLite constraint failure to [`Error::ConstraintViolation`].
///
/// NOT NULL and UNIQUE messages name the offending `table.column`; other
/// constraint kinds fall back to the caller's context.
fn constraint_error(err: rusqlite::Error, table: &str, column: &str) -> Error {
    if err.sqlite_error_code() != Some(ErrorCode::ConstraintViolation) {
        return Error::Storage(err);
    }
    let reason = match &err {
        rusqlite::Error::SqliteFailure(_, Some(msg)) => msg.clone(),
        other => other.to_string(),
    };
    let (table, column) = parse_constraint_target(&reason)
        .unwrap_or_else(|| (table.to_string(), column.to_string()));
    Error::ConstraintViolation { table, column, reason }
}

fn parse_constraint_target(message: &str) -> Option<(String, String)> {
    if !(message.starts_with("NOT NULL") || message.starts_with("UNIQUE")) {
        return None;
    }
    let (_, targets) = message.split_once("failed: ")?;
    let first = targets.split(',').next()?.trim();
    let (table, column) = first.split_once('.')?;
    if table.is_empty() || column.is_empty() || first.contains(char::is_whitespace) {
        return None;
    }
    Some((table.to_string(), column.to_string()))
}

fn conversion_failure<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(err))
}

/// Fail with a constraint violation unless `id` exists in `parent_table`
fn require_row(conn: &Connection, parent_table: &str, id: i64, table: &str, column: &str) -> Result<()> {
    let exists: bool = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?1)", parent_table),
        [id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(Error::constraint(
            table,
            column,
            format!("FOREIGN KEY constraint failed: no row {} in {}", id, parent_table),
        ))
    }
}

fn count_rows(conn: &Connection, table: &str) -> Result<usize> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(count as usize)
}

pub(crate) fn insert_region(conn: &Connection, region: &NewRegion) -> Result<i64> {
    region.validate()?;

    if let Some(parent_id) = region.parent_id {
        let parent_level: Option<String> = conn
            .query_row("SELECT level FROM regions WHERE id = ?1", [parent_id], |row| row.get(0))
            .optional()?;
        let Some(parent_level) = parent_level else {
            return Err(Error::constraint(
                "regions",
                "parent_id",
                format!("FOREIGN KEY constraint failed: no row {} in regions", parent_id),
            ));
        };
        let parent_level: RegionLevel = parent_level.parse()?;
        if !region.level.can_nest_under(parent_level) {
            return Err(Error::InvalidHierarchy(format!(
                "{} region '{}' cannot sit under a {} region",
                region.level, region.name, parent_level
            )));
        }
    }

    conn.execute(
        "INSERT INTO regions (name, level, parent_id, geo_code) VALUES (?1, ?2, ?3, ?4)",
        params![region.name, region.level.as_str(), region.parent_id, region.geo_code],
    )
    .on_column("regions", "parent_id")?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_project(conn: &Connection, project: &NewProject) -> Result<i64> {
    project.validate()?;
    require_row(conn, "regions", project.region_id, "projects", "region_id")?;

    conn.execute(
        r#"
        INSERT INTO projects (region_id, name, technology, capacity_mw, status,
                              commissioning_date, owner, latitude, longitude)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            project.region_id,
            project.name,
            project.technology.as_str(),
            project.capacity_mw,
            project.status.as_str(),
            project.commissioning_date,
            project.owner,
            project.latitude,
            project.longitude,
        ],
    )
    .on_column("projects", "region_id")?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_measurement(conn: &Connection, measurement: &NewMeasurement) -> Result<i64> {
    measurement.validate()?;
    require_row(conn, "projects", measurement.project_id, "measurements", "project_id")?;

    conn.execute(
        "INSERT INTO measurements (project_id, timestamp, generation_mwh) VALUES (?1, ?2, ?3)",
        params![measurement.project_id, measurement.timestamp, measurement.generation_mwh],
    )
    .on_column("measurements", "project_id")?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_carbon_metric(conn: &Connection, metric: &NewCarbonMetric) -> Result<i64> {
    metric.validate()?;
    if let Some(project_id) = metric.project_id {
        require_row(conn, "projects", project_id, "carbon_metrics", "project_id")?;
    }
    if let Some(region_id) = metric.region_id {
        require_row(conn, "regions", region_id, "carbon_metrics", "region_id")?;
    }

    conn.execute(
        r#"
        INSERT INTO carbon_metrics (project_id, region_id, metric_type, value, period_start, period_end, source)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            metric.project_id,
            metric.region_id,
            metric.metric_type,
            metric.value,
            metric.period_start,
            metric.period_end,
            metric.source,
        ],
    )
    .on_column("carbon_metrics", "project_id")?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_target(conn: &Connection, target: &NewTarget) -> Result<i64> {
    target.validate()?;
    require_row(conn, "regions", target.region_id, "targets", "region_id")?;

    conn.execute(
        "INSERT INTO targets (region_id, year, target_type, value, status) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            target.region_id,
            target.year,
            target.target_type.as_str(),
            target.value,
            target.status,
        ],
    )
    .on_column("targets", "region_id")?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_report(conn: &Connection, report: &NewReport) -> Result<i64> {
    if let Some(region_id) = report.region_id {
        require_row(conn, "regions", region_id, "reports", "region_id")?;
    }
    let payload = report.payload.as_ref().map(serde_json::to_string).transpose()?;

    conn.execute(
        "INSERT INTO reports (reporter, region_id, created_at, payload) VALUES (?1, ?2, ?3, ?4)",
        params![report.reporter, report.region_id, report.created_at, payload],
    )
    .on_column("reports", "region_id")?;
    Ok(conn.last_insert_rowid())
}

fn row_to_region(row: &rusqlite::Row) -> rusqlite::Result<Region> {
    let level: String = row.get(2)?;
    Ok(Region {
        id: row.get(0)?,
        name: row.get(1)?,
        level: level.parse().map_err(|e: Error| conversion_failure(2, e))?,
        parent_id: row.get(3)?,
        geo_code: row.get(4)?,
    })
}

fn row_to_project(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    let technology: String = row.get(3)?;
    let status: String = row.get(5)?;
    Ok(Project {
        id: row.get(0)?,
        region_id: row.get(1)?,
        name: row.get(2)?,
        technology: technology.parse().map_err(|e: Error| conversion_failure(3, e))?,
        capacity_mw: row.get(4)?,
        status: status.parse().map_err(|e: Error| conversion_failure(5, e))?,
        commissioning_date: row.get(6)?,
        owner: row.get(7)?,
        latitude: row.get(8)?,
        longitude: row.get(9)?,
    })
}

fn row_to_measurement(row: &rusqlite::Row) -> rusqlite::Result<Measurement> {
    Ok(Measurement {
        id: row.get(0)?,
        project_id: row.get(1)?,
        timestamp: row.get(2)?,
        generation_mwh: row.get(3)?,
    })
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub regions: usize,
    pub projects: usize,
    pub measurements: usize,
    pub carbon_metrics: usize,
    pub targets: usize,
    pub reports: usize,
}

impl TableCounts {
    /// `(table, count)` pairs in dependency order
    pub fn rows(&self) -> [(&'static str, usize); 6] {
        [
            ("regions", self.regions),
            ("projects", self.projects),
            ("measurements", self.measurements),
            ("carbon_metrics", self.carbon_metrics),
            ("targets", self.targets),
            ("reports", self.reports),
        ]
    }
}

impl std::fmt::Display for TableCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (table, count) in self.rows() {
            writeln!(f, "  {}: {}", table, count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectStatus, Technology};
    use crate::seed::{SeedProject, SeedRegion};
    use chrono::NaiveDate;

    fn initialized() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.initialize().unwrap();
        store
    }

    fn seeded() -> Store {
        let mut store = initialized();
        store.seed().unwrap();
        store
    }

    fn noon() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let store = initialized();
        store.insert_region(&NewRegion::national("CountryX")).unwrap();
        store.initialize().unwrap();

        let tables: i64 = store
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables as usize, schema::TABLES.len());
        assert_eq!(store.list_regions().unwrap().len(), 1);
    }

    #[test]
    fn test_uninitialized_store_reports_it() {
        let store = Store::open_in_memory().unwrap();
        assert!(!store.is_initialized().unwrap());
        assert!(matches!(store.list_regions(), Err(Error::NotInitialized)));
    }

    #[test]
    fn test_seed_builds_documented_hierarchy() {
        let store = seeded();
        let regions = store.list_regions().unwrap();
        assert_eq!(regions.len(), 5);

        let national: Vec<_> = regions.iter().filter(|r| r.level == RegionLevel::National).collect();
        let states: Vec<_> = regions.iter().filter(|r| r.level == RegionLevel::State).collect();
        let locals: Vec<_> = regions.iter().filter(|r| r.level == RegionLevel::Local).collect();
        assert_eq!((national.len(), states.len(), locals.len()), (1, 2, 2));
        assert_eq!(national[0].name, "CountryX");
        assert!(states.iter().all(|s| s.parent_id == Some(national[0].id)));

        let ids: Vec<i64> = regions.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);

        let tree = store.region_tree().unwrap();
        assert_eq!(tree.roots().len(), 1);
    }

    #[test]
    fn test_list_projects_scenario() {
        let store = seeded();
        let projects = store.list_projects().unwrap();
        let solar = projects
            .iter()
            .find(|p| p.project.name == "SolarFarm1")
            .expect("SolarFarm1 seeded");
        assert_eq!(solar.region_name, "StateY");
        assert_eq!(solar.project.technology, Technology::Solar);
        assert!((solar.project.capacity_mw - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_referential_integrity_after_seed() {
        let store = seeded();
        let region_ids: Vec<i64> = store.list_regions().unwrap().iter().map(|r| r.id).collect();
        for p in store.list_projects().unwrap() {
            assert!(region_ids.contains(&p.project.region_id));
        }
        assert!(store.list_measurements(None).unwrap().iter().all(|m| m.generation_mwh >= 0.0));
    }

    #[test]
    fn test_reseed_fails_without_changes() {
        let mut store = seeded();
        let before = store.stats().unwrap();
        match store.seed() {
            Err(Error::DuplicateSeedData { regions }) => assert_eq!(regions, 5),
            other => panic!("expected DuplicateSeedData, got {:?}", other.map(|_| ())),
        }
        assert_eq!(store.stats().unwrap(), before);
    }

    #[test]
    fn test_failed_seed_rolls_back() {
        let mut store = initialized();
        let mut data = SeedData::sample().unwrap();
        data.projects.push(SeedProject {
            region: "Atlantis".to_string(),
            ..data.projects[0].clone()
        });

        match store.seed_with(&data) {
            Err(Error::ConstraintViolation { table, column, .. }) => {
                assert_eq!(table, "projects");
                assert_eq!(column, "region_id");
            }
            other => panic!("expected ConstraintViolation, got {:?}", other.map(|_| ())),
        }
        assert_eq!(store.stats().unwrap(), TableCounts::default());

        // The store is still usable afterwards
        store.seed().unwrap();
        assert_eq!(store.stats().unwrap(), SeedData::sample().unwrap().counts());
    }

    #[test]
    fn test_seed_rejects_forward_parent_reference() {
        let mut store = initialized();
        let data = SeedData {
            regions: vec![SeedRegion {
                name: "StateY".to_string(),
                level: RegionLevel::State,
                parent: Some("CountryX".to_string()),
                geo_code: None,
            }],
            ..SeedData::default()
        };
        assert!(matches!(
            store.seed_with(&data),
            Err(Error::ConstraintViolation { ref column, .. }) if column == "parent_id"
        ));
    }

    #[test]
    fn test_project_with_missing_region_rejected() {
        let store = initialized();
        let err = store
            .insert_project(&NewProject::new(42, "Ghost", Technology::Wind, 10.0, ProjectStatus::Planned))
            .unwrap_err();
        match err {
            Error::ConstraintViolation { table, column, .. } => {
                assert_eq!(table, "projects");
                assert_eq!(column, "region_id");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(store.stats().unwrap().projects, 0);
    }

    #[test]
    fn test_database_enforces_foreign_keys() {
        let store = initialized();
        let err = store
            .conn
            .execute(
                "INSERT INTO projects (region_id, name, technology, capacity_mw, status) VALUES (99, 'x', 'solar', 1.0, 'active')",
                [],
            )
            .on_column("projects", "region_id")
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { ref table, .. } if table == "projects"));
    }

    #[test]
    fn test_not_null_violation_names_column() {
        let store = initialized();
        let err = store
            .conn
            .execute("INSERT INTO regions (name, level) VALUES (NULL, 'national')", [])
            .on_column("regions", "parent_id")
            .unwrap_err();
        match err {
            Error::ConstraintViolation { table, column, .. } => {
                assert_eq!(table, "regions");
                assert_eq!(column, "name");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_delete_is_restricted() {
        let store = seeded();
        let err = store
            .conn
            .execute("DELETE FROM regions WHERE name = 'StateY'", [])
            .on_column("regions", "id")
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { .. }));
        assert_eq!(store.stats().unwrap().regions, 5);
    }

    #[test]
    fn test_negative_generation_rejected() {
        let store = seeded();
        let err = store
            .insert_measurement(&NewMeasurement::new(1, noon(), -3.0))
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { ref column, .. } if column == "generation_mwh"));
    }

    #[test]
    fn test_measurement_series_for_project() {
        let mut store = seeded();
        let later = noon() + chrono::Duration::hours(5);
        store
            .insert_measurements(&[NewMeasurement::new(1, later, 10.0), NewMeasurement::new(1, noon(), 7.0)])
            .unwrap();

        let series = store.list_measurements(Some(1)).unwrap();
        assert_eq!(series.len(), 4);
        assert!(series.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(series.iter().all(|m| m.project_id == 1));
    }

    #[test]
    fn test_duplicate_target_rejected() {
        let store = seeded();
        let err = store
            .insert_target(&NewTarget::new(1, 2030, crate::target::TargetType::Capacity, 1.0))
            .unwrap_err();
        match err {
            Error::ConstraintViolation { table, column, .. } => {
                assert_eq!(table, "targets");
                assert_eq!(column, "region_id");
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_region_level_rules_enforced() {
        let store = initialized();
        let country = store.insert_region(&NewRegion::national("CountryX")).unwrap();
        let city = store
            .insert_region(&NewRegion::child("CityZ", RegionLevel::Local, country))
            .unwrap();
        let err = store
            .insert_region(&NewRegion::child("StateY", RegionLevel::State, city))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHierarchy(_)));
    }

    #[test]
    fn test_carbon_metric_needs_existing_subject() {
        let store = seeded();
        let err = store
            .insert_carbon_metric(&NewCarbonMetric::for_region(77, "grid_intensity_kg_per_kwh", 0.5))
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { ref column, .. } if column == "region_id"));

        let metrics = store.list_carbon_metrics().unwrap();
        assert_eq!(metrics.len(), 3);
        assert!(metrics.iter().all(|m| m.project_id.is_some() || m.region_id.is_some()));
    }

    #[test]
    fn test_report_payload_round_trips_json() {
        let store = seeded();
        let reports = store.list_reports().unwrap();
        assert_eq!(reports.len(), 1);
        let payload = reports[0].payload.as_ref().unwrap();
        assert_eq!(payload["notes"], "Quarterly update");
    }

    #[test]
    fn test_region_reports_from_seed() {
        let store = seeded();
        let reports = store.region_reports().unwrap();
        assert_eq!(reports.len(), 5);

        let national = &reports[0];
        assert_eq!(national.region_name, "CountryX");
        assert_eq!(national.project_count, 4);
        // planned hydro project is excluded from installed capacity
        assert!((national.active_capacity_mw - 162.5).abs() < 1e-9);
        assert!((national.avoided_emissions_t - 1510.5).abs() < 1e-9);
    }

    #[test]
    fn test_file_store_reseed_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renewable.db");

        let first = {
            let mut store = Store::open(&path).unwrap();
            store.initialize().unwrap();
            store.seed().unwrap();
            (store.stats().unwrap(), store.digest().unwrap())
        };

        std::fs::remove_file(&path).unwrap();

        let second = {
            let mut store = Store::open(&path).unwrap();
            store.initialize().unwrap();
            store.seed().unwrap();
            (store.stats().unwrap(), store.digest().unwrap())
        };

        assert_eq!(first, second);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renewable.db");
        {
            let mut store = Store::open(&path).unwrap();
            store.initialize().unwrap();
            store.seed().unwrap();
        }
        let store = Store::open(&path).unwrap();
        store.initialize().unwrap();
        assert_eq!(store.stats().unwrap().regions, 5);
    }

    #[test]
    fn test_unopenable_location_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no").join("such").join("dir").join("renewable.db");
        assert!(matches!(Store::open(&missing), Err(Error::StorageUnavailable { .. })));

        // a directory is not a database file
        let result = Store::open(dir.path()).and_then(|store| store.initialize());
        assert!(matches!(result, Err(Error::StorageUnavailable { .. })));
    }

    #[test]
    fn test_open_existing_never_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");

        assert!(matches!(Store::open_existing(&path), Err(Error::NotInitialized)));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_existing_reads_initialized_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renewable.db");
        {
            let mut store = Store::create(&path).unwrap();
            store.initialize().unwrap();
            store.seed().unwrap();
        }
        let store = Store::open_existing(&path).unwrap();
        assert_eq!(store.list_regions().unwrap().len(), 5);
    }

    #[test]
    fn test_create_makes_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("nested").join("renewable.db");
        let store = Store::create(&path).unwrap();
        store.initialize().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_create_under_a_file_is_storage_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"plain file").unwrap();
        let path = blocker.join("sub").join("renewable.db");

        match Store::create(&path) {
            Err(Error::StorageUnavailable { path: reported, .. }) => {
                assert_eq!(reported, path.display().to_string());
            }
            other => panic!("expected StorageUnavailable, got {:?}", other.map(|_| ())),
        }
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_create_under_read_only_parent_is_storage_unavailable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        // root ignores directory permissions
        let marker = locked.join(".write-check");
        if std::fs::write(&marker, b"").is_ok() {
            std::fs::remove_file(&marker).unwrap();
            return;
        }

        let result = Store::create(&locked.join("sub").join("renewable.db"));
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(result, Err(Error::StorageUnavailable { .. })));
    }

    #[test]
    fn test_initialize_rejects_foreign_regions_table() {
        let store = Store::open_in_memory().unwrap();
        store
            .conn
            .execute_batch("CREATE TABLE regions (code TEXT PRIMARY KEY, label TEXT)")
            .unwrap();

        assert!(matches!(
            store.initialize(),
            Err(Error::SchemaMismatch { found: 0, expected: schema::SCHEMA_VERSION })
        ));
        assert_eq!(store.schema_version().unwrap(), 0);
    }

    #[test]
    fn test_newer_schema_version_is_rejected() {
        let store = initialized();
        store.conn.pragma_update(None, "user_version", 7i64).unwrap();

        assert!(!store.is_initialized().unwrap());
        assert!(matches!(
            store.initialize(),
            Err(Error::SchemaMismatch { found: 7, .. })
        ));
        assert!(matches!(
            store.list_regions(),
            Err(Error::SchemaMismatch { found: 7, .. })
        ));
    }

    #[test]
    fn test_digest_changes_with_content() {
        let store = seeded();
        let before = store.digest().unwrap();
        store.insert_measurement(&NewMeasurement::new(1, noon(), 1.0)).unwrap();
        assert_ne!(before, store.digest().unwrap());
    }

    #[test]
    fn test_parse_constraint_target() {
        assert_eq!(
            parse_constraint_target("NOT NULL constraint failed: projects.region_id"),
            Some(("projects".to_string(), "region_id".to_string()))
        );
        assert_eq!(
            parse_constraint_target("UNIQUE constraint failed: targets.region_id, targets.year"),
            Some(("targets".to_string(), "region_id".to_string()))
        );
        assert_eq!(parse_constraint_target("FOREIGN KEY constraint failed"), None);
        assert_eq!(parse_constraint_target("CHECK constraint failed: capacity_mw >= 0"), None);
    }
}
