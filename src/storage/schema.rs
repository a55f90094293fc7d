//! Database schema definitions
//!
//! Every foreign key is declared `ON DELETE RESTRICT`: a region cannot be
//! removed while projects, targets, metrics, reports or child regions still
//! reference it, and a project cannot be removed while it has measurements
//! or metrics.

/// Schema version written to `PRAGMA user_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Pragmas applied to every connection
pub const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;";

/// SQL to create the regions table
pub const CREATE_REGIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS regions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    level TEXT NOT NULL CHECK (level IN ('national', 'state', 'local')),
    parent_id INTEGER REFERENCES regions(id) ON DELETE RESTRICT,
    geo_code TEXT,
    CHECK ((level = 'national') = (parent_id IS NULL))
)
"#;

/// SQL to create the projects table
pub const CREATE_PROJECTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    region_id INTEGER NOT NULL REFERENCES regions(id) ON DELETE RESTRICT,
    name TEXT NOT NULL,
    technology TEXT NOT NULL CHECK (technology IN ('solar', 'wind', 'hydro', 'other')),
    capacity_mw REAL NOT NULL DEFAULT 0.0 CHECK (capacity_mw >= 0),
    status TEXT NOT NULL DEFAULT 'planned' CHECK (status IN ('planned', 'active', 'decommissioned')),
    commissioning_date DATE,
    owner TEXT,
    latitude REAL,
    longitude REAL
)
"#;

/// SQL to create the measurements table
pub const CREATE_MEASUREMENTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS measurements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE RESTRICT,
    timestamp DATETIME NOT NULL,
    generation_mwh REAL NOT NULL DEFAULT 0.0 CHECK (generation_mwh >= 0)
)
"#;

/// SQL to create the carbon_metrics table
/// A metric references a project, a region, or both
pub const CREATE_CARBON_METRICS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS carbon_metrics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER REFERENCES projects(id) ON DELETE RESTRICT,
    region_id INTEGER REFERENCES regions(id) ON DELETE RESTRICT,
    metric_type TEXT NOT NULL,
    value REAL NOT NULL,
    period_start DATE,
    period_end DATE,
    source TEXT,
    CHECK (project_id IS NOT NULL OR region_id IS NOT NULL)
)
"#;

/// SQL to create the targets table
pub const CREATE_TARGETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS targets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    region_id INTEGER NOT NULL REFERENCES regions(id) ON DELETE RESTRICT,
    year INTEGER NOT NULL,
    target_type TEXT NOT NULL CHECK (target_type IN ('capacity', 'share')),
    value REAL NOT NULL,
    status TEXT NOT NULL DEFAULT 'active',
    UNIQUE(region_id, year, target_type)
)
"#;

/// SQL to create the reports table
pub const CREATE_REPORTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    reporter TEXT,
    region_id INTEGER REFERENCES regions(id) ON DELETE RESTRICT,
    created_at DATETIME NOT NULL,
    payload TEXT
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_regions_parent ON regions(parent_id)",
    "CREATE INDEX IF NOT EXISTS idx_projects_region ON projects(region_id)",
    "CREATE INDEX IF NOT EXISTS idx_measurements_project_ts ON measurements(project_id, timestamp)",
    "CREATE INDEX IF NOT EXISTS idx_carbon_project ON carbon_metrics(project_id)",
    "CREATE INDEX IF NOT EXISTS idx_carbon_region ON carbon_metrics(region_id)",
    "CREATE INDEX IF NOT EXISTS idx_targets_region ON targets(region_id)",
];

/// Tables in dependency order (parents before children)
pub const TABLES: &[&str] = &[
    "regions",
    "projects",
    "measurements",
    "carbon_metrics",
    "targets",
    "reports",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_REGIONS_TABLE,
        CREATE_PROJECTS_TABLE,
        CREATE_MEASUREMENTS_TABLE,
        CREATE_CARBON_METRICS_TABLE,
        CREATE_TARGETS_TABLE,
        CREATE_REPORTS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
