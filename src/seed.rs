//! Sample dataset used to bootstrap a fresh store
//!
//! Rows reference each other by name; ids are resolved while inserting, so
//! a dataset can be written before any row exists. The bundled sample is:
//!
//! ```text
//! CountryX (national, EX)
//! ├── StateY (state, EX-SY)        SolarFarm1            solar  50.0 MW  active
//! │   └── CityZ (local, EX-SY-CZ)  CityZ Rooftop Solar   solar  12.5 MW  active
//! └── StateW (state, EX-SW)        StateW Wind Farm      wind  100.0 MW  active
//!     └── TownV (local, EX-SW-TV)  TownV Run-of-River    hydro  30.0 MW  planned
//! ```
//!
//! plus two hourly measurements per project on 2025-11-01, three carbon
//! metrics, six targets (one per region, two for CountryX) and one report.

use std::collections::HashMap;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use crate::carbon::{NewCarbonMetric, AVOIDED_EMISSIONS};
use crate::measurement::NewMeasurement;
use crate::project::{NewProject, ProjectStatus, Technology};
use crate::region::{NewRegion, RegionLevel};
use crate::report::NewReport;
use crate::storage::sqlite::{self as rows, TableCounts};
use crate::target::{NewTarget, TargetType};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SeedRegion {
    pub name: String,
    pub level: RegionLevel,
    /// Name of the parent region, which must appear earlier in the dataset
    pub parent: Option<String>,
    pub geo_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedProject {
    pub name: String,
    pub region: String,
    pub technology: Technology,
    pub capacity_mw: f64,
    pub status: ProjectStatus,
    pub commissioning_date: Option<NaiveDate>,
    pub owner: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedMeasurement {
    pub project: String,
    pub timestamp: NaiveDateTime,
    pub generation_mwh: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedCarbonMetric {
    pub project: Option<String>,
    pub region: Option<String>,
    pub metric_type: String,
    pub value: f64,
    pub period: Option<(NaiveDate, NaiveDate)>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedTarget {
    pub region: String,
    pub year: i32,
    pub target_type: TargetType,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    pub reporter: Option<String>,
    pub region: Option<String>,
    pub created_at: NaiveDateTime,
    pub payload: Option<serde_json::Value>,
}

/// A complete, name-linked dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedData {
    pub regions: Vec<SeedRegion>,
    pub projects: Vec<SeedProject>,
    pub measurements: Vec<SeedMeasurement>,
    pub carbon_metrics: Vec<SeedCarbonMetric>,
    pub targets: Vec<SeedTarget>,
    pub reports: Vec<SeedReport>,
}

fn date(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::InvalidValue(format!("invalid date {}-{}-{}", year, month, day)))
}

fn at(year: i32, month: u32, day: u32, hour: u32) -> Result<NaiveDateTime> {
    date(year, month, day)?
        .and_hms_opt(hour, 0, 0)
        .ok_or_else(|| Error::InvalidValue(format!("invalid hour {}", hour)))
}

fn region(name: &str, level: RegionLevel, parent: Option<&str>, geo_code: &str) -> SeedRegion {
    SeedRegion {
        name: name.to_string(),
        level,
        parent: parent.map(str::to_string),
        geo_code: Some(geo_code.to_string()),
    }
}

fn target(region: &str, year: i32, target_type: TargetType, value: f64) -> SeedTarget {
    SeedTarget {
        region: region.to_string(),
        year,
        target_type,
        value,
    }
}

impl SeedData {
    /// The bundled sample dataset (see module docs)
    pub fn sample() -> Result<Self> {
        let regions = vec![
            region("CountryX", RegionLevel::National, None, "EX"),
            region("StateY", RegionLevel::State, Some("CountryX"), "EX-SY"),
            region("CityZ", RegionLevel::Local, Some("StateY"), "EX-SY-CZ"),
            region("StateW", RegionLevel::State, Some("CountryX"), "EX-SW"),
            region("TownV", RegionLevel::Local, Some("StateW"), "EX-SW-TV"),
        ];

        let projects = vec![
            SeedProject {
                name: "SolarFarm1".to_string(),
                region: "StateY".to_string(),
                technology: Technology::Solar,
                capacity_mw: 50.0,
                status: ProjectStatus::Active,
                commissioning_date: Some(date(2023, 6, 1)?),
                owner: Some("GreenPower Co".to_string()),
                latitude: Some(12.34),
                longitude: Some(56.78),
            },
            SeedProject {
                name: "CityZ Rooftop Solar".to_string(),
                region: "CityZ".to_string(),
                technology: Technology::Solar,
                capacity_mw: 12.5,
                status: ProjectStatus::Active,
                commissioning_date: Some(date(2024, 3, 15)?),
                owner: Some("CityZ Council".to_string()),
                latitude: Some(12.41),
                longitude: Some(56.70),
            },
            SeedProject {
                name: "TownV Run-of-River".to_string(),
                region: "TownV".to_string(),
                technology: Technology::Hydro,
                capacity_mw: 30.0,
                status: ProjectStatus::Planned,
                commissioning_date: None,
                owner: Some("RiverWorks".to_string()),
                latitude: None,
                longitude: None,
            },
            SeedProject {
                name: "StateW Wind Farm".to_string(),
                region: "StateW".to_string(),
                technology: Technology::Wind,
                capacity_mw: 100.0,
                status: ProjectStatus::Active,
                commissioning_date: Some(date(2022, 9, 1)?),
                owner: Some("WindWorks".to_string()),
                latitude: Some(13.02),
                longitude: Some(57.15),
            },
        ];

        let readings: [(&str, f64, f64); 4] = [
            ("SolarFarm1", 50.2, 48.8),
            ("CityZ Rooftop Solar", 11.9, 11.4),
            ("TownV Run-of-River", 0.0, 0.0),
            ("StateW Wind Farm", 72.5, 80.1),
        ];
        let mut measurements = Vec::with_capacity(readings.len() * 2);
        for (project, noon, one_pm) in readings {
            for (hour, generation_mwh) in [(12, noon), (13, one_pm)] {
                measurements.push(SeedMeasurement {
                    project: project.to_string(),
                    timestamp: at(2025, 11, 1, hour)?,
                    generation_mwh,
                });
            }
        }

        let year_2025 = (date(2025, 1, 1)?, date(2025, 12, 31)?);
        let carbon_metrics = vec![
            SeedCarbonMetric {
                project: Some("SolarFarm1".to_string()),
                region: Some("StateY".to_string()),
                metric_type: AVOIDED_EMISSIONS.to_string(),
                value: 1200.5,
                period: Some(year_2025),
                source: Some("estimation".to_string()),
            },
            SeedCarbonMetric {
                project: Some("CityZ Rooftop Solar".to_string()),
                region: None,
                metric_type: AVOIDED_EMISSIONS.to_string(),
                value: 310.0,
                period: Some(year_2025),
                source: Some("estimation".to_string()),
            },
            SeedCarbonMetric {
                project: None,
                region: Some("CountryX".to_string()),
                metric_type: "grid_intensity_kg_per_kwh".to_string(),
                value: 0.85,
                period: Some(year_2025),
                source: Some("national grid operator".to_string()),
            },
        ];

        let targets = vec![
            target("CountryX", 2030, TargetType::Capacity, 5000.0),
            target("CountryX", 2030, TargetType::Share, 45.0),
            target("StateY", 2028, TargetType::Capacity, 250.0),
            target("CityZ", 2027, TargetType::Capacity, 25.0),
            target("StateW", 2028, TargetType::Share, 60.0),
            target("TownV", 2027, TargetType::Capacity, 40.0),
        ];

        let reports = vec![SeedReport {
            reporter: Some("Ministry of Energy".to_string()),
            region: Some("CountryX".to_string()),
            created_at: at(2025, 11, 2, 9)?,
            payload: Some(serde_json::json!({ "notes": "Quarterly update" })),
        }];

        Ok(Self {
            regions,
            projects,
            measurements,
            carbon_metrics,
            targets,
            reports,
        })
    }

    /// Row counts this dataset produces
    pub fn counts(&self) -> TableCounts {
        TableCounts {
            regions: self.regions.len(),
            projects: self.projects.len(),
            measurements: self.measurements.len(),
            carbon_metrics: self.carbon_metrics.len(),
            targets: self.targets.len(),
            reports: self.reports.len(),
        }
    }
}

fn resolve(ids: &HashMap<String, i64>, name: &str, table: &str, column: &str, kind: &str) -> Result<i64> {
    ids.get(name)
        .copied()
        .ok_or_else(|| Error::constraint(table, column, format!("unknown {} '{}'", kind, name)))
}

fn remember(ids: &mut HashMap<String, i64>, name: &str, id: i64, table: &str) -> Result<()> {
    if ids.insert(name.to_string(), id).is_some() {
        return Err(Error::constraint(table, "name", format!("duplicate name '{}' in dataset", name)));
    }
    Ok(())
}

/// Insert every row of `data` through `conn`.
///
/// Callers wrap this in a transaction; an error leaves earlier rows of the
/// dataset to be rolled back with it.
pub(crate) fn apply(conn: &Connection, data: &SeedData) -> Result<TableCounts> {
    let mut region_ids: HashMap<String, i64> = HashMap::new();
    let mut project_ids: HashMap<String, i64> = HashMap::new();

    for r in &data.regions {
        let parent_id = match &r.parent {
            Some(parent) => Some(resolve(&region_ids, parent, "regions", "parent_id", "region")?),
            None => None,
        };
        let id = rows::insert_region(
            conn,
            &NewRegion {
                name: r.name.clone(),
                level: r.level,
                parent_id,
                geo_code: r.geo_code.clone(),
            },
        )?;
        remember(&mut region_ids, &r.name, id, "regions")?;
    }

    for p in &data.projects {
        let region_id = resolve(&region_ids, &p.region, "projects", "region_id", "region")?;
        let id = rows::insert_project(
            conn,
            &NewProject {
                region_id,
                name: p.name.clone(),
                technology: p.technology,
                capacity_mw: p.capacity_mw,
                status: p.status,
                commissioning_date: p.commissioning_date,
                owner: p.owner.clone(),
                latitude: p.latitude,
                longitude: p.longitude,
            },
        )?;
        remember(&mut project_ids, &p.name, id, "projects")?;
    }

    for m in &data.measurements {
        let project_id = resolve(&project_ids, &m.project, "measurements", "project_id", "project")?;
        rows::insert_measurement(conn, &NewMeasurement::new(project_id, m.timestamp, m.generation_mwh))?;
    }

    for c in &data.carbon_metrics {
        let project_id = match &c.project {
            Some(name) => Some(resolve(&project_ids, name, "carbon_metrics", "project_id", "project")?),
            None => None,
        };
        let region_id = match &c.region {
            Some(name) => Some(resolve(&region_ids, name, "carbon_metrics", "region_id", "region")?),
            None => None,
        };
        rows::insert_carbon_metric(
            conn,
            &NewCarbonMetric {
                project_id,
                region_id,
                metric_type: c.metric_type.clone(),
                value: c.value,
                period_start: c.period.map(|(start, _)| start),
                period_end: c.period.map(|(_, end)| end),
                source: c.source.clone(),
            },
        )?;
    }

    for t in &data.targets {
        let region_id = resolve(&region_ids, &t.region, "targets", "region_id", "region")?;
        rows::insert_target(conn, &NewTarget::new(region_id, t.year, t.target_type, t.value))?;
    }

    for r in &data.reports {
        let region_id = match &r.region {
            Some(name) => Some(resolve(&region_ids, name, "reports", "region_id", "region")?),
            None => None,
        };
        rows::insert_report(
            conn,
            &NewReport {
                reporter: r.reporter.clone(),
                region_id,
                created_at: r.created_at,
                payload: r.payload.clone(),
            },
        )?;
    }

    Ok(data.counts())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sample_is_well_formed() {
        let data = SeedData::sample().unwrap();
        let counts = data.counts();
        assert_eq!(counts.regions, 5);
        assert_eq!(counts.projects, 4);
        assert_eq!(counts.measurements, 8);
        assert_eq!(counts.carbon_metrics, 3);
        assert_eq!(counts.targets, 6);
        assert_eq!(counts.reports, 1);
    }

    #[test]
    fn test_sample_covers_every_relationship() {
        let data = SeedData::sample().unwrap();

        // every region has a target
        let targeted: HashSet<&str> = data.targets.iter().map(|t| t.region.as_str()).collect();
        assert!(data.regions.iter().all(|r| targeted.contains(r.name.as_str())));

        // every leaf region has a project
        let parents: HashSet<&str> = data.regions.iter().filter_map(|r| r.parent.as_deref()).collect();
        let with_projects: HashSet<&str> = data.projects.iter().map(|p| p.region.as_str()).collect();
        for leaf in data.regions.iter().filter(|r| !parents.contains(r.name.as_str())) {
            assert!(with_projects.contains(leaf.name.as_str()), "{} has no project", leaf.name);
        }

        // every project has a measurement
        let measured: HashSet<&str> = data.measurements.iter().map(|m| m.project.as_str()).collect();
        assert!(data.projects.iter().all(|p| measured.contains(p.name.as_str())));

        assert!(data.measurements.iter().all(|m| m.generation_mwh >= 0.0));
    }

    #[test]
    fn test_sample_is_deterministic() {
        assert_eq!(SeedData::sample().unwrap(), SeedData::sample().unwrap());
    }
}
