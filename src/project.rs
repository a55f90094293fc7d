//! Project types - renewable installations tied to a region

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Generation technology of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Technology {
    Solar,
    Wind,
    Hydro,
    /// Anything else (geothermal, biomass, tidal, ...)
    Other,
}

impl Technology {
    /// Get the string representation of the technology
    pub fn as_str(&self) -> &'static str {
        match self {
            Technology::Solar => "solar",
            Technology::Wind => "wind",
            Technology::Hydro => "hydro",
            Technology::Other => "other",
        }
    }

    pub fn all() -> &'static [Technology] {
        &[Technology::Solar, Technology::Wind, Technology::Hydro, Technology::Other]
    }
}

impl FromStr for Technology {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "solar" | "pv" => Ok(Technology::Solar),
            "wind" => Ok(Technology::Wind),
            "hydro" | "hydropower" => Ok(Technology::Hydro),
            "other" => Ok(Technology::Other),
            _ => Err(Error::InvalidValue(format!("Unknown technology: {}", s))),
        }
    }
}

impl std::fmt::Display for Technology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Planned,
    Active,
    Decommissioned,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Planned => "planned",
            ProjectStatus::Active => "active",
            ProjectStatus::Decommissioned => "decommissioned",
        }
    }

    pub fn all() -> &'static [ProjectStatus] {
        &[ProjectStatus::Planned, ProjectStatus::Active, ProjectStatus::Decommissioned]
    }
}

impl FromStr for ProjectStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "planned" | "under_construction" => Ok(ProjectStatus::Planned),
            "active" | "operational" => Ok(ProjectStatus::Active),
            "decommissioned" | "retired" => Ok(ProjectStatus::Decommissioned),
            _ => Err(Error::InvalidValue(format!("Unknown project status: {}", s))),
        }
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted project row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub region_id: i64,
    pub name: String,
    pub technology: Technology,
    /// Nameplate capacity in MW
    pub capacity_mw: f64,
    pub status: ProjectStatus,
    pub commissioning_date: Option<NaiveDate>,
    pub owner: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A project joined with its owning region's name, for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectListing {
    #[serde(flatten)]
    pub project: Project,
    pub region_name: String,
}

/// A project about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub region_id: i64,
    pub name: String,
    pub technology: Technology,
    pub capacity_mw: f64,
    pub status: ProjectStatus,
    pub commissioning_date: Option<NaiveDate>,
    pub owner: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl NewProject {
    pub fn new(
        region_id: i64,
        name: impl Into<String>,
        technology: Technology,
        capacity_mw: f64,
        status: ProjectStatus,
    ) -> Self {
        Self {
            region_id,
            name: name.into(),
            technology,
            capacity_mw,
            status,
            commissioning_date: None,
            owner: None,
            latitude: None,
            longitude: None,
        }
    }

    /// Validate field ranges before touching the store
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::constraint("projects", "name", "name must not be empty"));
        }
        if !self.capacity_mw.is_finite() || self.capacity_mw < 0.0 {
            return Err(Error::constraint(
                "projects",
                "capacity_mw",
                format!("capacity must be a non-negative number, got {}", self.capacity_mw),
            ));
        }
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(Error::constraint("projects", "latitude", format!("{} is out of range", lat)));
            }
        }
        if let Some(lon) = self.longitude {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(Error::constraint("projects", "longitude", format!("{} is out of range", lon)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_technology_roundtrip() {
        for technology in Technology::all() {
            let parsed: Technology = technology.as_str().parse().unwrap();
            assert_eq!(*technology, parsed);
        }
    }

    #[test]
    fn test_project_status_roundtrip() {
        for status in ProjectStatus::all() {
            let parsed: ProjectStatus = status.as_str().parse().unwrap();
            assert_eq!(*status, parsed);
        }
    }

    #[test]
    fn test_technology_aliases() {
        assert_eq!("PV".parse::<Technology>().unwrap(), Technology::Solar);
        assert_eq!("hydropower".parse::<Technology>().unwrap(), Technology::Hydro);
        assert!("coal".parse::<Technology>().is_err());
    }

    #[test]
    fn test_status_accepts_legacy_names() {
        assert_eq!("operational".parse::<ProjectStatus>().unwrap(), ProjectStatus::Active);
        assert_eq!("under_construction".parse::<ProjectStatus>().unwrap(), ProjectStatus::Planned);
    }

    #[test]
    fn test_validate_rejects_negative_capacity() {
        let project = NewProject::new(1, "Broken", Technology::Wind, -1.0, ProjectStatus::Planned);
        match project.validate() {
            Err(Error::ConstraintViolation { table, column, .. }) => {
                assert_eq!(table, "projects");
                assert_eq!(column, "capacity_mw");
            }
            other => panic!("expected constraint violation, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_bad_coordinates() {
        let mut project = NewProject::new(1, "Offshore", Technology::Wind, 10.0, ProjectStatus::Active);
        project.latitude = Some(91.0);
        assert!(project.validate().is_err());
    }
}
