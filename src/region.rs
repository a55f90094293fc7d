//! Region types - administrative units of the registry
//!
//! Regions nest in three levels:
//! - `National`: the root of a hierarchy, never has a parent
//! - `State`: child of a national region
//! - `Local`: child of a state (or directly of a national) region

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Administrative level of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionLevel {
    National,
    State,
    Local,
}

impl RegionLevel {
    /// Get the string representation of the level
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionLevel::National => "national",
            RegionLevel::State => "state",
            RegionLevel::Local => "local",
        }
    }

    /// Get all levels, root first
    pub fn all() -> &'static [RegionLevel] {
        &[RegionLevel::National, RegionLevel::State, RegionLevel::Local]
    }

    /// Depth of the level in the hierarchy (national = 0)
    pub fn depth(&self) -> usize {
        match self {
            RegionLevel::National => 0,
            RegionLevel::State => 1,
            RegionLevel::Local => 2,
        }
    }

    /// Whether a region of this level may sit directly under `parent`
    pub fn can_nest_under(&self, parent: RegionLevel) -> bool {
        parent.depth() < self.depth()
    }
}

impl FromStr for RegionLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "national" | "country" => Ok(RegionLevel::National),
            "state" | "province" => Ok(RegionLevel::State),
            "local" | "city" | "municipal" => Ok(RegionLevel::Local),
            _ => Err(Error::InvalidValue(format!("Unknown region level: {}", s))),
        }
    }
}

impl std::fmt::Display for RegionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted region row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub level: RegionLevel,
    /// Parent region id; `None` only for national roots
    pub parent_id: Option<i64>,
    /// Optional geographic code (e.g. ISO 3166-2 style)
    pub geo_code: Option<String>,
}

impl Region {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// A region about to be inserted (id assigned by the store).
#[derive(Debug, Clone, PartialEq)]
pub struct NewRegion {
    pub name: String,
    pub level: RegionLevel,
    pub parent_id: Option<i64>,
    pub geo_code: Option<String>,
}

impl NewRegion {
    /// Create a national root region
    pub fn national(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: RegionLevel::National,
            parent_id: None,
            geo_code: None,
        }
    }

    /// Create a region nested under `parent_id`
    pub fn child(name: impl Into<String>, level: RegionLevel, parent_id: i64) -> Self {
        Self {
            name: name.into(),
            level,
            parent_id: Some(parent_id),
            geo_code: None,
        }
    }

    /// Check the level/parent pairing that does not need the store.
    ///
    /// National regions must be roots, every other level needs a parent.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::constraint("regions", "name", "name must not be empty"));
        }
        match (self.level, self.parent_id) {
            (RegionLevel::National, Some(_)) => Err(Error::InvalidHierarchy(format!(
                "national region '{}' cannot have a parent",
                self.name
            ))),
            (RegionLevel::National, None) => Ok(()),
            (level, None) => Err(Error::InvalidHierarchy(format!(
                "{} region '{}' requires a parent",
                level, self.name
            ))),
            (_, Some(_)) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_level_roundtrip() {
        for level in RegionLevel::all() {
            let parsed: RegionLevel = level.as_str().parse().unwrap();
            assert_eq!(*level, parsed);
        }
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("national".parse::<RegionLevel>().unwrap(), RegionLevel::National);
        assert_eq!("City".parse::<RegionLevel>().unwrap(), RegionLevel::Local);
        assert!("galaxy".parse::<RegionLevel>().is_err());
    }

    #[test]
    fn test_nesting_rules() {
        assert!(RegionLevel::State.can_nest_under(RegionLevel::National));
        assert!(RegionLevel::Local.can_nest_under(RegionLevel::State));
        assert!(RegionLevel::Local.can_nest_under(RegionLevel::National));
        assert!(!RegionLevel::State.can_nest_under(RegionLevel::Local));
        assert!(!RegionLevel::State.can_nest_under(RegionLevel::State));
    }

    #[test]
    fn test_new_region_validation() {
        assert!(NewRegion::national("CountryX").validate().is_ok());
        assert!(NewRegion::child("StateY", RegionLevel::State, 1).validate().is_ok());

        let orphan = NewRegion {
            parent_id: None,
            ..NewRegion::child("Lost", RegionLevel::Local, 1)
        };
        assert!(matches!(orphan.validate(), Err(Error::InvalidHierarchy(_))));

        let nested_root = NewRegion {
            parent_id: Some(4),
            ..NewRegion::national("Nested")
        };
        assert!(matches!(nested_root.validate(), Err(Error::InvalidHierarchy(_))));
    }
}
