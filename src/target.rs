//! Target types - planned capacity or renewable-share goals for a region

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a target measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    /// Installed capacity in MW
    Capacity,
    /// Renewable share of consumption in percent
    Share,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Capacity => "capacity",
            TargetType::Share => "share",
        }
    }

    pub fn all() -> &'static [TargetType] {
        &[TargetType::Capacity, TargetType::Share]
    }

    pub fn unit(&self) -> &'static str {
        match self {
            TargetType::Capacity => "MW",
            TargetType::Share => "%",
        }
    }
}

impl FromStr for TargetType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "capacity" | "capacity_mw" => Ok(TargetType::Capacity),
            "share" | "share_pct" => Ok(TargetType::Share),
            _ => Err(Error::InvalidValue(format!("Unknown target type: {}", s))),
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted target row. `(region_id, year, target_type)` is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: i64,
    pub region_id: i64,
    pub year: i32,
    pub target_type: TargetType,
    pub value: f64,
    pub status: String,
}

/// A target about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTarget {
    pub region_id: i64,
    pub year: i32,
    pub target_type: TargetType,
    pub value: f64,
    pub status: String,
}

impl NewTarget {
    pub fn new(region_id: i64, year: i32, target_type: TargetType, value: f64) -> Self {
        Self {
            region_id,
            year,
            target_type,
            value,
            status: "active".to_string(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.value.is_finite() || self.value < 0.0 {
            return Err(Error::constraint("targets", "value", format!("target must be non-negative, got {}", self.value)));
        }
        if self.target_type == TargetType::Share && self.value > 100.0 {
            return Err(Error::constraint("targets", "value", format!("share target {}% exceeds 100%", self.value)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_type_roundtrip() {
        for kind in TargetType::all() {
            let parsed: TargetType = kind.as_str().parse().unwrap();
            assert_eq!(*kind, parsed);
        }
    }

    #[test]
    fn test_target_type_aliases() {
        assert_eq!("capacity_mw".parse::<TargetType>().unwrap(), TargetType::Capacity);
        assert_eq!("share_pct".parse::<TargetType>().unwrap(), TargetType::Share);
    }

    #[test]
    fn test_share_above_hundred_rejected() {
        assert!(NewTarget::new(1, 2030, TargetType::Share, 120.0).validate().is_err());
        assert!(NewTarget::new(1, 2030, TargetType::Capacity, 5000.0).validate().is_ok());
    }
}
