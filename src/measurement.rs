//! Measurement types - timestamped generation readings

use crate::{Error, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A generation reading for a project.
///
/// Timestamps are not unique per project; a project's readings form a
/// time series ordered by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: i64,
    pub project_id: i64,
    pub timestamp: NaiveDateTime,
    /// Energy generated in MWh, never negative
    pub generation_mwh: f64,
}

/// A measurement about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMeasurement {
    pub project_id: i64,
    pub timestamp: NaiveDateTime,
    pub generation_mwh: f64,
}

impl NewMeasurement {
    pub fn new(project_id: i64, timestamp: NaiveDateTime, generation_mwh: f64) -> Self {
        Self {
            project_id,
            timestamp,
            generation_mwh,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.generation_mwh.is_finite() || self.generation_mwh < 0.0 {
            return Err(Error::constraint(
                "measurements",
                "generation_mwh",
                format!("generation must be a non-negative number, got {}", self.generation_mwh),
            ));
        }
        Ok(())
    }
}

/// Sum of generation over a set of readings
pub fn total_generation(measurements: &[Measurement]) -> f64 {
    measurements.iter().map(|m| m.generation_mwh).sum()
}
