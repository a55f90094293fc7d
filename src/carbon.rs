//! Carbon metrics and the electricity emission calculator
//!
//! A carbon metric is a KPI attached to a project, a region, or both.
//! The calculator converts consumed electricity into grid and renewable
//! emissions and costs.

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Metric type used for avoided emissions in tonnes of CO₂
pub const AVOIDED_EMISSIONS: &str = "avoided_emissions_tCO2";

/// kg CO₂ emitted per kWh of average grid electricity
pub const GRID_EMISSION_FACTOR: f64 = 0.85;
/// kg CO₂ emitted per kWh of solar/wind electricity
pub const RENEWABLE_EMISSION_FACTOR: f64 = 0.05;
/// Grid tariff per kWh
pub const GRID_COST_PER_KWH: f64 = 7.0;
/// Effective renewable cost per kWh after setup savings
pub const RENEWABLE_COST_PER_KWH: f64 = 2.5;

/// A persisted carbon metric row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarbonMetric {
    pub id: i64,
    pub project_id: Option<i64>,
    pub region_id: Option<i64>,
    pub metric_type: String,
    pub value: f64,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub source: Option<String>,
}

/// What a metric is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSubject {
    Project(i64),
    Region(i64),
    /// Project metric also attributed to a region
    Both { project_id: i64, region_id: i64 },
}

impl CarbonMetric {
    /// The subject this metric is linked to.
    ///
    /// Rows written through the store always have at least one reference.
    pub fn subject(&self) -> Option<MetricSubject> {
        match (self.project_id, self.region_id) {
            (Some(project_id), Some(region_id)) => Some(MetricSubject::Both { project_id, region_id }),
            (Some(p), None) => Some(MetricSubject::Project(p)),
            (None, Some(r)) => Some(MetricSubject::Region(r)),
            (None, None) => None,
        }
    }
}

/// A carbon metric about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCarbonMetric {
    pub project_id: Option<i64>,
    pub region_id: Option<i64>,
    pub metric_type: String,
    pub value: f64,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub source: Option<String>,
}

impl NewCarbonMetric {
    pub fn for_project(project_id: i64, metric_type: impl Into<String>, value: f64) -> Self {
        Self {
            project_id: Some(project_id),
            region_id: None,
            metric_type: metric_type.into(),
            value,
            period_start: None,
            period_end: None,
            source: None,
        }
    }

    pub fn for_region(region_id: i64, metric_type: impl Into<String>, value: f64) -> Self {
        Self {
            project_id: None,
            region_id: Some(region_id),
            metric_type: metric_type.into(),
            value,
            period_start: None,
            period_end: None,
            source: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.project_id.is_none() && self.region_id.is_none() {
            return Err(Error::constraint(
                "carbon_metrics",
                "project_id",
                "a carbon metric must reference a project or a region",
            ));
        }
        if self.metric_type.trim().is_empty() {
            return Err(Error::constraint("carbon_metrics", "metric_type", "metric type must not be empty"));
        }
        if !self.value.is_finite() {
            return Err(Error::constraint("carbon_metrics", "value", "value must be finite"));
        }
        if let (Some(start), Some(end)) = (self.period_start, self.period_end) {
            if end < start {
                return Err(Error::constraint(
                    "carbon_metrics",
                    "period_end",
                    format!("period ends ({}) before it starts ({})", end, start),
                ));
            }
        }
        Ok(())
    }
}

/// Rough footprint classification of a consumption figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FootprintBand {
    Low,
    Moderate,
    High,
}

impl FootprintBand {
    pub fn from_kg(co2_kg: f64) -> Self {
        if co2_kg < 50.0 {
            FootprintBand::Low
        } else if co2_kg < 200.0 {
            FootprintBand::Moderate
        } else {
            FootprintBand::High
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            FootprintBand::Low => "Low carbon footprint - great job!",
            FootprintBand::Moderate => "Moderate usage - consider some energy-saving habits.",
            FootprintBand::High => "High usage - try using renewable energy sources!",
        }
    }
}

/// Emissions and cost of a single consumption period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionEstimate {
    pub label: String,
    pub units_kwh: f64,
    pub grid_co2_kg: f64,
    pub renewable_co2_kg: f64,
    pub grid_cost: f64,
    pub renewable_cost: f64,
}

impl EmissionEstimate {
    pub fn for_units(label: impl Into<String>, units_kwh: f64) -> Result<Self> {
        if !units_kwh.is_finite() || units_kwh < 0.0 {
            return Err(Error::InvalidValue(format!("units cannot be negative: {}", units_kwh)));
        }
        Ok(Self {
            label: label.into(),
            units_kwh,
            grid_co2_kg: units_kwh * GRID_EMISSION_FACTOR,
            renewable_co2_kg: units_kwh * RENEWABLE_EMISSION_FACTOR,
            grid_cost: units_kwh * GRID_COST_PER_KWH,
            renewable_cost: units_kwh * RENEWABLE_COST_PER_KWH,
        })
    }

    pub fn band(&self) -> FootprintBand {
        FootprintBand::from_kg(self.grid_co2_kg)
    }
}

/// Totals across several consumption periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavingsSummary {
    pub periods: Vec<EmissionEstimate>,
    pub co2_saving_kg: f64,
    pub cost_saving: f64,
}

/// Compute what switching each period to renewable supply would save
pub fn savings<I, S>(periods: I) -> Result<SavingsSummary>
where
    I: IntoIterator<Item = (S, f64)>,
    S: Into<String>,
{
    let periods = periods
        .into_iter()
        .map(|(label, units)| EmissionEstimate::for_units(label, units))
        .collect::<Result<Vec<_>>>()?;

    let co2_saving_kg = periods.iter().map(|p| p.grid_co2_kg - p.renewable_co2_kg).sum();
    let cost_saving = periods.iter().map(|p| p.grid_cost - p.renewable_cost).sum();

    Ok(SavingsSummary {
        periods,
        co2_saving_kg,
        cost_saving,
    })
}
