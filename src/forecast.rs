//! Simple generation estimators
//!
//! - PV yield per installed kW from daily irradiance
//! - Logistic adoption curve for renewable users and their generation

use crate::{Error, Result};
use serde::Serialize;

/// Panel conversion efficiency
pub const PANEL_EFFICIENCY: f64 = 0.18;
/// Panel area per installed kW, in m²
pub const AREA_PER_KW: f64 = 6.0;
/// System losses (inverter, soiling, temperature)
pub const PERFORMANCE_RATIO: f64 = 0.75;

/// Estimated kWh per installed kW for one day of irradiance (Wh/m²)
pub fn pv_yield_kwh_per_kw(irradiance_wh_m2: f64) -> f64 {
    (irradiance_wh_m2 / 1000.0) * (PANEL_EFFICIENCY * AREA_PER_KW) * PERFORMANCE_RATIO
}

/// Aggregate PV estimate over a sequence of daily irradiance values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PvEstimate {
    /// Per-day yield; `None` where the irradiance reading was missing
    pub daily_kwh_per_kw: Vec<Option<f64>>,
    pub total_kwh_per_kw: Option<f64>,
    pub average_kwh_per_kw_per_day: Option<f64>,
}

/// Estimate PV yield for each day, skipping missing readings in the totals
pub fn estimate_pv(daily_irradiance: &[Option<f64>]) -> PvEstimate {
    let daily: Vec<Option<f64>> = daily_irradiance
        .iter()
        .map(|irr| irr.filter(|v| v.is_finite()).map(pv_yield_kwh_per_kw))
        .collect();

    let known: Vec<f64> = daily.iter().flatten().copied().collect();
    let (total, average) = if known.is_empty() {
        (None, None)
    } else {
        let total: f64 = known.iter().sum();
        (Some(total), Some(total / known.len() as f64))
    };

    PvEstimate {
        daily_kwh_per_kw: daily,
        total_kwh_per_kw: total,
        average_kwh_per_kw_per_day: average,
    }
}

/// Parameters of the logistic adoption model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdoptionModel {
    /// Total potential adopters (carrying capacity)
    pub population: f64,
    /// Adopters at t = 0
    pub initial_adopters: f64,
    /// Annual growth rate
    pub growth_rate: f64,
    /// kWh generated per adopter per year
    pub generation_per_adopter_kwh: f64,
}

impl Default for AdoptionModel {
    fn default() -> Self {
        Self {
            population: 1_000_000.0,
            initial_adopters: 50_000.0,
            growth_rate: 0.22,
            generation_per_adopter_kwh: 5000.0,
        }
    }
}

/// One sample of the adoption curve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdoptionPoint {
    pub year: f64,
    pub adopters: f64,
    pub generation_kwh: f64,
}

impl AdoptionModel {
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_adopters > 0.0 && self.initial_adopters <= self.population) {
            return Err(Error::InvalidValue(format!(
                "initial adopters must be in (0, {}], got {}",
                self.population, self.initial_adopters
            )));
        }
        if !self.growth_rate.is_finite() || !self.generation_per_adopter_kwh.is_finite() {
            return Err(Error::InvalidValue("growth rate and generation must be finite".to_string()));
        }
        Ok(())
    }

    /// Adopters after `t` years
    pub fn adopters_at(&self, t: f64) -> f64 {
        let k = self.population;
        let n0 = self.initial_adopters;
        k / (1.0 + ((k - n0) / n0) * (-self.growth_rate * t).exp())
    }

    /// Sample the curve every `step_years` from 0 to `years` inclusive
    pub fn project(&self, years: u32, step_years: u32) -> Result<Vec<AdoptionPoint>> {
        self.validate()?;
        if step_years == 0 {
            return Err(Error::InvalidValue("step must be at least one year".to_string()));
        }
        Ok((0..=years)
            .step_by(step_years as usize)
            .map(|y| {
                let t = f64::from(y);
                let adopters = self.adopters_at(t);
                AdoptionPoint {
                    year: t,
                    adopters,
                    generation_kwh: adopters * self.generation_per_adopter_kwh,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pv_yield() {
        // 5 kWh/m² day → 5 * 1.08 * 0.75
        assert!((pv_yield_kwh_per_kw(5000.0) - 4.05).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_skips_missing_days() {
        let est = estimate_pv(&[Some(5000.0), None, Some(3000.0)]);
        assert_eq!(est.daily_kwh_per_kw.len(), 3);
        assert!(est.daily_kwh_per_kw[1].is_none());
        let total = est.total_kwh_per_kw.unwrap();
        assert!((total - (4.05 + 2.43)).abs() < 1e-9);
        assert!((est.average_kwh_per_kw_per_day.unwrap() - total / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_without_data() {
        let est = estimate_pv(&[None]);
        assert!(est.total_kwh_per_kw.is_none());
    }

    #[test]
    fn test_adoption_curve() {
        let model = AdoptionModel::default();
        assert!((model.adopters_at(0.0) - 50_000.0).abs() < 1e-6);

        let points = model.project(20, 5).unwrap();
        assert_eq!(points.len(), 5);
        assert!(points.windows(2).all(|w| w[1].adopters > w[0].adopters));
        assert!(points[4].adopters < model.population);
    }

    #[test]
    fn test_adoption_rejects_bad_parameters() {
        let model = AdoptionModel {
            initial_adopters: 0.0,
            ..AdoptionModel::default()
        };
        assert!(model.project(20, 5).is_err());
        assert!(AdoptionModel::default().project(20, 0).is_err());
    }
}
