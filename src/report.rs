//! Reports - stored report payloads and derived per-region aggregates

use std::collections::{HashMap, HashSet};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use crate::carbon::{CarbonMetric, AVOIDED_EMISSIONS};
use crate::hierarchy::RegionTree;
use crate::measurement::Measurement;
use crate::project::{Project, ProjectStatus};
use crate::region::RegionLevel;
use crate::target::{Target, TargetType};

/// A persisted report row. `payload` holds free-form JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: i64,
    pub reporter: Option<String>,
    pub region_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub payload: Option<serde_json::Value>,
}

/// A report about to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub reporter: Option<String>,
    pub region_id: Option<i64>,
    pub created_at: NaiveDateTime,
    pub payload: Option<serde_json::Value>,
}

/// Progress of a region towards one of its targets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetProgress {
    pub year: i32,
    pub target_type: TargetType,
    pub value: f64,
    /// Current figure for capacity targets; share is not derivable from the registry
    pub achieved: Option<f64>,
    pub progress_pct: Option<f64>,
}

/// Aggregate figures for a region and everything below it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionReport {
    pub region_id: i64,
    pub region_name: String,
    pub level: RegionLevel,
    pub project_count: usize,
    pub active_capacity_mw: f64,
    pub total_generation_mwh: f64,
    pub avoided_emissions_t: f64,
    pub targets: Vec<TargetProgress>,
}

/// Build one report per region, in hierarchy order
pub fn region_reports(
    tree: &RegionTree,
    projects: &[Project],
    measurements: &[Measurement],
    metrics: &[CarbonMetric],
    targets: &[Target],
) -> Vec<RegionReport> {
    let mut generation_by_project: HashMap<i64, f64> = HashMap::new();
    for m in measurements {
        *generation_by_project.entry(m.project_id).or_default() += m.generation_mwh;
    }

    let ordered: Vec<i64> = tree
        .roots()
        .iter()
        .flat_map(|root| tree.subtree_ids(root.id))
        .collect();

    ordered
        .into_iter()
        .filter_map(|id| tree.get(id))
        .map(|region| {
            let scope: HashSet<i64> = tree.subtree_ids(region.id).into_iter().collect();
            let in_scope: Vec<&Project> = projects.iter().filter(|p| scope.contains(&p.region_id)).collect();
            let project_ids: HashSet<i64> = in_scope.iter().map(|p| p.id).collect();

            let active_capacity_mw: f64 = in_scope
                .iter()
                .filter(|p| p.status == ProjectStatus::Active)
                .map(|p| p.capacity_mw)
                .sum();

            let total_generation_mwh: f64 = project_ids
                .iter()
                .filter_map(|id| generation_by_project.get(id))
                .sum();

            let avoided_emissions_t: f64 = metrics
                .iter()
                .filter(|m| m.metric_type == AVOIDED_EMISSIONS)
                .filter(|m| {
                    m.project_id.is_some_and(|p| project_ids.contains(&p))
                        || m.region_id.is_some_and(|r| scope.contains(&r))
                })
                .map(|m| m.value)
                .sum();

            let targets: Vec<TargetProgress> = targets
                .iter()
                .filter(|t| t.region_id == region.id)
                .map(|t| {
                    let achieved = match t.target_type {
                        TargetType::Capacity => Some(active_capacity_mw),
                        TargetType::Share => None,
                    };
                    let progress_pct = achieved
                        .filter(|_| t.value > 0.0)
                        .map(|a| a / t.value * 100.0);
                    TargetProgress {
                        year: t.year,
                        target_type: t.target_type,
                        value: t.value,
                        achieved,
                        progress_pct,
                    }
                })
                .collect();

            RegionReport {
                region_id: region.id,
                region_name: region.name.clone(),
                level: region.level,
                project_count: in_scope.len(),
                active_capacity_mw,
                total_generation_mwh,
                avoided_emissions_t,
                targets,
            }
        })
        .collect()
}
