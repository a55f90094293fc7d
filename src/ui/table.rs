use std::collections::HashMap;
use tabled::{settings::Style, Table, Tabled};
use crate::carbon::CarbonMetric;
use crate::measurement::Measurement;
use crate::project::ProjectListing;
use crate::region::Region;
use crate::report::RegionReport;
use crate::storage::TableCounts;
use crate::target::Target;

fn render<T: Tabled>(rows: &[T]) -> String {
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub metric: String,
    #[tabled(rename = "Rows")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        render(&self.rows)
    }
}

pub fn stats_table(counts: &TableCounts) -> String {
    let mut builder = TableBuilder::new();
    for (table, count) in counts.rows() {
        builder.add_row(table, &count.to_string());
    }
    builder.build()
}

#[derive(Tabled)]
struct RegionRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Parent")]
    parent: String,
    #[tabled(rename = "Geo")]
    geo_code: String,
}

pub fn regions_table(regions: &[Region]) -> String {
    let names: HashMap<i64, &str> = regions.iter().map(|r| (r.id, r.name.as_str())).collect();
    let rows: Vec<RegionRow> = regions
        .iter()
        .map(|r| RegionRow {
            id: r.id,
            name: r.name.clone(),
            level: r.level.to_string(),
            parent: or_dash(r.parent_id.map(|p| names.get(&p).copied().unwrap_or("?"))),
            geo_code: or_dash(r.geo_code.as_deref()),
        })
        .collect();
    render(&rows)
}

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Project")]
    name: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Technology")]
    technology: String,
    #[tabled(rename = "Capacity (MW)")]
    capacity: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn projects_table(projects: &[ProjectListing]) -> String {
    let rows: Vec<ProjectRow> = projects
        .iter()
        .map(|p| ProjectRow {
            id: p.project.id,
            name: p.project.name.clone(),
            region: p.region_name.clone(),
            technology: p.project.technology.to_string(),
            capacity: format!("{:.1}", p.project.capacity_mw),
            status: p.project.status.to_string(),
        })
        .collect();
    render(&rows)
}

#[derive(Tabled)]
struct MeasurementRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Generation (MWh)")]
    generation: String,
}

pub fn measurements_table(
    measurements: &[Measurement],
    project_names: &HashMap<i64, String>,
) -> String {
    let rows: Vec<MeasurementRow> = measurements
        .iter()
        .map(|m| MeasurementRow {
            id: m.id,
            project: project_names
                .get(&m.project_id)
                .cloned()
                .unwrap_or_else(|| m.project_id.to_string()),
            timestamp: m.timestamp.format("%Y-%m-%d %H:%M").to_string(),
            generation: format!("{:.2}", m.generation_mwh),
        })
        .collect();
    render(&rows)
}

#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Year")]
    year: i32,
    #[tabled(rename = "Type")]
    target_type: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn targets_table(targets: &[Target], region_names: &HashMap<i64, String>) -> String {
    let rows: Vec<TargetRow> = targets
        .iter()
        .map(|t| TargetRow {
            id: t.id,
            region: region_names
                .get(&t.region_id)
                .cloned()
                .unwrap_or_else(|| t.region_id.to_string()),
            year: t.year,
            target_type: t.target_type.to_string(),
            value: format!("{} {}", t.value, t.target_type.unit()),
            status: t.status.clone(),
        })
        .collect();
    render(&rows)
}

#[derive(Tabled)]
struct CarbonRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Metric")]
    metric_type: String,
    #[tabled(rename = "Value")]
    value: f64,
    #[tabled(rename = "Period")]
    period: String,
}

pub fn carbon_table(
    metrics: &[CarbonMetric],
    project_names: &HashMap<i64, String>,
    region_names: &HashMap<i64, String>,
) -> String {
    let rows: Vec<CarbonRow> = metrics
        .iter()
        .map(|m| CarbonRow {
            id: m.id,
            project: or_dash(m.project_id.and_then(|p| project_names.get(&p))),
            region: or_dash(m.region_id.and_then(|r| region_names.get(&r))),
            metric_type: m.metric_type.clone(),
            value: m.value,
            period: match (m.period_start, m.period_end) {
                (Some(start), Some(end)) => format!("{} → {}", start, end),
                (Some(start), None) => format!("from {}", start),
                (None, Some(end)) => format!("until {}", end),
                (None, None) => "-".to_string(),
            },
        })
        .collect();
    render(&rows)
}

#[derive(Tabled)]
struct RegionReportRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Projects")]
    projects: usize,
    #[tabled(rename = "Active (MW)")]
    capacity: String,
    #[tabled(rename = "Generation (MWh)")]
    generation: String,
    #[tabled(rename = "Avoided (tCO2)")]
    avoided: String,
    #[tabled(rename = "Targets")]
    targets: String,
}

pub fn region_reports_table(reports: &[RegionReport]) -> String {
    let rows: Vec<RegionReportRow> = reports
        .iter()
        .map(|r| RegionReportRow {
            region: r.region_name.clone(),
            level: r.level.to_string(),
            projects: r.project_count,
            capacity: format!("{:.1}", r.active_capacity_mw),
            generation: format!("{:.2}", r.total_generation_mwh),
            avoided: format!("{:.1}", r.avoided_emissions_t),
            targets: r
                .targets
                .iter()
                .map(|t| match t.progress_pct {
                    Some(pct) => format!("{} {} {}: {:.0}%", t.year, t.target_type, t.value, pct),
                    None => format!("{} {} {}{}", t.year, t.target_type, t.value, t.target_type.unit()),
                })
                .collect::<Vec<_>>()
                .join("; "),
        })
        .collect();
    render(&rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::region::RegionLevel;

    #[test]
    fn test_regions_table_shows_parent_names() {
        let regions = vec![
            Region {
                id: 1,
                name: "CountryX".into(),
                level: RegionLevel::National,
                parent_id: None,
                geo_code: None,
            },
            Region {
                id: 2,
                name: "StateY".into(),
                level: RegionLevel::State,
                parent_id: Some(1),
                geo_code: Some("EX-SY".into()),
            },
        ];
        let table = regions_table(&regions);
        assert!(table.contains("CountryX"));
        assert!(table.contains("EX-SY"));
        assert!(table.lines().any(|line| line.contains("StateY") && line.contains("CountryX")));
    }

    #[test]
    fn test_empty_input_renders_nothing() {
        assert!(regions_table(&[]).is_empty());
        assert!(stats_table(&TableCounts::default()).contains("regions"));
    }
}
