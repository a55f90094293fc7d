use crate::{emit_json, OutputFormat};
use owo_colors::OwoColorize;
use renewable::carbon::{savings, FootprintBand};
use renewable::forecast::{estimate_pv, AdoptionModel};
use renewable::ui::{self, header, section, success, summary_row, theme, Icons};
use renewable::Store;
use std::collections::HashMap;
use std::path::Path;

/// Open a store that `init-db` has already created
fn open_store(database: &Path) -> anyhow::Result<Store> {
    Ok(Store::open_existing(database)?)
}

fn region_names(store: &Store) -> anyhow::Result<HashMap<i64, String>> {
    Ok(store
        .list_regions()?
        .into_iter()
        .map(|r| (r.id, r.name))
        .collect())
}

fn project_names(store: &Store) -> anyhow::Result<HashMap<i64, String>> {
    Ok(store
        .list_projects()?
        .into_iter()
        .map(|p| (p.project.id, p.project.name))
        .collect())
}

pub fn run_init_db(database: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let store = Store::create(database)?;
    store.initialize()?;

    if format.is_human() {
        success(&format!("Database initialized at {}", database.display()));
    } else {
        emit_json(&serde_json::json!({
            "database": database.display().to_string(),
            "initialized": true,
        }))?;
    }
    Ok(())
}

pub fn run_seed(database: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let mut store = open_store(database)?;
    let counts = store.seed()?;

    if format.is_human() {
        header(Icons::SEED, &format!("Seeded {}", store.location()));
        for (table, count) in counts.rows() {
            summary_row(&format!("{:<15}", table), &count.to_string());
        }
        success("Sample data loaded");
    } else {
        emit_json(&counts)?;
    }
    Ok(())
}

pub fn run_list_regions(database: &Path, table: bool, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let regions = store.list_regions()?;

    if !format.is_human() {
        return emit_json(&regions);
    }
    if regions.is_empty() {
        ui::empty("No regions found.");
        return Ok(());
    }
    if table {
        println!("{}", ui::regions_table(&regions));
        return Ok(());
    }

    let names: HashMap<i64, &str> = regions.iter().map(|r| (r.id, r.name.as_str())).collect();
    for region in &regions {
        let parent = region
            .parent_id
            .and_then(|p| names.get(&p).copied())
            .unwrap_or("-");
        println!(
            "{} {} [{}] parent: {} geo: {}",
            format!("{:>3}", region.id).style(theme().dim.clone()),
            region.name,
            region.level,
            parent,
            region.geo_code.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

pub fn run_list_projects(database: &Path, table: bool, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let projects = store.list_projects()?;

    if !format.is_human() {
        return emit_json(&projects);
    }
    if projects.is_empty() {
        ui::empty("No projects found.");
        return Ok(());
    }
    if table {
        println!("{}", ui::projects_table(&projects));
        return Ok(());
    }

    for listing in &projects {
        let project = &listing.project;
        println!(
            "{} {} {} in {}: {} {} MW ({})",
            format!("{:>3}", project.id).style(theme().dim.clone()),
            Icons::technology(project.technology),
            project.name,
            listing.region_name,
            project.technology.style(theme().technology(project.technology)),
            project.capacity_mw,
            project.status,
        );
    }
    Ok(())
}

pub fn run_list_measurements(
    database: &Path,
    project: Option<i64>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let measurements = store.list_measurements(project)?;

    if !format.is_human() {
        return emit_json(&measurements);
    }
    if measurements.is_empty() {
        ui::empty("No measurements found.");
        return Ok(());
    }

    header(Icons::CHART, "Generation measurements");
    println!("{}", ui::measurements_table(&measurements, &project_names(&store)?));
    summary_row(
        "Total generation:",
        &format!("{:.2} MWh", renewable::measurement::total_generation(&measurements)),
    );
    Ok(())
}

pub fn run_list_targets(database: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let targets = store.list_targets()?;

    if !format.is_human() {
        return emit_json(&targets);
    }
    if targets.is_empty() {
        ui::empty("No targets found.");
        return Ok(());
    }

    header(Icons::TARGET, "Regional targets");
    println!("{}", ui::targets_table(&targets, &region_names(&store)?));
    Ok(())
}

pub fn run_list_carbon(database: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let metrics = store.list_carbon_metrics()?;

    if !format.is_human() {
        return emit_json(&metrics);
    }
    if metrics.is_empty() {
        ui::empty("No carbon metrics found.");
        return Ok(());
    }

    header(Icons::LEAF, "Carbon metrics");
    println!(
        "{}",
        ui::carbon_table(&metrics, &project_names(&store)?, &region_names(&store)?)
    );
    Ok(())
}

pub fn run_tree(database: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let tree = store.region_tree()?;

    if !format.is_human() {
        let paths: Vec<serde_json::Value> = tree
            .leaves()
            .into_iter()
            .map(|leaf| {
                let path: Vec<&str> = tree.path(leaf.id).iter().map(|r| r.name.as_str()).collect();
                serde_json::json!({ "region_id": leaf.id, "path": path })
            })
            .collect();
        return emit_json(&paths);
    }
    if tree.is_empty() {
        ui::empty("No regions found.");
        return Ok(());
    }

    header(Icons::MAP, "Region hierarchy");
    for line in tree.render() {
        println!("{}", line);
    }
    Ok(())
}

pub fn run_stats(database: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let counts = store.stats()?;
    let digest = store.digest()?;

    if !format.is_human() {
        return emit_json(&serde_json::json!({
            "counts": counts,
            "digest": digest,
        }));
    }

    header(Icons::STATS, &format!("Registry statistics ({})", store.location()));
    println!("{}", ui::stats_table(&counts));
    ui::status(Icons::DATABASE, "Digest", &digest);
    Ok(())
}

pub fn run_report(database: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(database)?;
    let reports = store.region_reports()?;
    let filed = store.list_reports()?;

    if !format.is_human() {
        return emit_json(&serde_json::json!({
            "regions": reports,
            "reports": filed,
        }));
    }
    if reports.is_empty() {
        ui::empty("No regions to report on.");
        return Ok(());
    }

    header(Icons::GLOBE, "Regional summary");
    println!("{}", ui::region_reports_table(&reports));

    if !filed.is_empty() {
        let names = region_names(&store)?;
        section("Filed reports");
        for report in &filed {
            let region = report
                .region_id
                .and_then(|id| names.get(&id))
                .map(String::as_str)
                .unwrap_or("-");
            let notes = report
                .payload
                .as_ref()
                .and_then(|p| p.get("notes"))
                .and_then(|n| n.as_str())
                .unwrap_or("");
            println!(
                "  {} {} ({}) {}",
                ui::dim(&report.created_at.format("%Y-%m-%d %H:%M").to_string()),
                report.reporter.as_deref().unwrap_or("anonymous"),
                region,
                notes,
            );
        }
    }
    Ok(())
}

/// Parse `LABEL=KWH` or a bare kWh figure; bare figures are labelled by position
pub fn parse_period(entry: &str, index: usize) -> anyhow::Result<(String, f64)> {
    let (label, units) = match entry.split_once('=') {
        Some((label, units)) => (label.trim().to_string(), units),
        None => (format!("Period {}", index + 1), entry),
    };
    let units: f64 = units
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid kWh value in '{}'", entry))?;
    Ok((label, units))
}

/// Parse one irradiance reading; `-`, `na` and empty values are missing days
pub fn parse_irradiance(value: &str) -> anyhow::Result<Option<f64>> {
    let value = value.trim();
    if value.is_empty() || value == "-" || value.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    let parsed: f64 = value
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid irradiance value '{}'", value))?;
    if parsed < 0.0 {
        anyhow::bail!("irradiance cannot be negative: {}", parsed);
    }
    Ok(Some(parsed))
}

pub fn run_carbon(entries: &[String], format: OutputFormat) -> anyhow::Result<()> {
    let periods = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| parse_period(entry, i))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let summary = savings(periods)?;

    if !format.is_human() {
        return emit_json(&summary);
    }

    header(Icons::LEAF, "Carbon footprint");
    for period in &summary.periods {
        let band = period.band();
        let advice = match band {
            FootprintBand::Low => band.advice().style(theme().success.clone()).to_string(),
            FootprintBand::Moderate => band.advice().style(theme().warn.clone()).to_string(),
            FootprintBand::High => band.advice().style(theme().error.clone()).to_string(),
        };
        println!(
            "  {:<10} {:>8.1} kWh  grid {:>8.2} kg CO₂  renewable {:>7.2} kg CO₂  {}",
            period.label, period.units_kwh, period.grid_co2_kg, period.renewable_co2_kg, advice
        );
    }

    section("Switching to renewable supply");
    summary_row("CO₂ saved:", &format!("{:.2} kg", summary.co2_saving_kg));
    summary_row("Cost saved:", &format!("{:.2}", summary.cost_saving));
    Ok(())
}

pub fn run_pv_yield(values: &[String], format: OutputFormat) -> anyhow::Result<()> {
    let readings = values
        .iter()
        .map(|v| parse_irradiance(v))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let estimate = estimate_pv(&readings);

    if !format.is_human() {
        return emit_json(&estimate);
    }

    header(Icons::SUN, "PV yield per installed kW");
    for (day, yield_kwh) in estimate.daily_kwh_per_kw.iter().enumerate() {
        match yield_kwh {
            Some(kwh) => println!("  Day {:>3}: {:.3} kWh/kW", day + 1, kwh),
            None => println!("  Day {:>3}: {}", day + 1, ui::dim("missing")),
        }
    }
    match (estimate.total_kwh_per_kw, estimate.average_kwh_per_kw_per_day) {
        (Some(total), Some(average)) => {
            summary_row("Total:", &format!("{:.3} kWh/kW", total));
            summary_row("Average:", &format!("{:.3} kWh/kW/day", average));
        }
        _ => ui::warn("No irradiance readings available"),
    }
    Ok(())
}

pub fn run_forecast(
    model: &AdoptionModel,
    years: u32,
    step: u32,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let points = model.project(years, step)?;

    if !format.is_human() {
        return emit_json(&serde_json::json!({
            "model": model,
            "points": points,
        }));
    }

    header(Icons::CHART, "Renewable adoption forecast");
    for point in &points {
        println!(
            "  Year {:>3}: {:>12.0} adopters  {:>10.2} GWh",
            point.year,
            point.adopters,
            point.generation_kwh / 1_000_000.0
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_period_with_label() {
        let (label, units) = parse_period("Jan=120.5", 0).unwrap();
        assert_eq!(label, "Jan");
        assert!((units - 120.5).abs() < 1e-9);
    }

    #[test]
    fn test_parse_period_bare_value() {
        let (label, units) = parse_period("300", 2).unwrap();
        assert_eq!(label, "Period 3");
        assert!((units - 300.0).abs() < 1e-9);
        assert!(parse_period("Feb=lots", 1).is_err());
    }

    #[test]
    fn test_parse_irradiance_missing_and_negative() {
        assert_eq!(parse_irradiance("-").unwrap(), None);
        assert_eq!(parse_irradiance("NA").unwrap(), None);
        assert_eq!(parse_irradiance("5200").unwrap(), Some(5200.0));
        assert!(parse_irradiance("-5").is_err());
        assert!(parse_irradiance("sunny").is_err());
    }

    #[test]
    fn test_init_db_then_seed_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nested").join("registry.db");
        run_init_db(&db, OutputFormat::Json).unwrap();
        run_seed(&db, OutputFormat::Json).unwrap();

        let store = Store::open(&db).unwrap();
        assert_eq!(store.list_regions().unwrap().len(), 5);
        assert!(run_seed(&db, OutputFormat::Json).is_err());
    }

    #[test]
    fn test_commands_before_init_leave_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("absent.db");

        let err = run_list_regions(&db, false, OutputFormat::Text).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<renewable::Error>(),
            Some(renewable::Error::NotInitialized)
        ));
        assert!(run_list_projects(&db, false, OutputFormat::Text).is_err());
        assert!(run_seed(&db, OutputFormat::Text).is_err());
        assert!(run_stats(&db, OutputFormat::Text).is_err());
        assert!(!db.exists());
    }

    #[test]
    fn test_init_db_reports_unusable_location() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let err = run_init_db(&blocker.join("registry.db"), OutputFormat::Json).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<renewable::Error>(),
            Some(renewable::Error::StorageUnavailable { .. })
        ));
    }
}
