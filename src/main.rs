//! Renewable CLI - Command-line interface for the renewable energy registry

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use renewable::config::{load_config, resolve_database};
use renewable::forecast::AdoptionModel;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "renewable")]
#[command(version)]
#[command(about = "Renewable energy registry - regions, projects, generation and targets")]
#[command(long_about = r#"
Renewable keeps a small relational registry of renewable energy installations:
  • A national → state → local region hierarchy
  • Projects with their generation measurements and carbon metrics
  • Capacity and share targets per region

Example usage:
  renewable init-db
  renewable seed
  renewable list-projects
  renewable report --format json
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file (defaults to the config value, then renewable.db)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_human(self) -> bool {
        self == OutputFormat::Text
    }
}

/// Print any serializable value as pretty JSON on stdout
pub fn emit_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Subcommand)]
enum Commands {
    /// Create the registry tables (safe to run repeatedly)
    InitDb,

    /// Load the sample dataset into an empty registry
    Seed,

    /// List all regions, one per line
    ListRegions {
        /// Render as a table
        #[arg(short, long)]
        table: bool,
    },

    /// List all projects with their region, one per line
    ListProjects {
        /// Render as a table
        #[arg(short, long)]
        table: bool,
    },

    /// List generation measurements
    ListMeasurements {
        /// Only show measurements for this project id
        #[arg(short, long)]
        project: Option<i64>,
    },

    /// List regional targets
    ListTargets,

    /// List carbon metrics
    ListCarbon,

    /// Show the region hierarchy as a tree
    Tree,

    /// Show row counts and the content digest
    Stats,

    /// Aggregate capacity, generation, emissions and target progress per region
    Report,

    /// Estimate emissions and savings of monthly consumption
    Carbon {
        /// Consumption per period as LABEL=KWH, or a bare kWh figure
        #[arg(required = true)]
        periods: Vec<String>,
    },

    /// Estimate PV yield per installed kW from daily irradiance (Wh/m²)
    PvYield {
        /// Daily irradiance values; use "-" for a missing day
        #[arg(required = true, allow_hyphen_values = true)]
        irradiance: Vec<String>,
    },

    /// Project renewable adoption with a logistic growth curve
    Forecast {
        /// Years to project
        #[arg(long, default_value = "20")]
        years: u32,

        /// Sampling step in years
        #[arg(long, default_value = "5")]
        step: u32,

        /// Total potential adopters
        #[arg(long, default_value = "1000000")]
        population: f64,

        /// Adopters at year zero
        #[arg(long, default_value = "50000")]
        initial: f64,

        /// Annual growth rate
        #[arg(long, default_value = "0.22")]
        rate: f64,

        /// kWh generated per adopter per year
        #[arg(long, default_value = "5000")]
        kwh_per_adopter: f64,
    },
}

fn main() {
    if let Err(err) = run() {
        renewable::ui::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = load_config(cli.config.as_deref())?;
    let database = resolve_database(cli.database, config.as_ref());
    tracing::debug!("Using database {}", database.display());
    let format = cli.format;

    match cli.command {
        Commands::InitDb => commands::run_init_db(&database, format),
        Commands::Seed => commands::run_seed(&database, format),
        Commands::ListRegions { table } => commands::run_list_regions(&database, table, format),
        Commands::ListProjects { table } => commands::run_list_projects(&database, table, format),
        Commands::ListMeasurements { project } => {
            commands::run_list_measurements(&database, project, format)
        }
        Commands::ListTargets => commands::run_list_targets(&database, format),
        Commands::ListCarbon => commands::run_list_carbon(&database, format),
        Commands::Tree => commands::run_tree(&database, format),
        Commands::Stats => commands::run_stats(&database, format),
        Commands::Report => commands::run_report(&database, format),
        Commands::Carbon { periods } => commands::run_carbon(&periods, format),
        Commands::PvYield { irradiance } => commands::run_pv_yield(&irradiance, format),
        Commands::Forecast {
            years,
            step,
            population,
            initial,
            rate,
            kwh_per_adopter,
        } => {
            let model = AdoptionModel {
                population,
                initial_adopters: initial,
                growth_rate: rate,
                generation_per_adopter_kwh: kwh_per_adopter,
            };
            commands::run_forecast(&model, years, step, format)
        }
    }
}
