//! fleet-filters: listing filters, group statistics and auto-grouping for
//! transport simulation scenarios.

#![allow(clippy::struct_excessive_bools, clippy::needless_pass_by_value)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use fleet_filters::{
    cli::{self, AutoGroupConfig, CatchmentRunConfig, OutputFormat, StatsConfig},
    config::{self, AppConfig, ConfigPreset, Validatable},
    groups::Heuristic,
    model::VehicleType,
};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fleet-filters")]
#[command(version)]
#[command(about = "Vehicle group statistics, auto-grouping and catchment filters", long_about = None)]
#[command(after_help = "EXAMPLES:
    # Statistics of every bucket
    fleet-filters stats network.yaml

    # Preview an auto-grouping by cargo, then apply it and save the result
    fleet-filters auto-group network.yaml --company 0 --vehicle-type road --heuristic cargo --dry-run
    fleet-filters auto-group network.yaml --company 0 --vehicle-type road --save regrouped.yaml

    # Catchment of all stations accepting cargo 1
    fleet-filters catchment network.yaml --cargo 1")]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, env = "FLEET_FILTERS_CONFIG")]
    config: Option<PathBuf>,

    /// Start from a named preset instead of the defaults
    #[arg(long, global = true, value_enum)]
    preset: Option<ConfigPreset>,

    #[command(subcommand)]
    command: Commands,
}

/// Output arguments shared by every reporting command
#[derive(clap::Args)]
struct OutputArgs {
    /// Output format (auto: table on a terminal, JSON otherwise)
    #[arg(short, long, value_enum, default_value = "auto")]
    output: OutputFormat,

    /// Output file path (stdout if not specified)
    #[arg(short = 'O', long)]
    output_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print group statistics of a scenario
    Stats {
        /// Scenario file (YAML or JSON)
        scenario: PathBuf,

        /// Only buckets of this company
        #[arg(long)]
        company: Option<u8>,

        /// Only buckets of this vehicle type
        #[arg(long, value_enum)]
        vehicle_type: Option<VehicleType>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rebuild the groups of one company and vehicle type
    AutoGroup {
        /// Scenario file (YAML or JSON)
        scenario: PathBuf,

        #[arg(long)]
        company: u8,

        #[arg(long, value_enum)]
        vehicle_type: VehicleType,

        /// Partition rule (default from config)
        #[arg(long, value_enum)]
        heuristic: Option<Heuristic>,

        /// Plan and preflight without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Save the regrouped scenario to this file
        #[arg(long, conflicts_with = "dry_run")]
        save: Option<PathBuf>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show the catchment overlay for a station selection
    Catchment {
        /// Scenario file (YAML or JSON)
        scenario: PathBuf,

        /// Show only these stations (repeatable)
        #[arg(long = "station", value_name = "ID")]
        stations: Vec<u32>,

        /// Show stations of these companies (repeatable)
        #[arg(long = "company", value_name = "ID")]
        companies: Vec<u8>,

        /// Show stations accepting these cargos (repeatable)
        #[arg(long = "cargo", value_name = "ID")]
        cargos: Vec<u8>,

        /// Hide stations accepting these cargos (repeatable)
        #[arg(long = "exclude-cargo", value_name = "ID")]
        exclude_cargos: Vec<u8>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate JSON Schema for the config file format
    ConfigSchema {
        /// Write schema to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show, discover, or initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Sub-subcommands for the `config` command
#[derive(Subcommand)]
enum ConfigAction {
    /// Print current effective configuration (merged from defaults + file)
    Show,
    /// Print the discovered config file
    Path,
    /// Generate an example .fleet-filters.yaml in the current directory
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
        .init();

    let app = effective_config(&cli)?;

    match cli.command {
        Commands::Stats {
            scenario,
            company,
            vehicle_type,
            output,
        } => cli::run_stats(
            StatsConfig {
                scenario,
                company,
                vehicle_type,
                output: output.output,
                output_file: output.output_file,
                quiet: cli.quiet,
            },
            app,
        ),

        Commands::AutoGroup {
            scenario,
            company,
            vehicle_type,
            heuristic,
            dry_run,
            save,
            output,
        } => cli::run_auto_group(
            AutoGroupConfig {
                scenario,
                company,
                vehicle_type,
                heuristic,
                dry_run,
                save,
                output: output.output,
                output_file: output.output_file,
                quiet: cli.quiet,
            },
            app,
        ),

        Commands::Catchment {
            scenario,
            stations,
            companies,
            cargos,
            exclude_cargos,
            output,
        } => cli::run_catchment(
            CatchmentRunConfig {
                scenario,
                stations,
                companies,
                cargos,
                exclude_cargos,
                output: output.output,
                output_file: output.output_file,
                quiet: cli.quiet,
            },
            app,
        ),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }

        Commands::ConfigSchema { output } => {
            let schema = config::generate_json_schema()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &schema)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    eprintln!("Schema written to {}", path.display());
                }
                None => println!("{schema}"),
            }
            Ok(())
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                print!("{}", serde_yaml::to_string(&app)?);
                Ok(())
            }
            ConfigAction::Path => {
                match config::discover_config_file(cli.config.as_deref()) {
                    Some(path) => eprintln!("Active config file: {}", path.display()),
                    None => eprintln!("No config file found."),
                }
                Ok(())
            }
            ConfigAction::Init => {
                let target = std::env::current_dir()
                    .context("cannot determine current directory")?
                    .join(".fleet-filters.yaml");
                if target.exists() {
                    anyhow::bail!(
                        "{} already exists. Remove it first to re-initialize.",
                        target.display()
                    );
                }
                std::fs::write(&target, config::generate_example_config())
                    .with_context(|| format!("failed to write {}", target.display()))?;
                eprintln!("Created {}", target.display());
                Ok(())
            }
        },
    }
}

/// Defaults or preset, overlaid by the discovered config file, then validated.
fn effective_config(cli: &Cli) -> Result<AppConfig> {
    let (file_config, loaded_from) = config::load_or_default(cli.config.as_deref());
    let app = match (loaded_from, cli.preset) {
        (Some(path), _) => {
            tracing::debug!("Using config from {}", path.display());
            file_config
        }
        (None, Some(preset)) => AppConfig::from_preset(preset),
        (None, None) => file_config,
    };
    let errors = app.validate();
    if !errors.is_empty() {
        for error in &errors {
            tracing::error!("{error}");
        }
        anyhow::bail!("configuration has {} invalid values", errors.len());
    }
    Ok(app)
}
