//! Command line interface for methane pulse experiments.
//!
//! # Usage
//!
//! ```bash
//! # Build the scenarios and forcing and write the simulator input files
//! ch4pulse prepare --config run.toml
//!
//! # Summarise the temperature produced by the simulator
//! ch4pulse summarise --config run.toml --temperature output/temperature.csv
//! ```

use anyhow::Context;
use ch4pulse::{prepare_inputs, summarise, write_inputs, write_summaries, RunConfig};
use ch4pulse_inputs::output::read_temperature_output;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Methane pulse scenario construction and ensemble analysis
#[derive(Parser, Debug)]
#[command(name = "ch4pulse")]
#[command(about = "Build methane pulse scenarios and summarise simulated temperatures")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the emissions and forcing files for the simulator
    Prepare {
        /// Run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Summarise simulator temperature output as ensemble percentiles
    Summarise {
        /// Run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Temperature produced by the simulator (long-format CSV)
        #[arg(short, long)]
        temperature: PathBuf,
    },
}

/// Use `RUST_LOG` to override the default filter.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn load_config(path: &Path) -> anyhow::Result<RunConfig> {
    RunConfig::from_path(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

fn prepare(config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let inputs = prepare_inputs(&config).context("Failed to prepare simulator inputs")?;
    let written = write_inputs(&inputs, &config.output_dir)
        .with_context(|| format!("Failed to write inputs to {}", config.output_dir.display()))?;
    info!(files = written.len(), "Simulator inputs ready");
    Ok(())
}

fn summarise_output(config_path: &Path, temperature: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let output = read_temperature_output(temperature)
        .with_context(|| format!("Failed to read temperature from {}", temperature.display()))?;
    let summaries = summarise(&config, &output).context("Failed to summarise temperature")?;
    let written = write_summaries(&summaries, &config.output_dir).with_context(|| {
        format!(
            "Failed to write summaries to {}",
            config.output_dir.display()
        )
    })?;
    info!(files = written.len(), "Summaries written");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Prepare { config } => prepare(&config),
        Commands::Summarise {
            config,
            temperature,
        } => summarise_output(&config, &temperature),
    }
}
