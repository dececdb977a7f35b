//! popsynth: headless population/household synthesizer.
//!
//! Usage:
//!   popsynth synthesize --config run.json
//!   popsynth regenerate-worker-categories --config run.json

use anyhow::Result;
use clap::{Parser, Subcommand};
use popsynth_core::config::SynthConfig;
use popsynth_core::driver;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "popsynth", version, about = "Forecast population/household synthesizer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Draw seed households per zone to match the forecast population, and
    /// emit HouseholdData/* and the worker-category tables.
    Synthesize {
        /// Path to a JSON run configuration.
        #[arg(long)]
        config: PathBuf,
    },
    /// Re-run only the worker-category aggregator over an already
    /// synthesized HouseholdData/* directory.
    RegenerateWorkerCategories {
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Synthesize { config } => {
            let config = SynthConfig::load(config)?;
            log::info!(
                "synthesizing into {} (seed {})",
                config.output_directory.display(),
                config.random_seed
            );
            driver::synthesize(&config)
        }
        Command::RegenerateWorkerCategories { config } => {
            let config = SynthConfig::load(config)?;
            log::info!(
                "regenerating worker categories from {}",
                config.output_directory.display()
            );
            driver::regenerate_worker_categories(&config)
        }
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }

    Ok(())
}
