#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Ember Keep scenarios headless.

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ember_keep_cli::Simulation;
use ember_keep_scenario::Scenario;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the Ember Keep runner.
#[derive(Debug, Parser)]
#[command(name = "ember-keep", author, version, about = "Headless Ember Keep runner")]
struct CliArgs {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Plays a scenario to its conclusion and prints a summary.
    Run(RunArgs),
    /// Loads and validates a scenario without playing it.
    Validate {
        /// Scenario file to validate.
        #[arg(long)]
        scenario: PathBuf,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Scenario file to play.
    #[arg(long)]
    scenario: PathBuf,
    /// Seed for loot rolls; defaults to the scenario's seed, then 0.
    #[arg(long)]
    seed: Option<u64>,
    /// Length of one simulation frame in milliseconds.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u64).range(1..))]
    frame_ms: u64,
    /// Game time after which the run stops undecided.
    #[arg(long, default_value_t = 900)]
    max_seconds: u64,
}

/// Entry point for the Ember Keep command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse();
    match args.command {
        CliCommand::Run(run_args) => run(run_args),
        CliCommand::Validate { scenario } => validate(scenario),
    }
}

fn run(args: RunArgs) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("failed to load scenario {}", args.scenario.display()))?;
    let seed = args.seed.or(scenario.seed).unwrap_or(0);

    let mut simulation = Simulation::new(scenario, seed, Duration::from_millis(args.frame_ms));
    let summary = simulation.run(Duration::from_secs(args.max_seconds));
    println!("{summary}");
    Ok(())
}

fn validate(path: PathBuf) -> Result<()> {
    let scenario = Scenario::load(&path)
        .with_context(|| format!("failed to load scenario {}", path.display()))?;
    println!(
        "{}: ok ({} waves, {} blueprints, {} script steps)",
        scenario.name,
        scenario.schedule.waves.len(),
        scenario.arena.blueprints.len(),
        scenario.script.len()
    );
    Ok(())
}
