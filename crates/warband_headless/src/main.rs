//! Headless Warband runner.
//!
//! # Usage
//!
//! ```bash
//! # Run a scenario and print a JSON summary on stdout
//! cargo run -p warband_headless -- run --scenario assets/scenarios/skirmish.ron
//!
//! # Save the final world, then resume from it
//! cargo run -p warband_headless -- run --scenario assets/scenarios/skirmish.ron --save world.ron
//! cargo run -p warband_headless -- run --scenario assets/scenarios/skirmish.ron --load world.ron
//! ```
//!
//! Logs go to stderr; stdout carries only the summary.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use warband_core::simulation::Simulation;
use warband_headless::{
    load_snapshot, run, runner::DEFAULT_FRAME_MS, save_snapshot, RunError, RunOptions, Scenario,
};

#[derive(Parser)]
#[command(name = "warband_headless")]
#[command(about = "Headless Warband simulation runner")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario
    Run {
        /// Scenario file to load
        #[arg(short, long)]
        scenario: PathBuf,

        /// Number of frames to drive
        #[arg(short, long, default_value = "600")]
        ticks: u64,

        /// Milliseconds between frames
        #[arg(long, default_value_t = DEFAULT_FRAME_MS)]
        frame_ms: f64,

        /// Stop as soon as one faction is left with units
        #[arg(long)]
        until_victory: bool,

        /// Write the final world to this file (.ron for text)
        #[arg(long)]
        save: Option<PathBuf>,

        /// Start from this snapshot instead of the scenario's entities
        #[arg(long)]
        load: Option<PathBuf>,
    },

    /// Check a scenario for unresolved references
    Validate {
        /// Scenario file to check
        #[arg(short, long)]
        scenario: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs on stderr; stdout is for the summary.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            scenario,
            ticks,
            frame_ms,
            until_victory,
            save,
            load,
        } => cmd_run(
            scenario,
            RunOptions {
                frames: ticks,
                frame_ms,
                stop_on_victory: until_victory,
            },
            save,
            load,
        ),
        Commands::Validate { scenario } => cmd_validate(scenario),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Run a scenario and print its summary.
fn cmd_run(
    scenario_path: PathBuf,
    options: RunOptions,
    save: Option<PathBuf>,
    load: Option<PathBuf>,
) -> Result<ExitCode, RunError> {
    let scenario = Scenario::load(&scenario_path)?;

    let mut sim = match load {
        Some(path) => {
            let snapshot = load_snapshot(&path)?;
            Simulation::from_snapshot(&snapshot, scenario.config.clone(), scenario.catalog.clone())?
        }
        None => scenario.build(),
    };

    let summary = run(&mut sim, &scenario.name, &options);

    if let Some(path) = save {
        save_snapshot(&path, &sim.snapshot())?;
    }

    match serde_json::to_string_pretty(&summary) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("Failed to encode summary: {e}");
            return Ok(ExitCode::FAILURE);
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Print every unresolved reference; fail if there are any.
fn cmd_validate(scenario_path: PathBuf) -> Result<ExitCode, RunError> {
    let scenario = Scenario::load(&scenario_path)?;
    let issues = scenario.validate();

    if issues.is_empty() {
        println!("{}: OK", scenario_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    for issue in &issues {
        println!("{}: {issue}", scenario_path.display());
    }
    tracing::warn!(issues = issues.len(), "Scenario has unresolved references");
    Ok(ExitCode::FAILURE)
}
