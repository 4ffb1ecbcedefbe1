//! arbridge CLI - Command-line interface
//!
//! Runs the anchor-placement and pose-sync loop against a simulated tracking
//! session and manages the configuration file.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod error;
mod runner;
mod simulation;

use commands::config::ConfigCommands;
use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "arbridge")]
#[command(about = "Anchor placement and pose sync for AR scenes", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pose-sync loop against a simulated AR session
    Run {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of render ticks (0 runs until Ctrl+C)
        #[arg(long)]
        ticks: Option<u64>,

        /// Render ticks per second
        #[arg(long)]
        fps: Option<u32>,

        /// Milliseconds between simulated taps
        #[arg(long)]
        tap_interval: Option<u64>,

        /// Maximum number of simultaneous anchors
        #[arg(long)]
        max_anchors: Option<usize>,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default configuration file
    Init {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// View or change configuration settings
    Config {
        /// Path to configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            ticks,
            fps,
            tap_interval,
            max_anchors,
            json,
        } => commands::run::run(RunArgs {
            config,
            ticks,
            fps,
            tap_interval_ms: tap_interval,
            max_anchors,
            json,
        }),
        Commands::Init { config, force } => commands::init::run(config, force),
        Commands::Config { config, command } => commands::config::run(command, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
