//! VSSD Command Line Interface
//!
//! Drives simulated disks from an interactive shell or a script, and creates
//! and inspects disk images.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use std::path::PathBuf;

use vssd::SessionConfig;

mod commands;

/// VSSD - the Very Simple Simulated Disk
#[derive(Parser)]
#[command(
    name = "vssd",
    about = "Very Simple Simulated Disk command-line interface",
    version = env!("CARGO_PKG_VERSION"),
    author = "VSSD Contributors"
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Session configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive session (default)
    Shell(commands::shell::ShellArgs),

    /// Execute a command script
    Run(commands::run::RunArgs),

    /// Create a zeroed disk image
    Create(commands::create::CreateArgs),

    /// Show and validate a disk image header
    Inspect(commands::inspect::InspectArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let log_level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .init();

    info!("VSSD CLI v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load config: {:?}", path))?,
        None => SessionConfig::default(),
    };

    // Execute the appropriate command
    match cli.command {
        None => commands::shell::run(Default::default(), config),
        Some(Commands::Shell(args)) => commands::shell::run(args, config),
        Some(Commands::Run(args)) => commands::run::run(args, config),
        Some(Commands::Create(args)) => commands::create::run(args),
        Some(Commands::Inspect(args)) => commands::inspect::run(args),
    }
}
