//! Interactive command session

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io;

use vssd::{Session, SessionConfig};

/// Start an interactive session
#[derive(Parser, Debug, Default)]
#[command(about = "Drive simulated disks interactively")]
pub struct ShellArgs {
    /// Do not print the command summary at startup
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

pub fn run(args: ShellArgs, mut config: SessionConfig) -> Result<()> {
    if args.quiet {
        config.show_banner = false;
    }

    let stdin = io::stdin();
    let mut session = Session::new(config, io::stdout(), io::stderr());
    session
        .run(stdin.lock(), true)
        .context("Interactive session failed")?;

    info!(
        "Session ended after {} lines with {} errors",
        session.line_number(),
        session.error_count()
    );
    Ok(())
}
