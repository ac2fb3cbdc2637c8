//! Batch execution of a command script

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use vssd::{Session, SessionConfig};

/// Execute a command script
#[derive(Parser, Debug)]
#[command(about = "Execute a command script without prompts")]
pub struct RunArgs {
    /// Script with one command per line
    pub script: PathBuf,
}

pub fn run(args: RunArgs, config: SessionConfig) -> Result<()> {
    let file = File::open(&args.script)
        .with_context(|| format!("Failed to open script: {:?}", args.script))?;

    let mut session = Session::new(config, io::stdout(), io::stderr());
    session
        .run(BufReader::new(file), false)
        .with_context(|| format!("Failed to execute script: {:?}", args.script))?;

    info!(
        "Executed {} lines from {}",
        session.line_number(),
        args.script.display()
    );
    if session.error_count() > 0 {
        bail!(
            "{} error(s) reported while running {}",
            session.error_count(),
            args.script.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run_script(script: &str) -> Result<()> {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("script.vssd");
        std::fs::write(&path, script).unwrap();
        run(RunArgs { script: path }, SessionConfig::default())
    }

    #[test]
    fn test_clean_script_succeeds() {
        assert!(run_script("c 32 2 r\nw 1 \"A\"\nr 1 x \"A\"\nq\n").is_ok());
    }

    #[test]
    fn test_reported_errors_fail_the_run() {
        let err = run_script("c 32 2 r\nr 9\n").unwrap_err();
        assert!(err.to_string().starts_with("1 error(s) reported"));
    }

    #[test]
    fn test_missing_script() {
        let temp_dir = TempDir::new().unwrap();
        let err = run(
            RunArgs {
                script: temp_dir.path().join("absent.vssd"),
            },
            SessionConfig::default(),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("Failed to open script"));
    }
}
