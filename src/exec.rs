//! Shell command execution for the coverage runs

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::process::Command;

/// Run a shell command in `dir`, streaming its output to the terminal
pub fn run_command(command: &str, dir: &Path) -> Result<()> {
    println!("{} {}", "▶".cyan(), command.dimmed());

    let status = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(dir)
        .status()
        .with_context(|| format!("Failed to spawn command: {}", command))?;

    if !status.success() {
        anyhow::bail!("Command failed ({}): {}", status, command);
    }

    Ok(())
}
