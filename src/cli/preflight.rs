//! Pre-flight checks before expensive operations.
//!
//! Validates that required external tools are available before starting a
//! run that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{LaereError, Result};
use std::process::Command;

/// Run pre-flight checks for an extraction run.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(settings: &Settings) -> Result<()> {
    check_tool("yt-dlp")?;
    check_tool(&settings.extraction.command)?;
    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(LaereError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(LaereError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(LaereError::ToolNotFound(format!("{}: {}", name, e))),
    }
}
