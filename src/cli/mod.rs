//! CLI module for Laere.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Laere - YouTube to AI skills
///
/// A CLI tool that extracts reusable skills from YouTube videos.
/// The name "Laere" comes from the Norwegian word for "learn."
#[derive(Parser, Debug)]
#[command(name = "laere")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Laere and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Extract skills from a video, playlist, or channel URL
    Extract {
        /// YouTube video, playlist, or channel URL (or bare video ID)
        url: String,

        /// Maximum number of videos to process from a playlist/channel
        #[arg(short, long)]
        limit: Option<usize>,

        /// Number of videos processed concurrently
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Overwrite an existing skill with the same name instead of
        /// writing a suffixed copy
        #[arg(long)]
        overwrite: bool,
    },

    /// List extracted skills
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., "extraction.command")
        key: String,
        /// Configuration value
        value: String,
    },

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
