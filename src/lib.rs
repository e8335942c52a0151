//! Laere - YouTube to AI skills
//!
//! A CLI tool that turns YouTube video transcripts into reusable skill
//! documents for an AI coding assistant.
//!
//! The name "Laere" comes from the Norwegian word "lære" for "learn."
//!
//! # Overview
//!
//! Laere allows you to:
//! - Extract the methodology taught in a YouTube video into a SKILL.md file
//! - Process whole channels or playlists as a queue of per-video jobs
//! - Watch per-job progress while external tools run in the background
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt templates
//! - `source` - Video listing and transcript fetch (yt-dlp)
//! - `extractor` - Skill extraction via the external AI CLI
//! - `job` - Per-video unit of work and its status lifecycle
//! - `writer` - Skill persistence under the skills directory
//! - `orchestrator` - Pipeline coordination and progress events
//!
//! # Example
//!
//! ```rust,no_run
//! use laere::config::Settings;
//! use laere::orchestrator::Orchestrator;
//! use tokio::sync::{mpsc, watch};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let (events, mut rx) = mpsc::channel(64);
//!     let (_cancel_tx, cancel) = watch::channel(false);
//!
//!     tokio::spawn(async move {
//!         while let Some(event) = rx.recv().await {
//!             println!("{:?}", event);
//!         }
//!     });
//!
//!     let summary = orchestrator
//!         .run("https://www.youtube.com/watch?v=dQw4w9WgXcQ", None, events, cancel)
//!         .await?;
//!     println!("Wrote {} skill(s)", summary.written);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod job;
pub mod orchestrator;
pub mod source;
pub mod writer;

pub use error::{LaereError, Result};
