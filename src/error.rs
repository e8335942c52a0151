//! Error types for Laere.

use thiserror::Error;

/// Library-level error type for Laere operations.
#[derive(Error, Debug)]
pub enum LaereError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Could not resolve URL: {0}")]
    Resolution(String),

    #[error("No transcript available: {0}")]
    TranscriptUnavailable(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("Skill extraction failed: {0}")]
    Extraction(String),

    #[error("Failed to write skill: {0}")]
    Write(String),

    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias for Laere operations.
pub type Result<T> = std::result::Result<T, LaereError>;
