//! Configuration module for Laere.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ExtractionPrompts, Prompts, NO_SKILL_SENTINEL};
pub use settings::{
    ExtractionSettings, GeneralSettings, PipelineSettings, PromptSettings, Settings,
    SourceSettings, WriterSettings,
};
