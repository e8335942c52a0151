//! Skill extraction abstraction for Laere.
//!
//! Wraps the external AI CLI behind a trait so the pipeline can be tested
//! with a fake extractor.

mod claude;

pub use claude::{strip_code_fences, ClaudeCliExtractor};

use crate::error::Result;
use async_trait::async_trait;

/// Trait for skill extractors.
#[async_trait]
pub trait SkillExtractor: Send + Sync {
    /// Run the composed prompt through the model and return the generated
    /// skill markdown.
    ///
    /// Calls are bounded by the configured timeout. Non-zero exit, empty
    /// output, and the no-skill sentinel are all extraction failures.
    async fn extract(&self, prompt: &str) -> Result<String>;
}
