//! AI CLI invocation.
//!
//! Drives the external AI CLI in non-interactive print mode. The prompt is
//! written to the child's stdin so transcript-sized inputs never hit argv
//! limits. Authentication is the CLI's own ambient credential; no keys are
//! handled here.

use super::SkillExtractor;
use crate::config::{ExtractionSettings, NO_SKILL_SENTINEL};
use crate::error::{LaereError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Extractor backed by an AI CLI with a `-p` (print) mode, e.g. `claude -p`.
pub struct ClaudeCliExtractor {
    command: String,
    timeout: Duration,
}

impl ClaudeCliExtractor {
    pub fn new(settings: &ExtractionSettings) -> Self {
        Self {
            command: settings.command.clone(),
            timeout: Duration::from_secs(settings.timeout_seconds),
        }
    }

    async fn run(&self, prompt: &str) -> Result<std::process::Output> {
        let mut child = Command::new(&self.command)
            .arg("-p")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    LaereError::ToolNotFound(self.command.clone())
                } else {
                    LaereError::ToolFailed(format!("{} execution failed: {}", self.command, e))
                }
            })?;

        // Write errors are ignored; a child that exits before reading the
        // whole prompt reports its failure through the exit status instead.
        if let Some(mut stdin) = child.stdin.take() {
            let _ = stdin.write_all(prompt.as_bytes()).await;
            let _ = stdin.shutdown().await;
        }

        // On expiry the future is dropped and kill_on_drop reaps the child.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(LaereError::Timeout {
                tool: self.command.clone(),
                seconds: self.timeout.as_secs(),
            }),
        }
    }
}

#[async_trait]
impl SkillExtractor for ClaudeCliExtractor {
    #[instrument(skip_all, fields(prompt_chars = prompt.len()))]
    async fn extract(&self, prompt: &str) -> Result<String> {
        debug!("Invoking {} in print mode", self.command);
        let output = self.run(prompt).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LaereError::Extraction(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let content = String::from_utf8_lossy(&output.stdout).trim().to_string();

        if content.is_empty() {
            return Err(LaereError::Extraction(format!(
                "{} produced no output",
                self.command
            )));
        }

        if content.contains(NO_SKILL_SENTINEL) {
            return Err(LaereError::Extraction(
                "model found no extractable skill in this video".to_string(),
            ));
        }

        let skill = strip_code_fences(&content);
        info!("Extracted skill ({} chars)", skill.len());
        Ok(skill)
    }
}

/// Strip a wrapping markdown code fence from model output.
///
/// Models often wrap the whole document in ```markdown fences despite being
/// told not to; inner fences are left alone.
pub fn strip_code_fences(content: &str) -> String {
    let mut content = content.trim();

    if let Some(rest) = content.strip_prefix("```markdown") {
        content = rest;
    } else if let Some(rest) = content.strip_prefix("```") {
        content = rest;
    }

    if let Some(rest) = content.strip_suffix("```") {
        content = rest;
    }

    content.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markdown_fence() {
        let wrapped = "```markdown\n# My Skill\n\nBody text\n```";
        assert_eq!(strip_code_fences(wrapped), "# My Skill\n\nBody text");
    }

    #[test]
    fn test_strip_bare_fence() {
        let wrapped = "```\n# My Skill\n```";
        assert_eq!(strip_code_fences(wrapped), "# My Skill");
    }

    #[test]
    fn test_unfenced_content_untouched() {
        let plain = "# My Skill\n\nBody with ```inline``` fence";
        assert_eq!(strip_code_fences(plain), plain);
    }

    #[tokio::test]
    async fn test_missing_binary_is_tool_not_found() {
        let extractor = ClaudeCliExtractor::new(&ExtractionSettings {
            command: "laere-no-such-binary".to_string(),
            ..Default::default()
        });

        let err = extractor.extract("prompt").await.unwrap_err();
        assert!(matches!(err, LaereError::ToolNotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_output_is_extraction_error() {
        // `true` exits 0 with no output
        let extractor = ClaudeCliExtractor::new(&ExtractionSettings {
            command: "true".to_string(),
            ..Default::default()
        });

        let err = extractor.extract("prompt").await.unwrap_err();
        assert!(matches!(err, LaereError::Extraction(_)));
    }
}
