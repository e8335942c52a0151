//! Prompt templates for Laere.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Sentinel the model outputs when a video contains nothing worth extracting.
pub const NO_SKILL_SENTINEL: &str = "NO_SKILL_FOUND";

/// Collection of all prompt templates.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub extraction: ExtractionPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}

/// Prompts for skill extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionPrompts {
    pub user: String,
}

impl Default for ExtractionPrompts {
    fn default() -> Self {
        Self {
            user: r#"You are analyzing a YouTube video transcript to extract actionable skills, methodologies, and techniques that can be turned into a reusable skill for an AI coding assistant.

A skill is a markdown file (SKILL.md) that teaches the assistant how to perform a specific task. Skills should be:
- Actionable and specific
- Have clear step-by-step instructions
- Include examples where helpful
- Be reusable across different contexts

VIDEO TITLE: {{title}}
CHANNEL: {{channel}}

TRANSCRIPT:
{{transcript}}

---

Based on this video, extract the most valuable skill or methodology being taught. If the video covers multiple distinct skills, focus on the primary/most important one.

Output a complete SKILL.md file in this format:

```markdown
# [Skill Name]

[One paragraph description of what this skill does and when to use it]

## When to Use This Skill

- [Bullet points of scenarios when this skill applies]

## Instructions

[Step-by-step instructions for the assistant to follow when using this skill. Be specific and actionable.]

### Step 1: [Step Name]
[Details]

### Step 2: [Step Name]
[Details]

[Continue as needed]

## Examples

[Optional: Include 1-2 concrete examples if they help clarify the skill]

## Tips

- [Any important tips, gotchas, or best practices mentioned in the video]
```

Only output the markdown content, nothing else. If the video doesn't contain any actionable skill or methodology worth extracting, output: NO_SKILL_FOUND"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let extraction_path = custom_path.join("extraction.toml");
            if extraction_path.exists() {
                let content = std::fs::read_to_string(&extraction_path)?;
                prompts.extraction = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Compose the full extraction prompt for one video transcript.
    ///
    /// Transcripts longer than `max_transcript_chars` are truncated so the
    /// prompt stays within the model's context.
    pub fn extraction_prompt(
        &self,
        title: &str,
        channel: &str,
        transcript: &str,
        max_transcript_chars: usize,
    ) -> String {
        let transcript = truncate_transcript(transcript, max_transcript_chars);

        let mut vars = std::collections::HashMap::new();
        vars.insert("title".to_string(), title.to_string());
        vars.insert("channel".to_string(), channel.to_string());
        vars.insert("transcript".to_string(), transcript);

        self.render_with_custom(&self.extraction.user, &vars)
    }
}

/// Truncate a transcript at a char boundary, marking the cut.
fn truncate_transcript(transcript: &str, max_chars: usize) -> String {
    if transcript.chars().count() <= max_chars {
        return transcript.to_string();
    }

    let cut: String = transcript.chars().take(max_chars).collect();
    format!("{}\n\n[Transcript truncated...]", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.extraction.user.contains("{{transcript}}"));
        assert!(prompts.extraction.user.contains(NO_SKILL_SENTINEL));
    }

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = std::collections::HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_extraction_prompt_substitutes_metadata() {
        let prompts = Prompts::default();
        let prompt = prompts.extraction_prompt("Rust Tips", "FerrisTV", "some words", 1000);
        assert!(prompt.contains("VIDEO TITLE: Rust Tips"));
        assert!(prompt.contains("CHANNEL: FerrisTV"));
        assert!(prompt.contains("some words"));
    }

    #[test]
    fn test_long_transcript_is_truncated() {
        let prompts = Prompts::default();
        let transcript = "x".repeat(200);
        let prompt = prompts.extraction_prompt("T", "C", &transcript, 100);
        assert!(prompt.contains("[Transcript truncated...]"));
        assert!(!prompt.contains(&"x".repeat(101)));
    }

    #[test]
    fn test_short_transcript_untouched() {
        assert_eq!(truncate_transcript("short", 100), "short");
    }
}
