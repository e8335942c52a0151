//! Configuration settings for Laere.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub source: SourceSettings,
    pub extraction: ExtractionSettings,
    pub writer: WriterSettings,
    pub pipeline: PipelineSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory where extracted skills are written. This is the root the
    /// skill-loading system scans, so the layout must stay one directory
    /// per skill with a SKILL.md inside.
    pub skills_dir: String,
    /// Directory for temporary files (caption downloads).
    pub temp_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            skills_dir: "~/.claude/skills".to_string(),
            temp_dir: "/tmp/laere".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Video source (yt-dlp) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Maximum number of videos to enumerate from a channel or playlist.
    pub playlist_limit: usize,
    /// Subtitle language requested from yt-dlp.
    pub subtitle_lang: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            playlist_limit: 50,
            subtitle_lang: "en".to_string(),
        }
    }
}

/// AI extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    /// The AI CLI command to invoke (must support non-interactive `-p` mode).
    pub command: String,
    /// Timeout for a single extraction call, in seconds.
    pub timeout_seconds: u64,
    /// Transcripts longer than this are truncated before prompting.
    pub max_transcript_chars: usize,
    /// Maximum concurrent AI CLI calls when jobs run in parallel.
    pub max_concurrent: usize,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            command: "claude".to_string(),
            timeout_seconds: 300, // long transcripts take a while
            max_transcript_chars: 100_000,
            max_concurrent: 1,
        }
    }
}

/// Skill writer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterSettings {
    /// Overwrite an existing skill directory instead of appending a suffix.
    pub overwrite: bool,
    /// Maximum length of a derived skill directory name.
    pub max_name_len: usize,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            overwrite: false,
            max_name_len: 50,
        }
    }
}

/// Pipeline scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Number of jobs processed concurrently. 1 = strictly sequential.
    pub max_concurrent_jobs: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 1,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> crate::error::Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::LaereError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("laere")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded skills directory path.
    pub fn skills_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.skills_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.extraction.command, "claude");
        assert_eq!(settings.extraction.timeout_seconds, 300);
        assert_eq!(settings.pipeline.max_concurrent_jobs, 1);
        assert!(!settings.writer.overwrite);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [extraction]
            command = "my-llm"
            "#,
        )
        .unwrap();
        assert_eq!(settings.extraction.command, "my-llm");
        assert_eq!(settings.extraction.max_transcript_chars, 100_000);
        assert_eq!(settings.source.playlist_limit, 50);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.writer.overwrite = true;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert!(loaded.writer.overwrite);
    }
}
