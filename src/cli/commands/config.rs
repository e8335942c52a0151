//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, mut settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&settings)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            set_value(&mut settings, key, value)?;
            settings.save()?;
            Output::success(&format!("Set {} = {}", key, value));
            Output::info(&format!(
                "Saved to {}",
                Settings::default_config_path().display()
            ));
        }

        ConfigAction::Edit => {
            let config_path = Settings::default_config_path();

            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save()?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(&config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Apply a dotted-key assignment (e.g. `extraction.command`) to settings.
///
/// Keys mirror the TOML layout shown by `laere config show`.
fn set_value(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "general.skills_dir" => settings.general.skills_dir = value.to_string(),
        "general.temp_dir" => settings.general.temp_dir = value.to_string(),
        "general.log_level" => settings.general.log_level = value.to_string(),
        "source.playlist_limit" => settings.source.playlist_limit = parse(key, value)?,
        "source.subtitle_lang" => settings.source.subtitle_lang = value.to_string(),
        "extraction.command" => settings.extraction.command = value.to_string(),
        "extraction.timeout_seconds" => settings.extraction.timeout_seconds = parse(key, value)?,
        "extraction.max_transcript_chars" => {
            settings.extraction.max_transcript_chars = parse(key, value)?
        }
        "extraction.max_concurrent" => settings.extraction.max_concurrent = parse(key, value)?,
        "writer.overwrite" => settings.writer.overwrite = parse(key, value)?,
        "writer.max_name_len" => settings.writer.max_name_len = parse(key, value)?,
        "pipeline.max_concurrent_jobs" => {
            settings.pipeline.max_concurrent_jobs = parse(key, value)?
        }
        "prompts.custom_dir" => settings.prompts.custom_dir = Some(value.to_string()),
        _ => anyhow::bail!(
            "Unknown config key: {} (see 'laere config show' for available keys)",
            key
        ),
    }
    Ok(())
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid value for {}: {}", key, e))
}
