//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::writer::SkillWriter;
use anyhow::Result;

/// Run the list command: re-scan the skills directory and print its contents.
pub fn run_list(settings: Settings) -> Result<()> {
    let writer = SkillWriter::new(settings.skills_dir(), &settings.writer);

    match writer.list_skills() {
        Ok(skills) => {
            if skills.is_empty() {
                Output::info("No skills extracted yet. Use 'laere extract <url>' to add some.");
            } else {
                Output::header(&format!("Skill Library ({})", skills.len()));
                println!();

                for skill in &skills {
                    Output::list_item(skill);
                }

                println!();
                Output::kv("Location", &writer.root().display().to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list skills: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
