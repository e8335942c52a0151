//! Skill persistence for Laere.
//!
//! Writes extracted skills under the skills root, one directory per skill
//! with a single SKILL.md inside. The layout is what the skill-loading
//! system discovers, so the directory name is the skill identifier and the
//! file name is fixed.

use crate::config::WriterSettings;
use crate::error::{LaereError, Result};
use regex::Regex;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// The markdown file name inside each skill directory.
pub const SKILL_FILE: &str = "SKILL.md";

/// Writes skill artifacts to the skills directory.
pub struct SkillWriter {
    root: PathBuf,
    overwrite: bool,
    max_name_len: usize,
}

impl SkillWriter {
    pub fn new(root: PathBuf, settings: &WriterSettings) -> Self {
        Self {
            root,
            overwrite: settings.overwrite,
            max_name_len: settings.max_name_len,
        }
    }

    /// Derive a kebab-case skill name from a title hint.
    ///
    /// Deterministic: the same hint always produces the same name.
    pub fn skill_name(&self, hint: &str) -> String {
        let mut name = hint.to_lowercase();

        // Drop filler the video title carries but the skill name shouldn't
        let prefix = Regex::new(r"^(how to|how i|my|the|a|an)\s+").expect("Invalid regex");
        let suffix =
            Regex::new(r"\s+(tutorial|guide|explained|walkthrough)$").expect("Invalid regex");
        name = prefix.replace(&name, "").to_string();
        name = suffix.replace(&name, "").to_string();

        let strip = Regex::new(r"[^a-z0-9\s-]+").expect("Invalid regex");
        let collapse = Regex::new(r"[\s-]+").expect("Invalid regex");
        name = strip.replace_all(&name, "").to_string();
        name = collapse.replace_all(&name, "-").to_string();
        name = name.trim_matches('-').to_string();

        if name.len() > self.max_name_len {
            let truncated = &name[..self.max_name_len];
            // Cut at the last separator so no word is chopped mid-way
            name = match truncated.rfind('-') {
                Some(idx) => truncated[..idx].to_string(),
                None => truncated.to_string(),
            };
        }

        if name.is_empty() {
            "extracted-skill".to_string()
        } else {
            name
        }
    }

    /// Write a skill document, returning the path of the markdown file.
    ///
    /// The directory name is derived from `hint`; when it already exists a
    /// numeric suffix (`-2`, `-3`, ...) is probed instead of overwriting,
    /// unless overwrite mode is configured. Name resolution and directory
    /// creation happen as one atomic step (`create_dir` fails if the name
    /// is taken), so concurrent writers cannot race on the same name.
    #[instrument(skip(self, body), fields(hint = %hint))]
    pub fn write(&self, hint: &str, body: &str, source_url: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.root).map_err(write_err)?;

        let name = self.skill_name(hint);
        let skill_dir = self.claim_dir(&name)?;

        let content = render_skill(&name, body, source_url);
        let skill_path = skill_dir.join(SKILL_FILE);

        // Publish atomically: the consumer never sees a half-written file
        let mut tmp = tempfile::NamedTempFile::new_in(&skill_dir).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        tmp.persist(&skill_path)
            .map_err(|e| LaereError::Write(e.to_string()))?;

        info!("Wrote skill to {}", skill_path.display());
        Ok(skill_path)
    }

    /// Create the skill directory, resolving name collisions.
    fn claim_dir(&self, name: &str) -> Result<PathBuf> {
        if self.overwrite {
            let dir = self.root.join(name);
            std::fs::create_dir_all(&dir).map_err(write_err)?;
            return Ok(dir);
        }

        let mut candidate = name.to_string();
        let mut counter = 1u32;

        loop {
            let dir = self.root.join(&candidate);
            match std::fs::create_dir(&dir) {
                Ok(()) => return Ok(dir),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    counter += 1;
                    candidate = format!("{}-{}", name, counter);
                    debug!("Skill name taken, trying {}", candidate);
                }
                Err(e) => return Err(write_err(e)),
            }
        }
    }

    /// List existing skill names under the root, sorted.
    pub fn list_skills(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut skills = Vec::new();
        for entry in std::fs::read_dir(&self.root)?.flatten() {
            let path = entry.path();
            if path.is_dir() && path.join(SKILL_FILE).exists() {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    skills.push(name.to_string());
                }
            }
        }

        skills.sort();
        Ok(skills)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Pick the name hint for a skill: the extracted document's own top-level
/// heading when present, otherwise the video title.
pub fn name_hint<'a>(body: &'a str, title: &'a str) -> &'a str {
    body.lines()
        .find_map(|line| line.strip_prefix("# ").map(str::trim))
        .filter(|h| !h.is_empty())
        .unwrap_or(title)
}

/// Compose the SKILL.md document: title line, source attribution, body.
fn render_skill(name: &str, body: &str, source_url: &str) -> String {
    format!(
        "# {}\n\n> Source: {}\n\n{}\n",
        display_title(name),
        source_url,
        body.trim_end()
    )
}

/// Turn a kebab-case name back into a display title.
fn display_title(name: &str) -> String {
    name.split('-')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_err(e: std::io::Error) -> LaereError {
    LaereError::Write(e.to_string())
}
