//! yt-dlp video source implementation.
//!
//! All network work is delegated to yt-dlp; this module only spawns it,
//! classifies its exit, and parses its `--dump-json` output.

use super::{parse_vtt, VideoRef, VideoSource};
use crate::config::SourceSettings;
use crate::error::{LaereError, Result};
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Video source backed by the yt-dlp CLI.
pub struct YtDlpSource {
    video_id_regex: Regex,
    subtitle_lang: String,
    temp_dir: PathBuf,
}

impl YtDlpSource {
    pub fn new(settings: &SourceSettings, temp_dir: PathBuf) -> Self {
        // Matches various YouTube URL formats and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            (?:
                # Full YouTube URLs
                (?:https?://)?
                (?:www\.)?
                (?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/|youtube\.com/v/)
                ([a-zA-Z0-9_-]{11})
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self {
            video_id_regex,
            subtitle_lang: settings.subtitle_lang.clone(),
            temp_dir,
        }
    }

    /// Extract video ID from a YouTube URL or bare ID.
    fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        // Try group 1 (URL format) then group 2 (bare ID)
        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Whether the input names a collection of videos rather than one.
    fn is_playlist_input(input: &str) -> bool {
        input.contains("youtube.com/playlist")
            || input.contains("list=")
            || input.contains("youtube.com/channel")
            || input.contains("youtube.com/@")
            || input.contains("youtube.com/c/")
            || input.contains("youtube.com/user/")
    }

    /// Resolve a single video URL to a VideoRef via `--dump-json`.
    async fn resolve_single(&self, video_id: &str) -> Result<VideoRef> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = run_ytdlp(&["--dump-json", "--no-download", "--no-warnings", &url]).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LaereError::Resolution(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        let json: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| {
            LaereError::Resolution(format!("Failed to parse yt-dlp output: {}", e))
        })?;

        Ok(video_ref_from_json(&json, video_id, &url))
    }

    /// Enumerate a playlist or channel via `--flat-playlist`.
    async fn resolve_playlist(&self, input: &str, limit: usize) -> Result<Vec<VideoRef>> {
        let limit_str = limit.to_string();

        let output = run_ytdlp(&[
            "--dump-json",
            "--no-download",
            "--no-warnings",
            "--flat-playlist",
            "--playlist-end",
            &limit_str,
            input,
        ])
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LaereError::Resolution(format!(
                "Failed to list videos: {}",
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut videos = Vec::new();

        for line in stdout.lines() {
            if line.trim().is_empty() {
                continue;
            }

            if let Ok(json) = serde_json::from_str::<serde_json::Value>(line) {
                let id = json["id"]
                    .as_str()
                    .or_else(|| json["url"].as_str())
                    .map(|s| self.extract_video_id(s).unwrap_or_else(|| s.to_string()));

                if let Some(video_id) = id {
                    let url = format!("https://www.youtube.com/watch?v={}", video_id);
                    videos.push(video_ref_from_json(&json, &video_id, &url));
                }
            }
        }

        Ok(videos)
    }

    /// Run one subtitle download attempt and return any .vtt file produced.
    async fn download_captions(
        &self,
        url: &str,
        output_template: &str,
        sub_flag: &str,
        dir: &Path,
    ) -> Result<Option<PathBuf>> {
        let output = run_ytdlp(&[
            sub_flag,
            "--sub-lang",
            &self.subtitle_lang,
            "--skip-download",
            "--no-warnings",
            "--output",
            output_template,
            url,
        ])
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LaereError::ToolFailed(format!(
                "yt-dlp subtitle fetch failed: {}",
                stderr.trim()
            )));
        }

        Ok(find_vtt_file(dir)?)
    }
}

#[async_trait]
impl VideoSource for YtDlpSource {
    #[instrument(skip(self))]
    async fn list_videos(&self, input: &str, limit: usize) -> Result<Vec<VideoRef>> {
        if !self.can_handle(input) {
            return Err(LaereError::Resolution(format!(
                "Not a recognized YouTube URL or video ID: {}",
                input
            )));
        }

        if Self::is_playlist_input(input) {
            info!("Enumerating playlist/channel: {}", input);
            self.resolve_playlist(input, limit).await
        } else {
            let video_id = self.extract_video_id(input).ok_or_else(|| {
                LaereError::Resolution(format!("Could not extract video ID from: {}", input))
            })?;
            debug!("Resolving single video {}", video_id);
            Ok(vec![self.resolve_single(&video_id).await?])
        }
    }

    #[instrument(skip(self, video), fields(video_id = %video.id))]
    async fn fetch_transcript(&self, video: &VideoRef) -> Result<String> {
        std::fs::create_dir_all(&self.temp_dir)?;
        let caption_dir = tempfile::Builder::new()
            .prefix("captions-")
            .tempdir_in(&self.temp_dir)?;

        let template = caption_dir.path().join("transcript");
        let template = template.to_string_lossy().to_string();

        // Manual subtitles first (highest quality), then auto-generated
        let mut vtt = self
            .download_captions(&video.url, &template, "--write-sub", caption_dir.path())
            .await?;

        if vtt.is_none() {
            debug!("No manual subtitles, trying auto-generated");
            vtt = self
                .download_captions(&video.url, &template, "--write-auto-sub", caption_dir.path())
                .await?;
        }

        let vtt_path = vtt.ok_or_else(|| {
            LaereError::TranscriptUnavailable(format!(
                "no {} captions for '{}'",
                self.subtitle_lang, video.title
            ))
        })?;

        let content = std::fs::read_to_string(&vtt_path)?;
        let text = parse_vtt(&content);

        if text.is_empty() {
            return Err(LaereError::TranscriptUnavailable(format!(
                "caption track for '{}' is empty",
                video.title
            )));
        }

        info!("Fetched transcript ({} chars)", text.len());
        Ok(text)
    }

    fn can_handle(&self, input: &str) -> bool {
        self.extract_video_id(input).is_some() || Self::is_playlist_input(input)
    }
}

/// Spawn yt-dlp, mapping a missing binary to `ToolNotFound`.
async fn run_ytdlp(args: &[&str]) -> Result<std::process::Output> {
    let result = Command::new("yt-dlp")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    match result {
        Ok(output) => Ok(output),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(LaereError::ToolNotFound("yt-dlp".to_string()))
        }
        Err(e) => Err(LaereError::ToolFailed(format!(
            "yt-dlp execution failed: {}",
            e
        ))),
    }
}

/// Locate a downloaded .vtt file in the caption directory.
fn find_vtt_file(dir: &Path) -> Result<Option<PathBuf>> {
    for entry in std::fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "vtt") {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Build a VideoRef from a yt-dlp JSON object.
fn video_ref_from_json(json: &serde_json::Value, video_id: &str, url: &str) -> VideoRef {
    let title = json["title"]
        .as_str()
        .unwrap_or("Unknown Title")
        .to_string();

    let channel = json["channel"]
        .as_str()
        .or_else(|| json["uploader"].as_str())
        .map(|s| s.to_string());

    VideoRef {
        id: video_id.to_string(),
        url: url.to_string(),
        title,
        channel,
        duration_seconds: json["duration"].as_f64().map(|d| d as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> YtDlpSource {
        YtDlpSource::new(&SourceSettings::default(), std::env::temp_dir())
    }

    #[test]
    fn test_extract_video_id() {
        let source = source();

        assert_eq!(
            source.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );

        assert_eq!(source.extract_video_id("not-a-video-id"), None);
        assert_eq!(source.extract_video_id(""), None);
    }

    #[test]
    fn test_playlist_detection() {
        assert!(YtDlpSource::is_playlist_input(
            "https://youtube.com/playlist?list=PLtest"
        ));
        assert!(YtDlpSource::is_playlist_input("https://youtube.com/@rustconf"));
        assert!(!YtDlpSource::is_playlist_input(
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        ));
    }

    #[test]
    fn test_can_handle() {
        let source = source();

        assert!(source.can_handle("dQw4w9WgXcQ"));
        assert!(source.can_handle("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(source.can_handle("https://youtube.com/playlist?list=PLtest"));
        assert!(!source.can_handle("/path/to/video.mp4"));
    }

    #[test]
    fn test_video_ref_from_json() {
        let json: serde_json::Value = serde_json::json!({
            "title": "Intro to Ownership",
            "channel": "FerrisTV",
            "duration": 312.4,
        });

        let video = video_ref_from_json(&json, "dQw4w9WgXcQ", "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(video.title, "Intro to Ownership");
        assert_eq!(video.channel.as_deref(), Some("FerrisTV"));
        assert_eq!(video.duration_seconds, Some(312));
    }

    #[test]
    fn test_video_ref_defaults() {
        let json = serde_json::json!({});
        let video = video_ref_from_json(&json, "abc", "https://www.youtube.com/watch?v=abc");
        assert_eq!(video.title, "Unknown Title");
        assert!(video.channel.is_none());
        assert_eq!(video.channel_name(), "Unknown");
    }
}
