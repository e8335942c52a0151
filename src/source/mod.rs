//! Video source abstraction for Laere.
//!
//! Provides a trait-based interface over the external downloader so the
//! pipeline can be tested without spawning processes.

mod vtt;
mod ytdlp;

pub use vtt::parse_vtt;
pub use ytdlp::YtDlpSource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Reference to a single video, produced by URL resolution.
///
/// Immutable after creation; the pipeline never mutates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRef {
    /// Video ID.
    pub id: String,
    /// Canonical watch URL.
    pub url: String,
    /// Title (falls back to "Unknown Title" when the lister omits it).
    pub title: String,
    /// Channel or uploader name (if available).
    pub channel: Option<String>,
    /// Duration in seconds (if known).
    pub duration_seconds: Option<u32>,
}

impl VideoRef {
    /// Channel name for display and prompting.
    pub fn channel_name(&self) -> &str {
        self.channel.as_deref().unwrap_or("Unknown")
    }
}

/// Trait for video providers.
///
/// `list_videos` and `fetch_transcript` are independent calls with no shared
/// mutable state, safe to run concurrently against different inputs.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Resolve an input URL to one or more videos.
    ///
    /// A single-video URL yields exactly one entry; a channel or playlist
    /// URL enumerates up to `limit` videos in playlist order.
    async fn list_videos(&self, input: &str, limit: usize) -> Result<Vec<VideoRef>>;

    /// Fetch the plain-text transcript for a video.
    ///
    /// Returns `TranscriptUnavailable` when the video has no caption track,
    /// distinguished from tool failures.
    async fn fetch_transcript(&self, video: &VideoRef) -> Result<String>;

    /// Check if this source can handle the given input.
    fn can_handle(&self, input: &str) -> bool;
}
