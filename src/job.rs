//! Job model for Laere.
//!
//! A job tracks one video's progress through the pipeline. Status and
//! payload fields only change together through [`Job::advance`], which
//! enforces the transition table, so a `TranscriptReady` job always has a
//! transcript and a `Failed` job always has a failure reason.

use crate::error::{LaereError, Result};
use crate::source::VideoRef;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lifecycle state of a job.
///
/// `Written` and `Failed` are terminal; `Failed` is reachable from any
/// non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    ResolvingTranscript,
    TranscriptReady,
    Extracting,
    Extracted,
    Written,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Written | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::ResolvingTranscript => "fetching transcript",
            JobStatus::TranscriptReady => "transcript ready",
            JobStatus::Extracting => "extracting",
            JobStatus::Extracted => "extracted",
            JobStatus::Written => "written",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// Broad classification of a job failure, so the display layer can
/// distinguish "no transcript" from "tool crashed" from "write failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NoTranscript,
    Tool,
    Timeout,
    Extraction,
    Write,
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReason {
    pub kind: FailureKind,
    pub message: String,
}

impl FailureReason {
    /// Classify a pipeline error into a job failure reason.
    pub fn from_error(err: &LaereError) -> Self {
        let kind = match err {
            LaereError::TranscriptUnavailable(_) => FailureKind::NoTranscript,
            LaereError::Timeout { .. } => FailureKind::Timeout,
            LaereError::Extraction(_) => FailureKind::Extraction,
            LaereError::Write(_) => FailureKind::Write,
            _ => FailureKind::Tool,
        };
        Self {
            kind,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A requested status change, carrying the payload that the target state
/// requires.
#[derive(Debug, Clone)]
pub enum StatusChange {
    StartResolving,
    TranscriptReady(String),
    StartExtracting,
    Extracted(String),
    Written(PathBuf),
    Failed(FailureReason),
}

impl StatusChange {
    fn target(&self) -> JobStatus {
        match self {
            StatusChange::StartResolving => JobStatus::ResolvingTranscript,
            StatusChange::TranscriptReady(_) => JobStatus::TranscriptReady,
            StatusChange::StartExtracting => JobStatus::Extracting,
            StatusChange::Extracted(_) => JobStatus::Extracted,
            StatusChange::Written(_) => JobStatus::Written,
            StatusChange::Failed(_) => JobStatus::Failed,
        }
    }
}

/// One video's unit of work.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub video: VideoRef,
    status: JobStatus,
    transcript: Option<String>,
    skill_text: Option<String>,
    error: Option<FailureReason>,
    output_path: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(video: VideoRef) -> Self {
        let now = Utc::now();
        Self {
            id: video.id.clone(),
            video,
            status: JobStatus::Pending,
            transcript: None,
            skill_text: None,
            error: None,
            output_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn transcript(&self) -> Option<&str> {
        self.transcript.as_deref()
    }

    pub fn skill_text(&self) -> Option<&str> {
        self.skill_text.as_deref()
    }

    pub fn error(&self) -> Option<&FailureReason> {
        self.error.as_ref()
    }

    pub fn output_path(&self) -> Option<&PathBuf> {
        self.output_path.as_ref()
    }

    /// Apply a status change, rejecting anything outside the allowed table.
    pub fn advance(&mut self, change: StatusChange) -> Result<()> {
        let to = change.target();
        if !transition_allowed(self.status, to) {
            return Err(LaereError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }

        match change {
            StatusChange::StartResolving | StatusChange::StartExtracting => {}
            StatusChange::TranscriptReady(text) => self.transcript = Some(text),
            StatusChange::Extracted(text) => self.skill_text = Some(text),
            StatusChange::Written(path) => self.output_path = Some(path),
            StatusChange::Failed(reason) => self.error = Some(reason),
        }

        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Read-only copy of the job's display state for the UI boundary.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            title: self.video.title.clone(),
            url: self.video.url.clone(),
            status: self.status,
            error: self.error.clone(),
            output_path: self.output_path.clone(),
        }
    }
}

/// Forward-only transition table. Terminal states have no exits.
fn transition_allowed(from: JobStatus, to: JobStatus) -> bool {
    use JobStatus::*;
    matches!(
        (from, to),
        (Pending, ResolvingTranscript)
            | (ResolvingTranscript, TranscriptReady)
            | (TranscriptReady, Extracting)
            | (Extracting, Extracted)
            | (Extracted, Written)
    ) || (to == Failed && !from.is_terminal())
}

/// Immutable view of a job for rendering. The presentation layer never
/// holds a reference into live pipeline state.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub id: String,
    pub title: String,
    pub url: String,
    pub status: JobStatus,
    pub error: Option<FailureReason>,
    pub output_path: Option<PathBuf>,
}
