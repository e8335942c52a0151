//! Pipeline orchestrator for Laere.
//!
//! Turns one input URL into a queue of per-video jobs and runs each job
//! through its two external-process stages (transcript fetch, then skill
//! extraction) and the final write. The orchestrator is the only mutator of
//! job state; the presentation layer consumes read-only snapshots through
//! the event channel.

use crate::config::{Prompts, Settings};
use crate::error::{LaereError, Result};
use crate::extractor::{ClaudeCliExtractor, SkillExtractor};
use crate::job::{FailureReason, Job, JobSnapshot, JobStatus, StatusChange};
use crate::source::{VideoSource, YtDlpSource};
use crate::writer::{name_hint, SkillWriter};
use futures::StreamExt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tracing::{error, info, instrument, warn};

/// Progress events consumed by the presentation layer.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// URL resolution finished; one snapshot per pending job.
    RunStarted { jobs: Vec<JobSnapshot> },
    /// A job changed status.
    JobUpdated(JobSnapshot),
    /// The run ended (all jobs terminal, or cancelled).
    RunFinished(RunSummary),
}

/// Outcome of a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of jobs created.
    pub total: usize,
    /// Jobs that produced a skill on disk.
    pub written: usize,
    /// Jobs that failed.
    pub failed: usize,
    /// Whether the run was cancelled before completing.
    pub cancelled: bool,
}

/// The main orchestrator for the Laere pipeline.
pub struct Orchestrator {
    source: Arc<dyn VideoSource>,
    extractor: Arc<dyn SkillExtractor>,
    writer: Arc<SkillWriter>,
    settings: Settings,
    prompts: Prompts,
}

impl Orchestrator {
    /// Create a new orchestrator with the production adapters.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let source = Arc::new(YtDlpSource::new(&settings.source, settings.temp_dir()));
        let extractor = Arc::new(ClaudeCliExtractor::new(&settings.extraction));
        let writer = Arc::new(SkillWriter::new(settings.skills_dir(), &settings.writer));

        Ok(Self {
            source,
            extractor,
            writer,
            settings,
            prompts,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        source: Arc<dyn VideoSource>,
        extractor: Arc<dyn SkillExtractor>,
        writer: Arc<SkillWriter>,
    ) -> Self {
        Self {
            source,
            extractor,
            writer,
            settings,
            prompts,
        }
    }

    /// Get the skill writer (for listing the output directory).
    pub fn writer(&self) -> Arc<SkillWriter> {
        self.writer.clone()
    }

    /// Process one URL: resolve to jobs, run each job, emit status events.
    ///
    /// A resolution failure aborts the run before any job exists; failures
    /// after that are job-local and never abort the run. The cancel flag
    /// stops new external calls promptly and terminates in-flight children.
    #[instrument(skip(self, events, cancel), fields(url = %url))]
    pub async fn run(
        &self,
        url: &str,
        limit: Option<usize>,
        events: mpsc::Sender<PipelineEvent>,
        cancel: watch::Receiver<bool>,
    ) -> Result<RunSummary> {
        let limit = limit.unwrap_or(self.settings.source.playlist_limit);

        let mut resolve_cancel = cancel.clone();
        let videos = tokio::select! {
            res = self.source.list_videos(url, limit) => res?,
            _ = wait_cancelled(&mut resolve_cancel) => {
                let summary = RunSummary { cancelled: true, ..Default::default() };
                let _ = events.send(PipelineEvent::RunFinished(summary.clone())).await;
                return Ok(summary);
            }
        };

        if videos.is_empty() {
            info!("No videos found for {}", url);
            let summary = RunSummary::default();
            let _ = events.send(PipelineEvent::RunFinished(summary.clone())).await;
            return Ok(summary);
        }

        info!("Resolved {} video(s)", videos.len());
        let jobs: Vec<Job> = videos.into_iter().map(Job::new).collect();
        let total = jobs.len();

        let _ = events
            .send(PipelineEvent::RunStarted {
                jobs: jobs.iter().map(Job::snapshot).collect(),
            })
            .await;

        // AI calls are capped independently of job concurrency to respect
        // the external CLI's rate limits.
        let ai_permits = Arc::new(Semaphore::new(self.settings.extraction.max_concurrent.max(1)));
        let concurrency = self.settings.pipeline.max_concurrent_jobs.max(1);

        let jobs = if concurrency == 1 {
            self.run_sequential(jobs, &events, &cancel, &ai_permits).await
        } else {
            self.run_parallel(jobs, concurrency, &events, &cancel, &ai_permits)
                .await
        };

        let summary = RunSummary {
            total,
            written: jobs.iter().filter(|j| j.status() == JobStatus::Written).count(),
            failed: jobs.iter().filter(|j| j.status() == JobStatus::Failed).count(),
            cancelled: *cancel.borrow(),
        };

        info!(
            "Run finished: {} written, {} failed out of {}",
            summary.written, summary.failed, summary.total
        );
        let _ = events.send(PipelineEvent::RunFinished(summary.clone())).await;
        Ok(summary)
    }

    /// Process jobs one at a time, in enumeration order.
    async fn run_sequential(
        &self,
        jobs: Vec<Job>,
        events: &mpsc::Sender<PipelineEvent>,
        cancel: &watch::Receiver<bool>,
        ai_permits: &Arc<Semaphore>,
    ) -> Vec<Job> {
        let mut done = Vec::with_capacity(jobs.len());
        for mut job in jobs {
            // Cancelled runs leave remaining jobs unstarted
            if !*cancel.borrow() {
                self.process_job(&mut job, events, cancel, ai_permits).await;
            }
            done.push(job);
        }
        done
    }

    /// Process jobs with a bounded number in flight. Jobs still start in
    /// enumeration order and results come back in order.
    async fn run_parallel(
        &self,
        jobs: Vec<Job>,
        concurrency: usize,
        events: &mpsc::Sender<PipelineEvent>,
        cancel: &watch::Receiver<bool>,
        ai_permits: &Arc<Semaphore>,
    ) -> Vec<Job> {
        futures::stream::iter(jobs.into_iter().map(|mut job| async move {
            if !*cancel.borrow() {
                self.process_job(&mut job, events, cancel, ai_permits).await;
            }
            job
        }))
        .buffered(concurrency)
        .collect()
        .await
    }

    /// Run one job to a terminal state, recording any failure on the job.
    async fn process_job(
        &self,
        job: &mut Job,
        events: &mpsc::Sender<PipelineEvent>,
        cancel: &watch::Receiver<bool>,
        ai_permits: &Arc<Semaphore>,
    ) {
        if let Err(err) = self.run_stages(job, events, cancel, ai_permits).await {
            if matches!(err, LaereError::InvalidTransition { .. }) {
                // Transition table violation is a bug, not a job outcome
                error!("Job {}: {}", job.id, err);
                return;
            }

            warn!("Job {} failed: {}", job.id, err);
            let reason = FailureReason::from_error(&err);
            if job.advance(StatusChange::Failed(reason)).is_ok() {
                emit(events, job).await;
            }
        }
    }

    /// The three stages: transcript fetch, extraction, write. Any error
    /// short-circuits, so a transcript failure never reaches extraction.
    async fn run_stages(
        &self,
        job: &mut Job,
        events: &mpsc::Sender<PipelineEvent>,
        cancel: &watch::Receiver<bool>,
        ai_permits: &Arc<Semaphore>,
    ) -> Result<()> {
        job.advance(StatusChange::StartResolving)?;
        emit(events, job).await;

        let transcript = guarded(cancel, self.source.fetch_transcript(&job.video)).await?;
        job.advance(StatusChange::TranscriptReady(transcript))?;
        emit(events, job).await;

        job.advance(StatusChange::StartExtracting)?;
        emit(events, job).await;

        let prompt = self.prompts.extraction_prompt(
            &job.video.title,
            job.video.channel_name(),
            job.transcript().unwrap_or_default(),
            self.settings.extraction.max_transcript_chars,
        );

        let skill = {
            let _permit = ai_permits
                .acquire()
                .await
                .map_err(|_| LaereError::Extraction("extractor unavailable".to_string()))?;
            guarded(cancel, self.extractor.extract(&prompt)).await?
        };
        job.advance(StatusChange::Extracted(skill))?;
        emit(events, job).await;

        let body = job.skill_text().unwrap_or_default().to_string();
        let hint = name_hint(&body, &job.video.title).to_string();
        let path = self.writer.write(&hint, &body, &job.video.url)?;
        job.advance(StatusChange::Written(path))?;
        emit(events, job).await;

        Ok(())
    }
}

/// Send a snapshot event, ignoring a departed receiver.
async fn emit(events: &mpsc::Sender<PipelineEvent>, job: &Job) {
    let _ = events.send(PipelineEvent::JobUpdated(job.snapshot())).await;
}

/// Race a pipeline stage against cancellation. On cancel the stage future
/// is dropped, which kills any in-flight child process (kill_on_drop).
async fn guarded<T>(
    cancel: &watch::Receiver<bool>,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    let mut cancel = cancel.clone();
    tokio::select! {
        res = fut => res,
        _ = wait_cancelled(&mut cancel) => Err(LaereError::ToolFailed("run cancelled".to_string())),
    }
}

/// Resolve when the cancel flag flips to true. A dropped sender means
/// cancellation can no longer happen, so pend forever instead.
async fn wait_cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|c| *c).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WriterSettings;
    use crate::source::VideoRef;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        videos: Vec<VideoRef>,
        /// Video IDs whose transcript fetch fails, and how.
        failures: HashMap<String, FailureMode>,
        /// Video ID whose fetch never completes; signals when it starts.
        blocked: Option<(String, Arc<tokio::sync::Notify>)>,
        fetch_calls: AtomicUsize,
    }

    #[derive(Clone, Copy)]
    enum FailureMode {
        NoTranscript,
        ToolCrash,
    }

    impl FakeSource {
        fn new(videos: Vec<VideoRef>) -> Self {
            Self {
                videos,
                failures: HashMap::new(),
                blocked: None,
                fetch_calls: AtomicUsize::new(0),
            }
        }

        fn failing(mut self, id: &str, mode: FailureMode) -> Self {
            self.failures.insert(id.to_string(), mode);
            self
        }

        fn blocking(mut self, id: &str, started: Arc<tokio::sync::Notify>) -> Self {
            self.blocked = Some((id.to_string(), started));
            self
        }
    }

    #[async_trait]
    impl VideoSource for FakeSource {
        async fn list_videos(&self, input: &str, _limit: usize) -> Result<Vec<VideoRef>> {
            if input == "bad-url" {
                return Err(LaereError::Resolution("unsupported URL".to_string()));
            }
            Ok(self.videos.clone())
        }

        async fn fetch_transcript(&self, video: &VideoRef) -> Result<String> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            if let Some((id, started)) = &self.blocked {
                if *id == video.id {
                    started.notify_one();
                    std::future::pending::<()>().await;
                }
            }
            match self.failures.get(&video.id) {
                Some(FailureMode::NoTranscript) => Err(LaereError::TranscriptUnavailable(
                    format!("no captions for '{}'", video.title),
                )),
                Some(FailureMode::ToolCrash) => {
                    Err(LaereError::ToolFailed("yt-dlp crashed".to_string()))
                }
                None => Ok(format!("transcript for {}", video.id)),
            }
        }

        fn can_handle(&self, _input: &str) -> bool {
            true
        }
    }

    struct FakeExtractor {
        calls: AtomicUsize,
    }

    impl FakeExtractor {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SkillExtractor for FakeExtractor {
        async fn extract(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            // Echo enough of the prompt to assert composition happened
            Ok(format!("# Extracted Skill\n\nprompt was {} chars", prompt.len()))
        }
    }

    fn videos(n: usize) -> Vec<VideoRef> {
        (0..n)
            .map(|i| VideoRef {
                id: format!("video-{:02}", i),
                url: format!("https://www.youtube.com/watch?v=video-{:02}", i),
                title: format!("Video {}", i),
                channel: Some("Channel".to_string()),
                duration_seconds: Some(60),
            })
            .collect()
    }

    struct Harness {
        orchestrator: Orchestrator,
        source: Arc<FakeSource>,
        extractor: Arc<FakeExtractor>,
        _skills_dir: tempfile::TempDir,
    }

    fn harness(source: FakeSource) -> Harness {
        let skills_dir = tempfile::tempdir().unwrap();
        let source = Arc::new(source);
        let extractor = Arc::new(FakeExtractor::new());
        let writer = Arc::new(SkillWriter::new(
            skills_dir.path().to_path_buf(),
            &WriterSettings::default(),
        ));

        let orchestrator = Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            source.clone(),
            extractor.clone(),
            writer,
        );

        Harness {
            orchestrator,
            source,
            extractor,
            _skills_dir: skills_dir,
        }
    }

    async fn run_collecting(
        h: &Harness,
        url: &str,
        cancel: watch::Receiver<bool>,
    ) -> (Result<RunSummary>, Vec<PipelineEvent>) {
        let (tx, mut rx) = mpsc::channel(256);
        let result = h.orchestrator.run(url, None, tx, cancel).await;

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        (result, events)
    }

    fn never_cancel() -> watch::Receiver<bool> {
        let (_tx, rx) = watch::channel(false);
        rx
    }

    #[tokio::test]
    async fn test_all_jobs_reach_terminal_state() {
        let h = harness(FakeSource::new(videos(4)));

        let (result, events) = run_collecting(&h, "playlist", never_cancel()).await;
        let summary = result.unwrap();

        assert_eq!(summary.total, 4);
        assert_eq!(summary.written, 4);
        assert_eq!(summary.failed, 0);
        assert!(!summary.cancelled);

        let started = events.iter().find_map(|e| match e {
            PipelineEvent::RunStarted { jobs } => Some(jobs.len()),
            _ => None,
        });
        assert_eq!(started, Some(4));
    }

    #[tokio::test]
    async fn test_resolution_failure_creates_no_jobs() {
        let h = harness(FakeSource::new(videos(2)));

        let (result, events) = run_collecting(&h, "bad-url", never_cancel()).await;

        assert!(matches!(result, Err(LaereError::Resolution(_))));
        assert!(events.is_empty());
        assert_eq!(h.source.fetch_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_transcript_never_reaches_extraction() {
        let h = harness(
            FakeSource::new(videos(1)).failing("video-00", FailureMode::NoTranscript),
        );

        let (result, events) = run_collecting(&h, "single", never_cancel()).await;
        let summary = result.unwrap();

        assert_eq!(summary.failed, 1);
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);

        // Status sequence is Pending -> ResolvingTranscript -> Failed
        let statuses: Vec<JobStatus> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::JobUpdated(s) => Some(s.status),
                _ => None,
            })
            .collect();
        assert_eq!(
            statuses,
            vec![JobStatus::ResolvingTranscript, JobStatus::Failed]
        );

        // Failure reason distinguishes "no transcript" from a tool crash
        let failed = events
            .iter()
            .find_map(|e| match e {
                PipelineEvent::JobUpdated(s) if s.status == JobStatus::Failed => {
                    s.error.clone()
                }
                _ => None,
            })
            .unwrap();
        assert_eq!(failed.kind, crate::job::FailureKind::NoTranscript);
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_abort_run() {
        let h = harness(
            FakeSource::new(videos(3)).failing("video-01", FailureMode::ToolCrash),
        );

        let (result, events) = run_collecting(&h, "playlist", never_cancel()).await;
        let summary = result.unwrap();

        assert_eq!(summary.written, 2);
        assert_eq!(summary.failed, 1);

        // Jobs were processed in enumeration order
        let first_touch: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::JobUpdated(s)
                    if s.status == JobStatus::ResolvingTranscript =>
                {
                    Some(s.id.clone())
                }
                _ => None,
            })
            .collect();
        assert_eq!(first_touch, vec!["video-00", "video-01", "video-02"]);
    }

    #[tokio::test]
    async fn test_cancel_stops_new_work() {
        let h = harness(FakeSource::new(videos(5)));

        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let (result, _events) = run_collecting(&h, "playlist", rx).await;
        let summary = result.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.written, 0);
        assert_eq!(h.source.fetch_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_kills_in_flight_and_skips_rest() {
        let started = Arc::new(tokio::sync::Notify::new());
        let h = harness(FakeSource::new(videos(3)).blocking("video-00", started.clone()));

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (tx, mut rx) = mpsc::channel(256);

        // Flip the flag only once the first fetch is actually in flight
        let run = h.orchestrator.run("playlist", None, tx, cancel_rx);
        let canceller = async {
            started.notified().await;
            cancel_tx.send(true).unwrap();
        };
        let (result, ()) = tokio::join!(run, canceller);
        let summary = result.unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.written, 0);
        assert_eq!(summary.failed, 1);

        // Only the in-flight job touched the source; later jobs never start
        assert_eq!(h.source.fetch_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.extractor.calls.load(Ordering::SeqCst), 0);

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        let failed_ids: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::JobUpdated(s) if s.status == JobStatus::Failed => {
                    Some(s.id.clone())
                }
                _ => None,
            })
            .collect();
        assert_eq!(failed_ids, vec!["video-00"]);
    }

    #[tokio::test]
    async fn test_rerun_appends_suffix_instead_of_overwriting() {
        let h = harness(FakeSource::new(videos(1)));

        let (first, _) = run_collecting(&h, "single", never_cancel()).await;
        let (second, events) = run_collecting(&h, "single", never_cancel()).await;

        assert_eq!(first.unwrap().written, 1);
        assert_eq!(second.unwrap().written, 1);

        let path = events
            .iter()
            .find_map(|e| match e {
                PipelineEvent::JobUpdated(s) if s.status == JobStatus::Written => {
                    s.output_path.clone()
                }
                _ => None,
            })
            .unwrap();
        assert!(path.to_string_lossy().contains("extracted-skill-2"));
    }

    #[tokio::test]
    async fn test_written_skill_contains_source_url() {
        let h = harness(FakeSource::new(videos(1)));

        let (_, events) = run_collecting(&h, "single", never_cancel()).await;
        let path = events
            .iter()
            .find_map(|e| match e {
                PipelineEvent::JobUpdated(s) if s.status == JobStatus::Written => {
                    s.output_path.clone()
                }
                _ => None,
            })
            .unwrap();

        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("https://www.youtube.com/watch?v=video-00"));
    }
}
