//! Extract command implementation.
//!
//! Drives the pipeline as a background task and renders its events, so the
//! terminal stays responsive (Ctrl-C cancels) while external tools run.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::job::JobStatus;
use crate::orchestrator::{Orchestrator, PipelineEvent, RunSummary};
use anyhow::Result;
use console::style;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

/// Run the extract command.
pub async fn run_extract(
    url: &str,
    limit: Option<usize>,
    jobs: Option<usize>,
    overwrite: bool,
    mut settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(&settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'laere doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    if overwrite {
        settings.writer.overwrite = true;
    }
    if let Some(jobs) = jobs {
        settings.pipeline.max_concurrent_jobs = jobs.max(1);
    }

    let orchestrator = Arc::new(Orchestrator::new(settings)?);

    let (event_tx, mut event_rx) = mpsc::channel(64);
    let (cancel_tx, cancel_rx) = watch::channel(false);

    let run_url = url.to_string();
    let run_orchestrator = orchestrator.clone();
    let run_task = tokio::spawn(async move {
        run_orchestrator.run(&run_url, limit, event_tx, cancel_rx).await
    });

    let spinner = Output::spinner(&format!("Resolving {}...", url));
    let mut resolving = true;
    let mut renderer = EventRenderer::default();

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                match event {
                    Some(event) => {
                        if resolving {
                            spinner.finish_and_clear();
                            resolving = false;
                        }
                        renderer.render(event);
                    }
                    // Channel closed: the run is over
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                Output::warning("Cancelling... finishing in-flight work");
                let _ = cancel_tx.send(true);
            }
        }
    }
    if resolving {
        spinner.finish_and_clear();
    }

    let summary = run_task.await??;
    print_summary(&summary);

    if summary.failed > 0 && summary.written == 0 && !summary.cancelled {
        anyhow::bail!("no skills were extracted");
    }
    Ok(())
}

/// Renders pipeline events as per-job status lines.
#[derive(Default)]
struct EventRenderer {
    total: usize,
    positions: HashMap<String, usize>,
}

impl EventRenderer {
    fn render(&mut self, event: PipelineEvent) {
        match event {
            PipelineEvent::RunStarted { jobs } => {
                self.total = jobs.len();
                for (idx, job) in jobs.iter().enumerate() {
                    self.positions.insert(job.id.clone(), idx + 1);
                }
                Output::info(&format!("Found {} video(s) to process", self.total));
                println!();
            }
            PipelineEvent::JobUpdated(snapshot) => {
                let position = self.positions.get(&snapshot.id).copied().unwrap_or(0);
                let detail = match snapshot.status {
                    JobStatus::ResolvingTranscript => {
                        style("fetching transcript...").dim().to_string()
                    }
                    JobStatus::TranscriptReady => style("transcript ready").dim().to_string(),
                    JobStatus::Extracting => style("extracting skill...").dim().to_string(),
                    JobStatus::Extracted => style("skill extracted").dim().to_string(),
                    JobStatus::Written => {
                        let path = snapshot
                            .output_path
                            .as_ref()
                            .map(|p| p.display().to_string())
                            .unwrap_or_default();
                        format!("{} {}", style("written").green(), style(path).dim())
                    }
                    JobStatus::Failed => {
                        let reason = snapshot
                            .error
                            .as_ref()
                            .map(|e| e.message.clone())
                            .unwrap_or_else(|| "unknown error".to_string());
                        style(format!("failed: {}", reason)).red().to_string()
                    }
                    JobStatus::Pending => style("pending").dim().to_string(),
                };
                Output::job_status(position, self.total, &snapshot.title, &detail);
            }
            PipelineEvent::RunFinished(_) => {}
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    if summary.cancelled {
        Output::warning(&format!(
            "Run cancelled: {} written, {} failed, {} not started",
            summary.written,
            summary.failed,
            summary.total - summary.written - summary.failed
        ));
    } else if summary.failed > 0 {
        Output::warning(&format!(
            "Done: {} skill(s) written, {} failed",
            summary.written, summary.failed
        ));
    } else {
        Output::success(&format!("Done: {} skill(s) written", summary.written));
    }
}
