//! Background jobs for interactive front-ends.
//!
//! A front-end hands a request to [`spawn_generation`] or
//! [`spawn_reference_generation`] and keeps its own loop responsive by
//! draining the returned [`Job`]'s events. Input should be re-enabled once a
//! terminal event arrives.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::analysis::{AnalysisResult, PromptLanguage, ReferenceAnalyzer};
use crate::error::Result;
use crate::generation::{GenerationOutcome, GenerationRequest, VideoGenerator};

/// Receives human-readable progress lines while a request runs
pub trait ProgressSink: Send + Sync {
    fn log(&self, line: &str);
}

/// Discards progress lines; tracing output is unaffected
pub struct Quiet;

impl ProgressSink for Quiet {
    fn log(&self, _line: &str) {}
}

/// Log at info level and forward the same line to the sink
pub(crate) fn report(progress: &dyn ProgressSink, line: String) {
    tracing::info!("{}", line);
    progress.log(&line);
}

impl ProgressSink for mpsc::UnboundedSender<StudioEvent> {
    fn log(&self, line: &str) {
        // A closed receiver only means nobody is watching anymore
        let _ = self.send(StudioEvent::Log(line.to_string()));
    }
}

#[derive(Debug, Clone)]
pub enum StudioEvent {
    Log(String),
    /// Reference analysis finished; generation continues
    Analysis(AnalysisResult),
    Finished(PathBuf),
    NoResult,
    Failed(String),
}

impl StudioEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StudioEvent::Finished(_) | StudioEvent::NoResult | StudioEvent::Failed(_)
        )
    }

    fn from_outcome(outcome: GenerationOutcome) -> Self {
        match outcome {
            GenerationOutcome::Saved(path) => StudioEvent::Finished(path),
            GenerationOutcome::NoVideos => StudioEvent::NoResult,
        }
    }
}

/// One in-flight request
pub struct Job {
    events: mpsc::UnboundedReceiver<StudioEvent>,
    handle: JoinHandle<()>,
}

impl Job {
    /// Next event, or `None` once the worker has finished and all events are read
    pub async fn next_event(&mut self) -> Option<StudioEvent> {
        self.events.recv().await
    }

    /// Non-blocking poll for frame-driven front-ends
    pub fn try_next_event(&mut self) -> Option<StudioEvent> {
        self.events.try_recv().ok()
    }

    /// Drain events into `on_event` until the terminal one, returning it
    pub async fn run_to_end(mut self, mut on_event: impl FnMut(&StudioEvent)) -> StudioEvent {
        while let Some(event) = self.events.recv().await {
            on_event(&event);
            if event.is_terminal() {
                let _ = self.handle.await;
                return event;
            }
        }

        // The worker can only end without a terminal event if it panicked
        let message = match self.handle.await {
            Err(e) => format!("Worker stopped unexpectedly: {}", e),
            Ok(()) => "Worker stopped without a result".to_string(),
        };
        let event = StudioEvent::Failed(message);
        on_event(&event);
        event
    }
}

pub fn spawn_generation(generator: Arc<VideoGenerator>, request: GenerationRequest) -> Job {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let event = match generator.generate_video(&request, &tx).await {
            Ok(outcome) => StudioEvent::from_outcome(outcome),
            Err(e) => {
                tracing::error!("An error occurred during video generation: {}", e);
                StudioEvent::Failed(e.to_string())
            }
        };
        let _ = tx.send(event);
    });

    Job { events: rx, handle }
}

/// Analyse a reference video, then generate from its refined prompt.
///
/// `request.prompt` is the user's own text for the analysis template; the
/// other parameters are used as-is for generation.
pub fn spawn_reference_generation(
    analyzer: Arc<ReferenceAnalyzer>,
    reference: PathBuf,
    language: PromptLanguage,
    request: GenerationRequest,
) -> Job {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        let event = match run_reference(&analyzer, &reference, language, &request, &tx).await {
            Ok(outcome) => StudioEvent::from_outcome(outcome),
            Err(e) => {
                tracing::error!("Reference generation failed: {}", e);
                StudioEvent::Failed(e.to_string())
            }
        };
        let _ = tx.send(event);
    });

    Job { events: rx, handle }
}

/// Publishes the analysis as soon as it is available, so it survives a
/// failed generation.
async fn run_reference(
    analyzer: &ReferenceAnalyzer,
    reference: &Path,
    language: PromptLanguage,
    request: &GenerationRequest,
    tx: &mpsc::UnboundedSender<StudioEvent>,
) -> Result<GenerationOutcome> {
    let user_prompt = Some(request.prompt.trim()).filter(|p| !p.is_empty());
    let analysis = analyzer
        .analyze_reference_video(reference, user_prompt, language, tx)
        .await?;
    let _ = tx.send(StudioEvent::Analysis(analysis.clone()));

    let (outcome, _) = analyzer.generate_from_analysis(&analysis, request, tx).await?;
    Ok(outcome)
}
