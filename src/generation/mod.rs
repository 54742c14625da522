pub mod request;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use request::{AspectRatio, GenerationRequest, PersonGeneration, MAX_SEED};

use crate::config::{GenerationConfig, ModelStore};
use crate::error::{Result, StudioError};
use crate::genai::{GenAiBackend, Operation};
use crate::session::{report, ProgressSink};

/// How a pending operation is polled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Wait before every status fetch
    pub interval: Duration,
    /// Extra wait after a failed fetch
    pub retry_delay: Duration,
    /// Consecutive failed fetches tolerated before giving up
    pub max_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            retry_delay: Duration::from_secs(2),
            max_retries: 5,
        }
    }
}

/// Result of a finished generation that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Saved(PathBuf),
    /// The job finished but the service produced nothing to download
    NoVideos,
}

impl GenerationOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            GenerationOutcome::Saved(path) => Some(path),
            GenerationOutcome::NoVideos => None,
        }
    }
}

/// Submits Veo jobs, waits for them and saves the first produced video
pub struct VideoGenerator {
    backend: Arc<dyn GenAiBackend>,
    models: ModelStore,
    output_dir: PathBuf,
    policy: PollPolicy,
}

impl VideoGenerator {
    pub fn new(backend: Arc<dyn GenAiBackend>, models: ModelStore, config: &GenerationConfig) -> Self {
        Self {
            backend,
            models,
            output_dir: config.output_dir.clone(),
            policy: config.poll_policy(),
        }
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn backend(&self) -> Arc<dyn GenAiBackend> {
        Arc::clone(&self.backend)
    }

    pub async fn generate_video(
        &self,
        request: &GenerationRequest,
        progress: &dyn ProgressSink,
    ) -> Result<GenerationOutcome> {
        request.validate()?;

        report(
            progress,
            format!("Starting video generation with prompt: '{}'", request.prompt),
        );

        let config = request.to_config();
        if request.person_generation != PersonGeneration::default() {
            tracing::debug!(
                "person_generation={} is not supported by the current models; not sent",
                request.person_generation
            );
        }

        // Read at submission time so a selection change applies to the next job
        let model = self.models.current_model()?;
        tracing::debug!("Using model {}", model);

        let operation = self
            .backend
            .generate_videos(&model, &request.prompt, &config)
            .await?;
        report(
            progress,
            "Video generation request submitted. Waiting for completion...".to_string(),
        );

        let operation = self.wait_for_completion(operation, progress).await?;
        self.save_result(&operation, progress).await
    }

    async fn wait_for_completion(
        &self,
        mut operation: Operation,
        progress: &dyn ProgressSink,
    ) -> Result<Operation> {
        let mut failures = 0u32;

        while !operation.done {
            tokio::time::sleep(self.policy.interval).await;
            match self.backend.get_operation(&operation).await {
                Ok(updated) => {
                    operation = updated;
                    failures = 0;
                    report(progress, "Status: Processing...".to_string());
                }
                Err(e) => {
                    failures += 1;
                    let line = format!(
                        "Network error during polling (attempt {}/{}): {}",
                        failures, self.policy.max_retries, e
                    );
                    tracing::warn!("{}", line);
                    progress.log(&line);
                    if failures >= self.policy.max_retries {
                        tracing::error!("Max retries exceeded. Aborting.");
                        progress.log("Max retries exceeded. Aborting.");
                        return Err(e);
                    }
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
            }
        }

        Ok(operation)
    }

    async fn save_result(
        &self,
        operation: &Operation,
        progress: &dyn ProgressSink,
    ) -> Result<GenerationOutcome> {
        if let Some(error) = &operation.error {
            return Err(StudioError::Operation {
                code: error.code,
                message: error.message.clone(),
            });
        }

        let videos = operation.generated_videos();
        let Some(video) = videos.first() else {
            let filtered = operation.filtered_reasons();
            if !filtered.is_empty() {
                tracing::warn!("Outputs filtered: {}", filtered.join("; "));
            }
            tracing::warn!("No videos were generated.");
            progress.log("No videos were generated.");
            return Ok(GenerationOutcome::NoVideos);
        };

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let filename = self.output_dir.join(format!(
            "generated_video_{}.mp4",
            chrono::Utc::now().timestamp()
        ));

        report(progress, format!("Downloading video to {}...", filename.display()));
        let bytes = self.backend.download_video(video).await?;
        tokio::fs::write(&filename, bytes).await?;

        report(progress, format!("Video saved successfully: {}", filename.display()));
        Ok(GenerationOutcome::Saved(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Quiet;
    use crate::testing::{fast_policy, FakeBackend};

    fn generator(backend: Arc<FakeBackend>, dir: &Path) -> VideoGenerator {
        let config = GenerationConfig {
            output_dir: dir.join("output"),
            ..GenerationConfig::default()
        };
        VideoGenerator::new(backend, ModelStore::new(dir.join("config.toml")), &config)
            .with_policy(fast_policy())
    }

    #[tokio::test]
    async fn test_saves_first_video() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new().with_videos(2).done_after(2));
        let outcome = generator(backend.clone(), dir.path())
            .generate_video(&GenerationRequest::new("a red fox"), &Quiet)
            .await
            .unwrap();

        let path = outcome.path().expect("video saved").to_path_buf();
        assert!(path.starts_with(dir.path().join("output")));
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("generated_video_") && name.ends_with(".mp4"));
        assert_eq!(std::fs::read(&path).unwrap(), b"video-0");
        assert_eq!(backend.poll_count(), 2);
    }

    #[tokio::test]
    async fn test_recovers_from_fewer_than_max_failures() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new().with_videos(1).failing_polls(4));
        let outcome = generator(backend.clone(), dir.path())
            .generate_video(&GenerationRequest::new("waves"), &Quiet)
            .await
            .unwrap();

        assert!(matches!(outcome, GenerationOutcome::Saved(_)));
        assert_eq!(backend.poll_count(), 5);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_consecutive_failures() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new().with_videos(1).failing_polls(50));
        let err = generator(backend.clone(), dir.path())
            .generate_video(&GenerationRequest::new("waves"), &Quiet)
            .await
            .unwrap_err();

        assert!(matches!(err, StudioError::Api { status: 503, .. }));
        assert_eq!(backend.poll_count(), 5);
        assert!(!dir.path().join("output").exists());
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let dir = tempfile::tempdir().unwrap();
        // Failures 1-3 and 5-8 around a successful poll never reach five in a row
        let backend = Arc::new(
            FakeBackend::new()
                .with_videos(1)
                .failing_poll_numbers(&[1, 2, 3, 5, 6, 7, 8])
                .done_after(3),
        );
        let outcome = generator(backend.clone(), dir.path())
            .generate_video(&GenerationRequest::new("waves"), &Quiet)
            .await
            .unwrap();

        assert!(matches!(outcome, GenerationOutcome::Saved(_)));
        assert_eq!(backend.poll_count(), 10);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new().with_videos(0));
        let outcome = generator(backend.clone(), dir.path())
            .generate_video(&GenerationRequest::new("nothing"), &Quiet)
            .await
            .unwrap();

        assert_eq!(outcome, GenerationOutcome::NoVideos);
        assert_eq!(backend.download_count(), 0);
    }

    #[tokio::test]
    async fn test_remote_operation_error_fails() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new().with_operation_error(3, "quota exhausted"));
        let err = generator(backend, dir.path())
            .generate_video(&GenerationRequest::new("waves"), &Quiet)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "OPERATION_FAILED");
        assert!(err.to_string().contains("quota exhausted"));
    }

    #[tokio::test]
    async fn test_submission_failure_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new().failing_submit());
        let err = generator(backend.clone(), dir.path())
            .generate_video(&GenerationRequest::new("waves"), &Quiet)
            .await
            .unwrap_err();

        assert!(matches!(err, StudioError::Api { status: 400, .. }));
        assert_eq!(backend.submissions().len(), 1);
        assert_eq!(backend.poll_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected_before_submission() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let err = generator(backend.clone(), dir.path())
            .generate_video(&GenerationRequest::new("  "), &Quiet)
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(backend.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_seed_is_rejected_before_submission() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new());
        let request = GenerationRequest::new("waves").with_seed(Some(u32::MAX));
        let err = generator(backend.clone(), dir.path())
            .generate_video(&request, &Quiet)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INVALID_SEED");
        assert!(backend.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_submits_current_model_and_omits_empty_fields() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeBackend::new().with_videos(1));
        let generator = generator(backend.clone(), dir.path());

        ModelStore::new(dir.path().join("config.toml"))
            .set_current_model("veo-3.0-fast-generate-001")
            .unwrap();

        let request = GenerationRequest::new("city at night")
            .with_negative_prompt(Some(String::new()))
            .with_person_generation(PersonGeneration::DontAllow);
        generator.generate_video(&request, &Quiet).await.unwrap();

        let submissions = backend.submissions();
        assert_eq!(submissions.len(), 1);
        let (model, prompt, config) = &submissions[0];
        assert_eq!(model, "veo-3.0-fast-generate-001");
        assert_eq!(prompt, "city at night");
        let value = serde_json::to_value(config).unwrap();
        assert_eq!(value, serde_json::json!({ "aspectRatio": "16:9" }));
    }
}
