pub mod extract;
pub mod prompt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use extract::extract_json;
pub use prompt::{build_prompt, PromptLanguage};

use crate::config::{ApiConfig, GenerationConfig};
use crate::error::{Result, StudioError};
use crate::genai::{FileState, GenAiBackend, UploadedFile};
use crate::generation::{GenerationOutcome, GenerationRequest, VideoGenerator};
use crate::session::{report, ProgressSink};

/// JSON object returned by the reference analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult {
    payload: Map<String, Value>,
}

impl AnalysisResult {
    pub fn new(payload: Map<String, Value>) -> Self {
        Self { payload }
    }

    /// Prompt to send to Veo instead of the user's own text
    pub fn refined_prompt(&self) -> Option<&str> {
        self.text("veo_prompt")
    }

    pub fn title(&self) -> Option<&str> {
        self.text("title")
    }

    pub fn description(&self) -> Option<&str> {
        self.text("description")
    }

    /// Tags as a list; models sometimes return one comma-separated string
    pub fn tags(&self) -> Vec<String> {
        match self.payload.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            Some(Value::String(joined)) => joined
                .split([',', '，'])
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn style_notes(&self) -> Option<String> {
        match self.payload.get("style_notes")? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()).filter(|s| !s.trim().is_empty()),
            other => Some(other.to_string()),
        }
    }

    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Result of analysis followed by generation
#[derive(Debug, Clone)]
pub struct ReferenceGeneration {
    pub outcome: GenerationOutcome,
    pub analysis: AnalysisResult,
    pub final_prompt: String,
}

/// Uploads reference videos for analysis and turns the analysis into a
/// refined generation prompt.
pub struct ReferenceAnalyzer {
    backend: Arc<dyn GenAiBackend>,
    generator: Arc<VideoGenerator>,
    model: String,
    scratch_dir: PathBuf,
    file_poll_interval: Duration,
    file_poll_limit: u32,
}

impl ReferenceAnalyzer {
    pub fn new(generator: Arc<VideoGenerator>, api: &ApiConfig, generation: &GenerationConfig) -> Self {
        Self {
            backend: generator.backend(),
            generator,
            model: api.analysis_model().to_string(),
            scratch_dir: generation.scratch_dir(),
            file_poll_interval: Duration::from_secs(2),
            file_poll_limit: 60,
        }
    }

    /// How often, and how many times, to check an upload that is still processing
    pub fn with_file_poll(mut self, interval: Duration, limit: u32) -> Self {
        self.file_poll_interval = interval;
        self.file_poll_limit = limit.max(1);
        self
    }

    pub async fn analyze_reference_video(
        &self,
        path: &Path,
        user_prompt: Option<&str>,
        language: PromptLanguage,
        progress: &dyn ProgressSink,
    ) -> Result<AnalysisResult> {
        if !path.is_file() {
            return Err(StudioError::ReferenceNotFound(path.to_path_buf()));
        }

        let uploaded = self.upload_reference(path, progress).await?;
        let uploaded = self.wait_until_active(uploaded).await?;

        let prompt = build_prompt(language, user_prompt);
        report(
            progress,
            "Analyzing reference video and generating copywriting...".to_string(),
        );
        let text = self
            .backend
            .generate_content(&self.model, &uploaded, &prompt)
            .await?;
        tracing::debug!("Analysis response: {}", text);

        Ok(AnalysisResult::new(extract_json(&text)?))
    }

    pub async fn generate_video_from_reference(
        &self,
        path: &Path,
        request: &GenerationRequest,
        language: PromptLanguage,
        progress: &dyn ProgressSink,
    ) -> Result<ReferenceGeneration> {
        let user_prompt = Some(request.prompt.trim()).filter(|p| !p.is_empty());
        let analysis = self
            .analyze_reference_video(path, user_prompt, language, progress)
            .await?;
        let (outcome, final_prompt) = self
            .generate_from_analysis(&analysis, request, progress)
            .await?;

        Ok(ReferenceGeneration {
            outcome,
            analysis,
            final_prompt,
        })
    }

    /// Generate with the analysis's refined prompt in place of `request.prompt`.
    ///
    /// Returns the outcome together with the prompt that was submitted.
    pub async fn generate_from_analysis(
        &self,
        analysis: &AnalysisResult,
        request: &GenerationRequest,
        progress: &dyn ProgressSink,
    ) -> Result<(GenerationOutcome, String)> {
        let final_prompt = analysis
            .refined_prompt()
            .ok_or(StudioError::MissingRefinedPrompt)?
            .to_string();
        report(progress, format!("Refined prompt: {}", final_prompt));

        let outcome = self
            .generator
            .generate_video(&request.with_prompt(final_prompt.clone()), progress)
            .await?;
        Ok((outcome, final_prompt))
    }

    /// Upload the reference, staging non-ASCII paths through an ASCII-named copy.
    ///
    /// The staging directory is removed when `staged` drops, whether or not
    /// the upload succeeded.
    async fn upload_reference(
        &self,
        path: &Path,
        progress: &dyn ProgressSink,
    ) -> Result<UploadedFile> {
        if path.to_str().is_some_and(str::is_ascii) {
            report(progress, format!("Uploading reference video: {}", path.display()));
            return self.backend.upload_file(path).await;
        }

        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        let staged = tempfile::Builder::new()
            .prefix("veo_reference_")
            .tempdir_in(&self.scratch_dir)?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty() && e.is_ascii())
            .unwrap_or("mp4");
        let upload_path = staged.path().join(format!(
            "reference_video_{}.{}",
            chrono::Utc::now().timestamp(),
            ext
        ));
        tokio::fs::copy(path, &upload_path).await?;

        report(
            progress,
            format!("Uploading reference video: {}", upload_path.display()),
        );
        let uploaded = self.backend.upload_file(&upload_path).await;
        drop(staged);
        uploaded
    }

    async fn wait_until_active(&self, mut file: UploadedFile) -> Result<UploadedFile> {
        let mut checks = 0u32;
        loop {
            match file.state {
                FileState::Active => return Ok(file),
                FileState::Failed => return Err(StudioError::FileProcessing(file.name)),
                FileState::Processing => {}
                // Older endpoints omit the state; treat the file as usable
                FileState::StateUnspecified | FileState::Unknown => return Ok(file),
            }

            if checks >= self.file_poll_limit {
                return Err(StudioError::FileProcessing(format!(
                    "{} still processing after {} checks",
                    file.name, checks
                )));
            }
            checks += 1;
            tracing::debug!("Waiting for {} to finish processing", file.name);
            tokio::time::sleep(self.file_poll_interval).await;
            file = self.backend.get_file(&file.name).await?;
        }
    }
}
