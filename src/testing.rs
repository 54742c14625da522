//! In-memory backend for unit tests.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{Result, StudioError};
use crate::genai::types::{
    GenerateVideoResponse, GeneratedSample, OperationError, OperationResponse,
};
use crate::genai::{FileState, GenAiBackend, GenerateVideosConfig, Operation, UploadedFile, VideoRef};
use crate::generation::PollPolicy;

pub(crate) fn fast_policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::ZERO,
        retry_delay: Duration::ZERO,
        max_retries: 5,
    }
}

#[derive(Default)]
struct Calls {
    submissions: Vec<(String, String, GenerateVideosConfig)>,
    polls: usize,
    successful_polls: usize,
    downloads: usize,
    uploads: Vec<PathBuf>,
    upload_contents: Vec<Vec<u8>>,
    file_checks: usize,
    prompts: Vec<(String, String)>,
}

/// Scripted stand-in for the remote service
#[derive(Default)]
pub(crate) struct FakeBackend {
    videos: usize,
    done_after: usize,
    failing_polls: HashSet<usize>,
    operation_error: Option<(i64, String)>,
    submit_fails: bool,
    upload_fails: bool,
    processing_checks: usize,
    reply: String,
    calls: Mutex<Calls>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            done_after: 1,
            ..Self::default()
        }
    }

    pub fn with_videos(mut self, count: usize) -> Self {
        self.videos = count;
        self
    }

    /// Operation reports done on this successful poll
    pub fn done_after(mut self, polls: usize) -> Self {
        self.done_after = polls;
        self
    }

    /// The first `count` polls fail
    pub fn failing_polls(self, count: usize) -> Self {
        let numbers: Vec<usize> = (1..=count).collect();
        self.failing_poll_numbers(&numbers)
    }

    /// Polls with these 1-based numbers fail
    pub fn failing_poll_numbers(mut self, numbers: &[usize]) -> Self {
        self.failing_polls = numbers.iter().copied().collect();
        self
    }

    pub fn with_operation_error(mut self, code: i64, message: &str) -> Self {
        self.operation_error = Some((code, message.to_string()));
        self
    }

    pub fn failing_submit(mut self) -> Self {
        self.submit_fails = true;
        self
    }

    pub fn failing_upload(mut self) -> Self {
        self.upload_fails = true;
        self
    }

    /// Uploaded files stay PROCESSING until this many state checks
    pub fn processing_checks(mut self, checks: usize) -> Self {
        self.processing_checks = checks;
        self
    }

    pub fn with_reply(mut self, reply: &str) -> Self {
        self.reply = reply.to_string();
        self
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap()
    }

    pub fn poll_count(&self) -> usize {
        self.calls().polls
    }

    pub fn download_count(&self) -> usize {
        self.calls().downloads
    }

    pub fn file_checks(&self) -> usize {
        self.calls().file_checks
    }

    pub fn submissions(&self) -> Vec<(String, String, GenerateVideosConfig)> {
        self.calls().submissions.clone()
    }

    pub fn uploaded_paths(&self) -> Vec<PathBuf> {
        self.calls().uploads.clone()
    }

    pub fn uploaded_contents(&self) -> Vec<Vec<u8>> {
        self.calls().upload_contents.clone()
    }

    /// (model, prompt) pairs sent for analysis
    pub fn content_prompts(&self) -> Vec<(String, String)> {
        self.calls().prompts.clone()
    }

    fn finished_operation(&self) -> Operation {
        let (response, error) = match &self.operation_error {
            Some((code, message)) => (
                None,
                Some(OperationError {
                    code: *code,
                    message: message.clone(),
                }),
            ),
            None => {
                let generated_samples = (0..self.videos)
                    .map(|i| GeneratedSample {
                        video: VideoRef {
                            uri: format!("https://fake.invalid/video-{}", i),
                            mime_type: Some("video/mp4".to_string()),
                        },
                    })
                    .collect();
                let response = OperationResponse {
                    generate_video_response: Some(GenerateVideoResponse {
                        generated_samples,
                        rai_media_filtered_reasons: Vec::new(),
                    }),
                };
                (Some(response), None)
            }
        };

        Operation {
            name: "models/fake/operations/1".to_string(),
            done: true,
            response,
            error,
        }
    }

    fn file(&self, state: FileState) -> UploadedFile {
        UploadedFile {
            name: "files/fake".to_string(),
            uri: "https://fake.invalid/files/fake".to_string(),
            mime_type: "video/mp4".to_string(),
            state,
        }
    }
}

#[async_trait]
impl GenAiBackend for FakeBackend {
    async fn generate_videos(
        &self,
        model: &str,
        prompt: &str,
        config: &GenerateVideosConfig,
    ) -> Result<Operation> {
        self.calls()
            .submissions
            .push((model.to_string(), prompt.to_string(), config.clone()));
        if self.submit_fails {
            return Err(StudioError::Api {
                status: 400,
                message: "bad request".to_string(),
            });
        }
        Ok(Operation {
            name: "models/fake/operations/1".to_string(),
            ..Operation::default()
        })
    }

    async fn get_operation(&self, operation: &Operation) -> Result<Operation> {
        let mut calls = self.calls();
        calls.polls += 1;
        if self.failing_polls.contains(&calls.polls) {
            return Err(StudioError::Api {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        calls.successful_polls += 1;
        if calls.successful_polls >= self.done_after {
            Ok(self.finished_operation())
        } else {
            Ok(operation.clone())
        }
    }

    async fn download_video(&self, video: &VideoRef) -> Result<Vec<u8>> {
        self.calls().downloads += 1;
        let name = video.uri.rsplit('/').next().unwrap_or_default();
        Ok(name.as_bytes().to_vec())
    }

    async fn upload_file(&self, path: &Path) -> Result<UploadedFile> {
        let contents = std::fs::read(path)?;
        {
            let mut calls = self.calls();
            calls.uploads.push(path.to_path_buf());
            calls.upload_contents.push(contents);
        }
        if self.upload_fails {
            return Err(StudioError::Api {
                status: 500,
                message: "upload failed".to_string(),
            });
        }
        let state = if self.processing_checks > 0 {
            FileState::Processing
        } else {
            FileState::Active
        };
        Ok(self.file(state))
    }

    async fn get_file(&self, _name: &str) -> Result<UploadedFile> {
        let mut calls = self.calls();
        calls.file_checks += 1;
        let state = if calls.file_checks < self.processing_checks {
            FileState::Processing
        } else {
            FileState::Active
        };
        Ok(self.file(state))
    }

    async fn generate_content(
        &self,
        model: &str,
        _file: &UploadedFile,
        prompt: &str,
    ) -> Result<String> {
        self.calls()
            .prompts
            .push((model.to_string(), prompt.to_string()));
        Ok(self.reply.clone())
    }
}
