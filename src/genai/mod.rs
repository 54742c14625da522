//! Remote generative-media service.
//!
//! The video and analysis clients only talk to the service through
//! [`GenAiBackend`], so the polling and upload flows can be driven by an
//! in-memory backend in tests.

pub mod client;
pub mod types;

use async_trait::async_trait;
use std::path::Path;

pub use client::GenAiClient;
pub use types::{
    FileState, GenerateVideosConfig, Operation, OperationError, UploadedFile, VideoRef,
};

use crate::error::Result;

#[async_trait]
pub trait GenAiBackend: Send + Sync {
    /// Start a video generation job
    async fn generate_videos(
        &self,
        model: &str,
        prompt: &str,
        config: &GenerateVideosConfig,
    ) -> Result<Operation>;

    /// Fetch the latest state of a job
    async fn get_operation(&self, operation: &Operation) -> Result<Operation>;

    /// Download the bytes of a produced video
    async fn download_video(&self, video: &VideoRef) -> Result<Vec<u8>>;

    async fn upload_file(&self, path: &Path) -> Result<UploadedFile>;

    async fn get_file(&self, name: &str) -> Result<UploadedFile>;

    /// Ask a multimodal model about an uploaded file, returning its text reply
    async fn generate_content(
        &self,
        model: &str,
        file: &UploadedFile,
        prompt: &str,
    ) -> Result<String>;
}

/// MIME type for an uploaded video, from its extension
pub fn video_mime_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mov") => "video/quicktime",
        Some("webm") => "video/webm",
        Some("avi") => "video/x-msvideo",
        Some("mkv") => "video/x-matroska",
        Some("mpeg") | Some("mpg") => "video/mpeg",
        Some("wmv") => "video/x-ms-wmv",
        Some("3gp") => "video/3gpp",
        Some("flv") => "video/x-flv",
        _ => "video/mp4",
    }
}
