use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tokio_util::io::ReaderStream;

use super::types::{GenerateVideosConfig, Operation, UploadedFile};
use super::{video_mime_type, GenAiBackend, VideoRef};
use crate::config::Config;
use crate::error::{Result, StudioError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const API_VERSION: &str = "v1beta";

/// Gemini REST client for Veo jobs, file uploads and content generation
#[derive(Clone)]
pub struct GenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenAiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let api_key = config.api_key()?.to_string();

        let mut builder = reqwest::Client::builder();
        if let Some(proxy) = config.api.proxy() {
            tracing::info!("Using proxy: {}", proxy);
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| StudioError::Config(format!("Invalid proxy URL {}: {}", proxy, e)))?;
            builder = builder.proxy(proxy);
        }
        let http = builder.build()?;

        let base_url = match config.api.base_url() {
            Some(url) => {
                tracing::info!("Using custom GenAI base URL: {}", url);
                url.trim_end_matches('/').to_string()
            }
            None => DEFAULT_BASE_URL.to_string(),
        };

        Ok(Self {
            http,
            api_key,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, API_VERSION, path)
    }

    /// Turn a non-2xx response into an API error, keeping the service message
    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorEnvelope>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        Err(StudioError::Api { status, message })
    }
}

/// Stream a file from disk as a request body, with its length for the upload headers
async fn file_body(path: &Path) -> Result<(reqwest::Body, u64)> {
    let file = tokio::fs::File::open(path).await?;
    let length = file.metadata().await?.len();
    Ok((reqwest::Body::wrap_stream(ReaderStream::new(file)), length))
}

#[async_trait]
impl GenAiBackend for GenAiClient {
    async fn generate_videos(
        &self,
        model: &str,
        prompt: &str,
        config: &GenerateVideosConfig,
    ) -> Result<Operation> {
        let url = self.api_url(&format!("models/{}:predictLongRunning", model));
        let body = json!({
            "instances": [{ "prompt": prompt }],
            "parameters": config,
        });
        tracing::debug!("Submitting generation to {}", url);
        tracing::trace!("Request body: {}", body);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let operation: Operation = Self::check(response).await?.json().await?;
        tracing::debug!("Operation started: {}", operation.name);
        Ok(operation)
    }

    async fn get_operation(&self, operation: &Operation) -> Result<Operation> {
        let response = self
            .http
            .get(self.api_url(&operation.name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn download_video(&self, video: &VideoRef) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(&video.uri)
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        let bytes = Self::check(response).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn upload_file(&self, path: &Path) -> Result<UploadedFile> {
        let (body, length) = file_body(path).await?;
        let mime_type = video_mime_type(path);
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "reference_video".to_string());

        // Resumable protocol: the start call hands back the URL for the bytes
        let start = self
            .http
            .post(format!("{}/upload/{}/files", self.base_url, API_VERSION))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", length.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = Self::check(start).await?;

        let upload_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| StudioError::Api {
                status: start.status().as_u16(),
                message: "Upload session did not return an upload URL".to_string(),
            })?;

        tracing::debug!("Uploading {} bytes as {}", length, mime_type);
        let response = self
            .http
            .post(&upload_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .header(reqwest::header::CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await?;
        let uploaded: UploadResponse = Self::check(response).await?.json().await?;
        Ok(uploaded.file)
    }

    async fn get_file(&self, name: &str) -> Result<UploadedFile> {
        let response = self
            .http
            .get(self.api_url(name))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    async fn generate_content(
        &self,
        model: &str,
        file: &UploadedFile,
        prompt: &str,
    ) -> Result<String> {
        let url = self.api_url(&format!("models/{}:generateContent", model));
        let body = json!({
            "contents": [{
                "role": "user",
                "parts": [
                    { "file_data": { "mime_type": file.mime_type, "file_uri": file.uri } },
                    { "text": prompt }
                ]
            }]
        });

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let response: serde_json::Value = Self::check(response).await?.json().await?;

        let text: String = response["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            let reason = response["promptFeedback"]["blockReason"]
                .as_str()
                .or_else(|| response["candidates"][0]["finishReason"].as_str())
                .unwrap_or("no text returned");
            return Err(StudioError::JsonExtraction(format!(
                "Empty response from {}: {}",
                model, reason
            )));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: Option<&str>) -> Config {
        let mut config = Config::default();
        config.api.api_key = Some("test-key".to_string());
        config.api.base_url = base_url.map(str::to_string);
        config
    }

    #[test]
    fn test_default_base_url() {
        let client = GenAiClient::new(&config(None)).unwrap();
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
        assert_eq!(
            client.api_url("operations/1"),
            "https://generativelanguage.googleapis.com/v1beta/operations/1"
        );
    }

    #[test]
    fn test_custom_base_url_is_trimmed() {
        let client = GenAiClient::new(&config(Some(" https://relay.example.com/ "))).unwrap();
        assert_eq!(client.base_url(), "https://relay.example.com");
    }

    #[tokio::test]
    async fn test_upload_body_streams_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, vec![7u8; 4096]).unwrap();

        let (body, length) = file_body(&path).await.unwrap();
        assert_eq!(length, 4096);
        assert!(body.as_bytes().is_none());

        let err = file_body(&dir.path().join("missing.mp4")).await.unwrap_err();
        assert!(matches!(err, StudioError::Io(_)));
    }

    #[test]
    fn test_requires_valid_config() {
        let mut bad = config(None);
        bad.api.api_key = None;
        assert!(GenAiClient::new(&bad).is_err());
    }
}
