use serde::{Deserialize, Serialize};

/// Parameters block of a `predictLongRunning` request.
///
/// Optional fields are left out of the JSON entirely when unset; the service
/// treats an explicit empty value differently from an absent one.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideosConfig {
    pub aspect_ratio: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
}

/// Long-running operation handle returned by the video endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<OperationResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<OperationError>,
}

impl Operation {
    /// Videos produced by a finished operation, in service order
    pub fn generated_videos(&self) -> Vec<&VideoRef> {
        self.response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref())
            .map(|r| r.generated_samples.iter().map(|s| &s.video).collect())
            .unwrap_or_default()
    }

    /// Reasons given when the safety filter removed outputs
    pub fn filtered_reasons(&self) -> &[String] {
        self.response
            .as_ref()
            .and_then(|r| r.generate_video_response.as_ref())
            .map(|r| r.rai_media_filtered_reasons.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSample {
    pub video: VideoRef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoRef {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// File stored through the Files API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub name: String,
    pub uri: String,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub state: FileState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileState {
    #[default]
    StateUnspecified,
    Processing,
    Active,
    Failed,
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_config_omits_unset_fields() {
        let config = GenerateVideosConfig {
            aspect_ratio: "16:9".to_string(),
            negative_prompt: None,
            seed: None,
        };
        assert_eq!(
            serde_json::to_value(&config).unwrap(),
            json!({ "aspectRatio": "16:9" })
        );
    }

    #[test]
    fn test_operation_from_service_json() {
        let op: Operation = serde_json::from_value(json!({
            "name": "models/veo-3.1-generate-preview/operations/abc123",
            "done": true,
            "response": {
                "@type": "type.googleapis.com/google.ai.generativelanguage.v1beta.PredictLongRunningResponse",
                "generateVideoResponse": {
                    "generatedSamples": [
                        { "video": { "uri": "https://example.com/v1beta/files/x:download?alt=media" } }
                    ]
                }
            }
        }))
        .unwrap();

        assert!(op.done);
        let videos = op.generated_videos();
        assert_eq!(videos.len(), 1);
        assert!(videos[0].uri.ends_with("alt=media"));
    }

    #[test]
    fn test_pending_operation_has_no_videos() {
        let op: Operation = serde_json::from_value(json!({ "name": "operations/1" })).unwrap();
        assert!(!op.done);
        assert!(op.generated_videos().is_empty());
        assert!(op.filtered_reasons().is_empty());
    }

    #[test]
    fn test_file_state_tolerates_new_values() {
        let file: UploadedFile = serde_json::from_value(json!({
            "name": "files/abc",
            "uri": "https://example.com/files/abc",
            "mimeType": "video/mp4",
            "state": "ARCHIVED"
        }))
        .unwrap();
        assert_eq!(file.state, FileState::Unknown);
    }
}
