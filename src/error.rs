use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StudioError>;

#[derive(Error, Debug)]
pub enum StudioError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    #[error("Reference video not found: {}", .0.display())]
    ReferenceNotFound(PathBuf),

    #[error("Unknown model: {0} (add a [[models]] entry to the config file before selecting it)")]
    UnknownModel(String),

    #[error("Seed {0} is out of range (0..={max})", max = crate::generation::MAX_SEED)]
    InvalidSeed(u32),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Video generation failed ({code}): {message}")]
    Operation { code: i64, message: String },

    #[error("Uploaded file was not processed: {0}")]
    FileProcessing(String),

    #[error("Failed to parse JSON from model response: {0}")]
    JsonExtraction(String),

    #[error("Model response missing 'veo_prompt'")]
    MissingRefinedPrompt,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse config: {0}")]
    TomlRead(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

/// Error code for JSON output
impl StudioError {
    pub fn code(&self) -> &'static str {
        match self {
            StudioError::Config(_) => "CONFIG_ERROR",
            StudioError::EmptyPrompt => "EMPTY_PROMPT",
            StudioError::ReferenceNotFound(_) => "REFERENCE_NOT_FOUND",
            StudioError::UnknownModel(_) => "UNKNOWN_MODEL",
            StudioError::InvalidSeed(_) => "INVALID_SEED",
            StudioError::Api { .. } => "API_ERROR",
            StudioError::Operation { .. } => "OPERATION_FAILED",
            StudioError::FileProcessing(_) => "FILE_PROCESSING",
            StudioError::JsonExtraction(_) => "JSON_EXTRACTION",
            StudioError::MissingRefinedPrompt => "MISSING_REFINED_PROMPT",
            StudioError::Http(_) => "HTTP_ERROR",
            StudioError::Io(_) => "IO_ERROR",
            StudioError::Json(_) => "JSON_ERROR",
            StudioError::TomlRead(_) => "CONFIG_PARSE_ERROR",
            StudioError::TomlWrite(_) => "CONFIG_WRITE_ERROR",
        }
    }

    /// Errors the user can fix by changing their input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StudioError::EmptyPrompt
                | StudioError::ReferenceNotFound(_)
                | StudioError::UnknownModel(_)
                | StudioError::InvalidSeed(_)
        )
    }
}
