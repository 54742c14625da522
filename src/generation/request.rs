use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StudioError;
use crate::genai::GenerateVideosConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            other => Err(format!(
                "Invalid aspect ratio: {}. Expected 16:9 or 9:16",
                other
            )),
        }
    }
}

/// Whether people may appear in the output.
///
/// Accepted and carried on every request, but the current Veo preview
/// models reject the field, so it is not sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonGeneration {
    #[default]
    AllowAdult,
    DontAllow,
}

impl PersonGeneration {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonGeneration::AllowAdult => "allow_adult",
            PersonGeneration::DontAllow => "dont_allow",
        }
    }
}

impl fmt::Display for PersonGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersonGeneration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "allow_adult" => Ok(PersonGeneration::AllowAdult),
            "dont_allow" => Ok(PersonGeneration::DontAllow),
            other => Err(format!(
                "Invalid person generation policy: {}. Expected allow_adult or dont_allow",
                other
            )),
        }
    }
}

/// Largest seed the service accepts; the remote field is a signed 32-bit int
pub const MAX_SEED: u32 = i32::MAX as u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default)]
    pub aspect_ratio: AspectRatio,
    #[serde(default)]
    pub person_generation: PersonGeneration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            aspect_ratio: AspectRatio::default(),
            person_generation: PersonGeneration::default(),
            negative_prompt: None,
            seed: None,
        }
    }

    pub fn with_aspect_ratio(mut self, aspect_ratio: AspectRatio) -> Self {
        self.aspect_ratio = aspect_ratio;
        self
    }

    pub fn with_person_generation(mut self, person_generation: PersonGeneration) -> Self {
        self.person_generation = person_generation;
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: Option<String>) -> Self {
        self.negative_prompt = negative_prompt;
        self
    }

    pub fn with_seed(mut self, seed: Option<u32>) -> Self {
        self.seed = seed;
        self
    }

    /// Same parameters, different prompt
    pub fn with_prompt(&self, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..self.clone()
        }
    }

    /// Reject requests the service would refuse anyway
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(StudioError::EmptyPrompt);
        }
        match self.seed {
            Some(seed) if seed > MAX_SEED => Err(StudioError::InvalidSeed(seed)),
            _ => Ok(()),
        }
    }

    /// Parameters block for the remote request
    pub fn to_config(&self) -> GenerateVideosConfig {
        let negative_prompt = self
            .negative_prompt
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        GenerateVideosConfig {
            aspect_ratio: self.aspect_ratio.as_str().to_string(),
            negative_prompt,
            seed: self.seed,
        }
    }
}
