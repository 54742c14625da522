use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, StudioError};
use crate::generation::PollPolicy;

/// Value shipped in the sample `.env`; treated the same as a missing key.
pub const PLACEHOLDER_API_KEY: &str = "your_api_key_here";

pub const DEFAULT_MODEL: &str = "veo-3.1-generate-preview";

pub const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_model")]
    pub current_model: String,
    #[serde(default = "default_models")]
    pub models: Vec<ModelCatalogEntry>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            current_model: default_model(),
            models: default_models(),
            api: ApiConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ModelCatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl ModelCatalogEntry {
    fn new(id: &str, name: &str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_model: Option<String>,
}

impl ApiConfig {
    /// Custom service endpoint, if one is set
    pub fn base_url(&self) -> Option<&str> {
        non_blank(self.base_url.as_deref())
    }

    pub fn proxy(&self) -> Option<&str> {
        non_blank(self.proxy.as_deref())
    }

    /// Multimodal model used for reference-video analysis
    pub fn analysis_model(&self) -> &str {
        non_blank(self.analysis_model.as_deref()).unwrap_or(DEFAULT_ANALYSIS_MODEL)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_max_poll_retries")]
    pub max_poll_retries: u32,
    /// Root for temporary copies of reference videos
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            poll_interval_secs: default_poll_interval(),
            retry_delay_secs: default_retry_delay(),
            max_poll_retries: default_max_poll_retries(),
            scratch_dir: None,
        }
    }
}

impl GenerationConfig {
    pub fn poll_policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.poll_interval_secs),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            max_retries: self.max_poll_retries.max(1),
        }
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_models() -> Vec<ModelCatalogEntry> {
    vec![
        ModelCatalogEntry::new(
            "veo-3.1-generate-preview",
            "Veo 3.1",
            "Latest model with native audio, highest quality",
        ),
        ModelCatalogEntry::new(
            "veo-3.1-fast-generate-preview",
            "Veo 3.1 Fast",
            "Faster, cheaper variant of Veo 3.1",
        ),
        ModelCatalogEntry::new(
            "veo-3.0-generate-001",
            "Veo 3",
            "Stable Veo 3 release with audio",
        ),
        ModelCatalogEntry::new(
            "veo-3.0-fast-generate-001",
            "Veo 3 Fast",
            "Stable Veo 3 optimized for speed",
        ),
        ModelCatalogEntry::new(
            "veo-2.0-generate-001",
            "Veo 2",
            "Silent video generation",
        ),
    ]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_poll_interval() -> u64 {
    5
}

fn default_retry_delay() -> u64 {
    2
}

fn default_max_poll_retries() -> u32 {
    5
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl Config {
    /// Load config from file, then fill credentials from the environment
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_fallbacks();
        Ok(config)
    }

    /// Read the file as persisted, without environment fallbacks
    pub fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Resolve `--config` or fall back to the default location
    pub fn resolve_path(path: Option<&Path>) -> PathBuf {
        path.map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path)
    }

    /// Default config path: ~/.config/veo-studio/config.toml
    pub fn default_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("veo-studio").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("veo-studio")
            .join("config.toml")
    }

    fn apply_env_fallbacks(&mut self) {
        if self.api.api_key.is_none() {
            self.api.api_key = std::env::var("GOOGLE_API_KEY").ok();
        }
        if self.api.base_url.is_none() {
            self.api.base_url = std::env::var("GOOGLE_GENAI_BASE_URL").ok();
        }
        if self.api.proxy.is_none() {
            self.api.proxy = std::env::var("HTTPS_PROXY").ok();
        }
        if self.api.analysis_model.is_none() {
            self.api.analysis_model = std::env::var("GEMINI_TEXT_MODEL").ok();
        }
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Check credentials and endpoint before any request is made
    pub fn validate(&self) -> Result<()> {
        let key = non_blank(self.api.api_key.as_deref()).ok_or_else(|| {
            StudioError::Config(format!(
                "GOOGLE_API_KEY not configured.\n\nSet environment variable:\n   export GOOGLE_API_KEY=your-key-here\n\nOr add to config file:\n   [api]\n   api_key = \"your-key-here\"\n   ({})",
                Self::default_path().display()
            ))
        })?;

        if key == PLACEHOLDER_API_KEY {
            return Err(StudioError::Config(
                "Please replace the placeholder API key (your_api_key_here) with your actual GOOGLE_API_KEY"
                    .to_string(),
            ));
        }

        if let Some(base_url) = self.api.base_url() {
            if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
                return Err(StudioError::Config(format!(
                    "GOOGLE_GENAI_BASE_URL must start with http:// or https:// (got {})",
                    base_url
                )));
            }
        }

        Ok(())
    }

    /// Get the API key, failing the same way `validate` does
    pub fn api_key(&self) -> Result<&str> {
        self.validate()?;
        Ok(self.api.api_key.as_deref().map(str::trim).unwrap_or_default())
    }
}

/// View of the persisted model catalog.
///
/// Every read goes back to disk, so a selection made elsewhere is picked up
/// by the next request. Not safe for concurrent writers.
#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn models(&self) -> Result<Vec<ModelCatalogEntry>> {
        Ok(Config::read_file(&self.path)?.models)
    }

    pub fn current_model(&self) -> Result<String> {
        Ok(Config::read_file(&self.path)?.current_model)
    }

    /// Select a catalog model and persist the choice immediately
    pub fn set_current_model(&self, model_id: &str) -> Result<()> {
        let mut config = Config::read_file(&self.path)?;
        if !config.models.iter().any(|m| m.id == model_id) {
            return Err(StudioError::UnknownModel(model_id.to_string()));
        }
        config.current_model = model_id.to_string();
        config.write_to(&self.path)?;
        tracing::info!("Selected model: {}", model_id);
        Ok(())
    }
}
