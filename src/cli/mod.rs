pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use veo_studio::{AspectRatio, GenerationRequest, PersonGeneration, PromptLanguage, MAX_SEED};

#[derive(Parser)]
#[command(name = "veo-studio")]
#[command(about = "Generate videos with Google Veo from text prompts or reference videos")]
#[command(version)]
pub struct Cli {
    /// Use alternate config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Human-readable output instead of JSON
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check API key, endpoint, proxy and model settings
    Doctor,

    /// Model catalog operations
    Models {
        #[command(subcommand)]
        command: ModelCommands,
    },

    /// Generate a video from a text prompt
    Generate(GenerateArgs),

    /// Analyze a reference video and print the suggested prompt and copy
    Analyze(AnalyzeArgs),

    /// Analyze a reference video, then generate from its refined prompt
    Reference(ReferenceArgs),

    /// Enter prompts in a loop ('q' to quit)
    Interactive,
}

#[derive(Subcommand)]
pub enum ModelCommands {
    /// List configured models
    List,
    /// Select the model used for the next generation
    Use(ModelUseArgs),
}

#[derive(Args)]
pub struct ModelUseArgs {
    /// Model id (ex: veo-3.1-generate-preview)
    pub id: String,
}

/// Parameters shared by every generating command
#[derive(Args)]
pub struct GenerationArgs {
    /// Aspect ratio: 16:9 or 9:16
    #[arg(long, default_value = "16:9")]
    pub aspect_ratio: AspectRatio,

    /// Person generation policy: allow_adult or dont_allow
    #[arg(long, default_value = "allow_adult")]
    pub person_generation: PersonGeneration,

    /// Content to avoid
    #[arg(long)]
    pub negative_prompt: Option<String>,

    /// Random seed, 0 to 2147483647
    #[arg(long, value_parser = clap::value_parser!(u32).range(..=i64::from(MAX_SEED)))]
    pub seed: Option<u32>,
}

impl GenerationArgs {
    pub fn request(&self, prompt: &str) -> GenerationRequest {
        GenerationRequest::new(prompt.trim())
            .with_aspect_ratio(self.aspect_ratio)
            .with_person_generation(self.person_generation)
            .with_negative_prompt(self.negative_prompt.clone())
            .with_seed(self.seed)
    }
}

#[derive(Args)]
pub struct GenerateArgs {
    /// Video description
    pub prompt: String,

    #[command(flatten)]
    pub params: GenerationArgs,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Reference video file
    pub video: PathBuf,

    /// What to change or keep, passed to the analysis model
    #[arg(long)]
    pub prompt: Option<String>,

    /// Copywriting language: zh or en
    #[arg(long, default_value = "zh")]
    pub lang: PromptLanguage,
}

#[derive(Args)]
pub struct ReferenceArgs {
    /// Reference video file
    pub video: PathBuf,

    /// What to change or keep, passed to the analysis model
    #[arg(long)]
    pub prompt: Option<String>,

    /// Copywriting language: zh or en
    #[arg(long, default_value = "zh")]
    pub lang: PromptLanguage,

    #[command(flatten)]
    pub params: GenerationArgs,
}
