pub mod analysis;
pub mod config;
pub mod error;
pub mod genai;
pub mod generation;
pub mod session;

#[cfg(test)]
mod testing;

pub use analysis::{AnalysisResult, PromptLanguage, ReferenceAnalyzer, ReferenceGeneration};
pub use config::{Config, ModelCatalogEntry, ModelStore};
pub use error::{Result, StudioError};
pub use genai::{GenAiBackend, GenAiClient};
pub use generation::{
    AspectRatio, GenerationOutcome, GenerationRequest, PersonGeneration, PollPolicy,
    VideoGenerator, MAX_SEED,
};
pub use session::{Job, ProgressSink, Quiet, StudioEvent};
