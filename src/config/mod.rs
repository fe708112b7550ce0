//! Configuration module for vidask.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, QA_TEMPLATE, SUMMARY_TEMPLATE};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GeneralSettings, GenerationSettings, NetworkSettings,
    PromptSettings, RagSettings, ServerSettings, Settings, TranscriptSettings,
};
