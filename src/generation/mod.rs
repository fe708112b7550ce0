//! Text generation for summaries and answers.

mod openai;

pub use openai::OpenAIGenerator;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for text generation services.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for a fully rendered prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
