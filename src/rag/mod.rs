//! Retrieval-augmented answers over the active video's index.

pub mod context;

pub use context::{format_context_for_prompt, ContextBuilder};

use crate::vector_store::SearchHit;
use serde::Serialize;

/// A generated answer with the chunks it was conditioned on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// The generated answer.
    pub text: String,
    /// Retrieved chunks, nearest first.
    pub sources: Vec<SearchHit>,
}

