//! Text chunking for breaking transcripts into retrievable windows.
//!
//! Chunks are measured in characters (Unicode scalar values). Adjacent chunks share
//! exactly `overlap` characters, so stripping that prefix from every chunk after the
//! first and concatenating reproduces the input.

mod recursive;

pub use recursive::RecursiveChunker;

use crate::config::ChunkingSettings;
use crate::error::{Result, VidaskError};
use serde::{Deserialize, Serialize};

/// A window of the source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub text: String,
    /// Character offset of the first character in the source text.
    pub source_offset: usize,
}

impl Chunk {
    /// Create a new chunk.
    pub fn new(text: impl Into<String>, source_offset: usize) -> Self {
        Self {
            text: text.into(),
            source_offset,
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub max_len: usize,
    /// Characters shared by adjacent chunks.
    pub overlap: usize,
    /// Separator tiers, tried in order when looking for a break point.
    pub separators: Vec<Vec<String>>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_len: 1000,
            overlap: 100,
            separators: default_separators(),
        }
    }
}

impl ChunkingConfig {
    /// Window sizes with the default separators.
    pub fn with_sizes(max_len: usize, overlap: usize) -> Self {
        Self {
            max_len,
            overlap,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_len == 0 || self.overlap >= self.max_len {
            return Err(VidaskError::InvalidInput(format!(
                "chunk overlap ({}) must be smaller than max length ({})",
                self.overlap, self.max_len
            )));
        }
        Ok(())
    }
}

impl From<&ChunkingSettings> for ChunkingConfig {
    fn from(settings: &ChunkingSettings) -> Self {
        Self {
            max_len: settings.max_len,
            overlap: settings.overlap,
            separators: settings.separators.clone(),
        }
    }
}

/// Paragraph, sentence and word separators.
pub fn default_separators() -> Vec<Vec<String>> {
    let tier = |seps: &[&str]| seps.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    vec![
        tier(&["\n\n"]),
        tier(&[". ", "! ", "? ", "\n"]),
        tier(&[" ", "\t"]),
    ]
}

/// Split text with the given configuration.
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>> {
    RecursiveChunker::new(config.clone())?.chunk(text)
}

/// Rebuild the source text by dropping each later chunk's shared prefix.
pub fn reassemble(chunks: &[Chunk], overlap: usize) -> String {
    let mut text = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            text.push_str(&chunk.text);
        } else {
            text.extend(chunk.text.chars().skip(overlap));
        }
    }
    text
}
