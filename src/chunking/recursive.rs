//! Separator-aware sliding window chunker.
//!
//! Each window is packed up to `max_len` characters. Its end is moved back to the latest
//! paragraph break, then sentence break, then word break inside the window; if none exists
//! the window is cut at `max_len`. The next window starts `overlap` characters before the
//! previous one ended.

use super::{Chunk, ChunkingConfig};
use crate::error::Result;
use tracing::debug;

/// Chunker that prefers natural break points.
pub struct RecursiveChunker {
    config: ChunkingConfig,
    tiers: Vec<Vec<Vec<char>>>,
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;

        let tiers = config
            .separators
            .iter()
            .map(|tier| {
                tier.iter()
                    .filter(|sep| !sep.is_empty())
                    .map(|sep| sep.chars().collect::<Vec<char>>())
                    .collect::<Vec<_>>()
            })
            .filter(|tier| !tier.is_empty())
            .collect();

        Ok(Self { config, tiers })
    }

    /// Split text into overlapping chunks.
    pub fn chunk(&self, text: &str) -> Result<Vec<Chunk>> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let max_len = self.config.max_len;
        let overlap = self.config.overlap;

        let mut chunks = Vec::new();
        if len == 0 {
            return Ok(chunks);
        }

        let mut start = 0;
        loop {
            if start + max_len >= len {
                chunks.push(Chunk::new(chars[start..].iter().collect::<String>(), start));
                break;
            }

            let limit = start + max_len;
            // A break at or before start + overlap would stall the window.
            let end = self
                .find_break(&chars, start + overlap, limit)
                .unwrap_or(limit);

            chunks.push(Chunk::new(chars[start..end].iter().collect::<String>(), start));
            start = end - overlap;
        }

        debug!(
            "Split {} chars into {} chunks (max_len={}, overlap={})",
            len,
            chunks.len(),
            max_len,
            overlap
        );
        Ok(chunks)
    }

    /// Latest break point in `(lo, hi]` from the highest-priority tier that has one.
    ///
    /// A break point is the index just past a separator.
    fn find_break(&self, chars: &[char], lo: usize, hi: usize) -> Option<usize> {
        self.tiers.iter().find_map(|tier| {
            tier.iter()
                .filter_map(|sep| last_separator_end(chars, sep, lo, hi))
                .max()
        })
    }
}

fn last_separator_end(chars: &[char], sep: &[char], lo: usize, hi: usize) -> Option<usize> {
    let sep_len = sep.len();
    if hi < sep_len {
        return None;
    }
    let mut end = hi;
    while end > lo && end >= sep_len {
        if chars[end - sep_len..end] == *sep {
            return Some(end);
        }
        end -= 1;
    }
    None
}
