//! YouTube video identifiers.

use crate::error::{Result, VidaskError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// Watch, embed, /v/, shorts, youtu.be and nested-path URLs, plus bare 11-character ids.
static VIDEO_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        (?:
            (?:https?://)?
            (?:www\.|m\.)?
            (?:
                youtube\.com/
                (?:
                    [^/\n\s]+/\S+/
                    | (?:v|e(?:mbed)?|shorts|live)/
                    | \S*?[?&]v=
                )
                | youtu\.be/
            )
            ([a-zA-Z0-9_-]{11})
        )
        |
        ^([a-zA-Z0-9_-]{11})$
        ",
    )
    .expect("Invalid regex")
});

/// An 11-character YouTube video id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoId(String);

impl VideoId {
    /// Extract the video id from a YouTube URL or a bare id.
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        let caps = VIDEO_ID
            .captures(input)
            .ok_or_else(|| VidaskError::InvalidUrl(input.to_string()))?;

        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| VideoId(m.as_str().to_string()))
            .ok_or_else(|| VidaskError::InvalidUrl(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical watch URL.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.0)
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
