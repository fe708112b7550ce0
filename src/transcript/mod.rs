//! Transcript retrieval.
//!
//! A [`TranscriptSource`] turns a video id into timed caption segments. The only
//! implementation shipped here reads YouTube caption tracks through yt-dlp.

mod youtube;

pub use youtube::YoutubeTranscriptSource;

use crate::error::Result;
use crate::video::VideoId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single caption line with its timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Duration in seconds.
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    /// Create a new transcript segment.
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }
}

/// A complete transcript with segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    /// Video this transcript belongs to.
    pub video_id: VideoId,
    /// Video title, when the source reports one.
    pub title: Option<String>,
    /// Caption language code.
    pub language: String,
    /// Caption segments in playback order.
    pub segments: Vec<TranscriptSegment>,
}

impl Transcript {
    /// Segment texts joined by single spaces, with blank segments dropped.
    pub fn to_text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript of a video in the configured language.
    ///
    /// Fails with `VideoNotFound` when the video does not exist, `NoTranscript` when it has
    /// no captions in the language, and `TransientNetwork` when the service is unreachable.
    async fn fetch(&self, video_id: &VideoId) -> Result<Transcript>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_text() {
        let transcript = Transcript {
            video_id: VideoId::parse("dQw4w9WgXcQ").unwrap(),
            title: None,
            language: "en".to_string(),
            segments: vec![
                TranscriptSegment::new("Hello world.", 0.0, 2.0),
                TranscriptSegment::new("  ", 2.0, 1.0),
                TranscriptSegment::new(" This is a test ", 3.0, 4.5),
            ],
        };

        assert_eq!(transcript.to_text(), "Hello world. This is a test");
    }
}
