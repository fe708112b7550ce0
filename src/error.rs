//! Error types for vidask.

use thiserror::Error;

/// Library-level error type for vidask operations.
#[derive(Error, Debug)]
pub enum VidaskError {
    #[error("Invalid video URL: {0}")]
    InvalidUrl(String),

    #[error("No transcript available for video '{video_id}': {reason}")]
    NoTranscript { video_id: String, reason: String },

    #[error("Video '{video_id}' not found or unavailable: {reason}")]
    VideoNotFound { video_id: String, reason: String },

    #[error("Network error: {0}")]
    TransientNetwork(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector index is empty")]
    EmptyIndex,

    #[error("Template error: {0}")]
    Template(String),

    #[error("No video has been processed in this session")]
    NotReady,

    #[error("Session limit of {0} reached")]
    TooManySessions(usize),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl VidaskError {
    /// Whether a retry of the failed call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            VidaskError::TransientNetwork(_) => true,
            VidaskError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }

    /// Errors caused by user input or missing content rather than a bug.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            VidaskError::InvalidUrl(_)
                | VidaskError::NoTranscript { .. }
                | VidaskError::VideoNotFound { .. }
                | VidaskError::TransientNetwork(_)
                | VidaskError::Http(_)
                | VidaskError::NotReady
                | VidaskError::TooManySessions(_)
                | VidaskError::InvalidInput(_)
        )
    }
}

/// Result type alias for vidask operations.
pub type Result<T> = std::result::Result<T, VidaskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(VidaskError::TransientNetwork("reset".to_string()).is_transient());
        assert!(!VidaskError::EmptyIndex.is_transient());
        assert!(!VidaskError::InvalidUrl("x".to_string()).is_transient());
    }

    #[test]
    fn test_user_facing_classification() {
        assert!(VidaskError::NotReady.is_user_facing());
        assert!(VidaskError::InvalidUrl("x".to_string()).is_user_facing());
        assert!(!VidaskError::EmptyIndex.is_user_facing());
        assert!(!VidaskError::Embedding("dim".to_string()).is_user_facing());
    }
}
