//! Configuration settings for vidask.

use crate::error::{Result, VidaskError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub network: NetworkSettings,
    pub transcript: TranscriptSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub rag: RagSettings,
    pub prompts: PromptSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Timeouts and retries applied to every external call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkSettings {
    /// Timeout for a single request, in seconds.
    pub timeout_secs: u64,
    /// Extra attempts after a transient failure.
    pub max_retries: u32,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_retries: 1,
        }
    }
}

/// Transcript fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Caption language to fetch.
    pub language: String,
    /// Accept automatically generated captions when no manual track exists.
    pub allow_auto_captions: bool,
    /// yt-dlp executable.
    pub ytdlp_path: String,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            allow_auto_captions: true,
            ytdlp_path: "yt-dlp".to_string(),
        }
    }
}

/// Text chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Maximum chunk length in characters.
    pub max_len: usize,
    /// Characters shared by adjacent chunks.
    pub overlap: usize,
    /// Break-point separators, highest priority tier first.
    pub separators: Vec<Vec<String>>,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            max_len: 1000,
            overlap: 100,
            separators: crate::chunking::default_separators(),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Requested dimensions. None keeps the model's native size.
    pub dimensions: Option<u32>,
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Embedding requests in flight at once while building an index.
    pub max_concurrent: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-3-small".to_string(),
            dimensions: None,
            batch_size: 100,
            max_concurrent: 4,
        }
    }
}

/// Generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Base URL of the OpenAI-compatible service (also used for embeddings).
    pub endpoint: String,
    /// Project identifier sent with every request.
    pub project_id: String,
    /// Model used for summaries and answers.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_new_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            project_id: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_new_tokens: 1024,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of chunks retrieved per question.
    pub top_k: usize,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {variable_name}.
    pub variables: std::collections::HashMap<String, String>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Live sessions allowed at once.
    pub max_sessions: usize,
    /// Seconds without a request before a session is dropped.
    pub session_idle_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            max_sessions: crate::session::DEFAULT_MAX_SESSIONS,
            session_idle_secs: crate::session::DEFAULT_IDLE_SECS as u64,
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to the default configuration file.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| VidaskError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vidask")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Check that every required service setting is present and the numeric knobs are sane.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("generation.endpoint", &self.generation.endpoint),
            ("generation.project_id", &self.generation.project_id),
            ("generation.model", &self.generation.model),
            ("embedding.model", &self.embedding.model),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(VidaskError::Config(format!("{} must be set", key)));
            }
        }

        if self.chunking.overlap >= self.chunking.max_len {
            return Err(VidaskError::Config(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_len ({})",
                self.chunking.overlap, self.chunking.max_len
            )));
        }

        if self.server.max_sessions == 0 || self.server.session_idle_secs == 0 {
            return Err(VidaskError::Config(
                "server.max_sessions and server.session_idle_secs must be positive".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 || self.embedding.max_concurrent == 0 {
            return Err(VidaskError::Config(
                "embedding.batch_size and embedding.max_concurrent must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
