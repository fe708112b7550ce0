//! Session orchestrator for vidask.
//!
//! Coordinates transcript fetching, chunking, indexing and generation for a session, and
//! converts failures into the short status messages shown to users.

use crate::chunking::{ChunkingConfig, RecursiveChunker};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, VidaskError};
use crate::generation::{Generator, OpenAIGenerator};
use crate::rag::{format_context_for_prompt, Answer, ContextBuilder};
use crate::retry::RetryPolicy;
use crate::session::{ActiveVideo, Session};
use crate::transcript::{TranscriptSource, YoutubeTranscriptSource};
use crate::vector_store::{SearchHit, VectorIndex};
use crate::video::VideoId;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

const EMPTY_URL: &str = "Please enter a YouTube URL.";
const EMPTY_QUESTION: &str = "Please enter a question.";

/// Drives the process and ask operations of sessions.
pub struct Orchestrator {
    settings: Settings,
    prompts: Prompts,
    source: Arc<dyn TranscriptSource>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    chunking: ChunkingConfig,
    context: ContextBuilder,
}

impl Orchestrator {
    /// Create an orchestrator backed by YouTube captions and the configured model service.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let retry = RetryPolicy::from(&settings.network);

        let source: Arc<dyn TranscriptSource> = Arc::new(YoutubeTranscriptSource::new(
            settings.transcript.clone(),
            retry.clone(),
        )?);

        info!(
            "Using embedding model {} and generation model {} at {}",
            settings.embedding.model, settings.generation.model, settings.generation.endpoint
        );

        let embedder: Arc<dyn Embedder> = Arc::new(OpenAIEmbedder::new(
            &settings.generation,
            &settings.embedding,
            retry.clone(),
        )?);

        let generator: Arc<dyn Generator> =
            Arc::new(OpenAIGenerator::new(&settings.generation, retry)?);

        Self::with_components(settings, prompts, source, embedder, generator)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        source: Arc<dyn TranscriptSource>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        prompts.validate()?;

        let chunking = ChunkingConfig::from(&settings.chunking);
        chunking.validate()?;

        let context = ContextBuilder::new(embedder.clone()).with_top_k(settings.rag.top_k);

        Ok(Self {
            settings,
            prompts,
            source,
            embedder,
            generator,
            chunking,
            context,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Make the video at `url` the session's active video and summarize it.
    ///
    /// Reprocessing the active video reuses its transcript and index. On any failure
    /// before the new index is complete, the session keeps its previous state.
    #[instrument(skip(self, session), fields(session = %session.id()))]
    pub async fn process(&self, session: &Session, url: &str) -> Result<ProcessOutcome> {
        let url = url.trim();
        if url.is_empty() {
            return Err(VidaskError::InvalidInput(EMPTY_URL.to_string()));
        }
        let video_id = VideoId::parse(url)?;

        let _guard = session.lock_processing().await;

        if let Some(active) = session.active().await {
            if active.video_id == video_id {
                info!("Video {} is already processed", video_id);
                let summary = match &active.summary {
                    Some(summary) => Ok(summary.clone()),
                    None => self.summarize(session, &active).await,
                };
                return Ok(ProcessOutcome {
                    video_id,
                    title: active.title.clone(),
                    chunks_indexed: active.index.len(),
                    already_processed: true,
                    summary,
                });
            }
        }

        info!("Fetching transcript for {}", video_id);
        let transcript = self.source.fetch(&video_id).await?;
        let text = transcript.to_text();
        if text.is_empty() {
            return Err(VidaskError::NoTranscript {
                video_id: video_id.to_string(),
                reason: "transcript is empty".to_string(),
            });
        }

        let chunks = RecursiveChunker::new(self.chunking.clone())?.chunk(&text)?;
        info!("Split {} chars into {} chunks", text.chars().count(), chunks.len());

        let index = VectorIndex::build_batched(
            chunks,
            self.embedder.as_ref(),
            self.settings.embedding.batch_size,
            self.settings.embedding.max_concurrent,
        )
        .await?;
        let chunks_indexed = index.len();

        let active = session
            .activate(ActiveVideo {
                video_id: video_id.clone(),
                title: transcript.title.clone(),
                transcript_text: text,
                index: Arc::new(index),
                summary: None,
                processed_at: Utc::now(),
            })
            .await;
        info!("Indexed {} chunks for {}", chunks_indexed, video_id);

        let summary = self.summarize(session, &active).await;

        Ok(ProcessOutcome {
            video_id,
            title: transcript.title,
            chunks_indexed,
            already_processed: false,
            summary,
        })
    }

    async fn summarize(&self, session: &Session, active: &ActiveVideo) -> Result<String> {
        let prompt = self.prompts.render_summary(&active.transcript_text)?;
        let summary = self.generator.generate(&prompt).await?;
        session.set_summary(&active.video_id, &summary).await;
        Ok(summary)
    }

    /// Answer a question about the session's active video.
    #[instrument(skip(self, session, question), fields(session = %session.id()))]
    pub async fn ask(&self, session: &Session, question: &str) -> Result<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(VidaskError::InvalidInput(EMPTY_QUESTION.to_string()));
        }

        // The snapshot stays valid even if the session moves on to another video.
        let active = session.active().await.ok_or(VidaskError::NotReady)?;

        let hits = self.context.build(&active.index, question).await?;
        let context = format_context_for_prompt(&hits);
        let prompt = self.prompts.render_qa(&context, question)?;
        let text = self.generator.generate(&prompt).await?;

        Ok(Answer {
            text,
            sources: hits,
        })
    }

    /// Process a URL and describe the outcome as a status line plus summary.
    pub async fn process_for_display(&self, session: &Session, url: &str) -> ProcessDisplay {
        match self.process(session, url).await {
            Ok(outcome) => outcome.into_display(),
            Err(e) => {
                log_failure("process", &e);
                ProcessDisplay {
                    status: status_message(&e),
                    summary: String::new(),
                    processed: false,
                }
            }
        }
    }

    /// Answer a question, or describe why no answer could be produced.
    pub async fn ask_for_display(&self, session: &Session, question: &str) -> AskDisplay {
        match self.ask(session, question).await {
            Ok(answer) => AskDisplay {
                reply: answer.text,
                sources: answer.sources,
                answered: true,
            },
            Err(e) => {
                log_failure("ask", &e);
                AskDisplay {
                    reply: status_message(&e),
                    sources: Vec::new(),
                    answered: false,
                }
            }
        }
    }
}

/// Result of processing a video.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub video_id: VideoId,
    pub title: Option<String>,
    /// Number of chunks in the active index.
    pub chunks_indexed: usize,
    /// The video was already active and nothing was fetched or embedded.
    pub already_processed: bool,
    /// The video is indexed even when summarization fails.
    pub summary: Result<String>,
}

impl ProcessOutcome {
    /// One-line status for users.
    pub fn status(&self) -> String {
        if self.already_processed {
            format!(
                "Video '{}' is already processed. Ready for Q&A.",
                self.video_id
            )
        } else {
            format!("Successfully processed video '{}'.", self.video_id)
        }
    }

    /// Status and summary for users. A failed summary is reported in the status.
    pub fn into_display(self) -> ProcessDisplay {
        let mut status = self.status();

        let summary = match self.summary {
            Ok(summary) => summary,
            Err(e) => {
                warn!("Summary failed for {}: {}", self.video_id, e);
                status.push_str(&format!(" Summary unavailable: {}", e));
                String::new()
            }
        };

        ProcessDisplay {
            status,
            summary,
            processed: true,
        }
    }
}

/// Display form of a process call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProcessDisplay {
    pub status: String,
    pub summary: String,
    /// Whether the video is now the session's active video.
    pub processed: bool,
}

/// Display form of an ask call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AskDisplay {
    /// The answer, or the status message explaining why there is none.
    pub reply: String,
    pub sources: Vec<SearchHit>,
    pub answered: bool,
}

/// Short user-facing message for an error.
pub fn status_message(err: &VidaskError) -> String {
    match err {
        VidaskError::InvalidInput(msg) => msg.clone(),
        VidaskError::InvalidUrl(_) => "Invalid YouTube URL provided.".to_string(),
        VidaskError::NoTranscript { video_id, .. }
        | VidaskError::VideoNotFound { video_id, .. } => {
            format!("Could not retrieve a transcript for video '{}'.", video_id)
        }
        VidaskError::NotReady => {
            "Please process a video first before asking a question.".to_string()
        }
        VidaskError::TooManySessions(_) => {
            "Too many active sessions. Please try again later.".to_string()
        }
        e if e.is_transient() => format!(
            "A network error occurred while contacting an external service. Please try again. ({})",
            e
        ),
        e => format!("An error occurred: {}", e),
    }
}

fn log_failure(operation: &str, err: &VidaskError) {
    if err.is_user_facing() {
        warn!("{} failed: {}", operation, err);
    } else {
        error!("{} failed: {}", operation, err);
    }
}
