//! In-memory collaborators for tests.

use crate::config::{Prompts, Settings};
use crate::embedding::Embedder;
use crate::error::{Result, VidaskError};
use crate::generation::Generator;
use crate::orchestrator::Orchestrator;
use crate::transcript::{Transcript, TranscriptSegment, TranscriptSource};
use crate::video::VideoId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TEXT: &str = "Hello world. This is a test of chunking.";

/// Serves fixed transcripts by video id; unknown ids have no captions.
#[derive(Default)]
pub struct FakeSource {
    transcripts: HashMap<String, String>,
    pub fetches: AtomicUsize,
}

impl FakeSource {
    pub fn with(videos: &[(&str, &str)]) -> Self {
        Self {
            transcripts: videos
                .iter()
                .map(|(id, text)| (id.to_string(), text.to_string()))
                .collect(),
            fetches: AtomicUsize::new(0),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TranscriptSource for FakeSource {
    async fn fetch(&self, video_id: &VideoId) -> Result<Transcript> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        let text =
            self.transcripts
                .get(video_id.as_str())
                .ok_or_else(|| VidaskError::NoTranscript {
                    video_id: video_id.to_string(),
                    reason: "no captions".to_string(),
                })?;
        Ok(Transcript {
            video_id: video_id.clone(),
            title: Some("Demo".to_string()),
            language: "en".to_string(),
            segments: vec![TranscriptSegment::new(text.clone(), 0.0, 10.0)],
        })
    }
}

/// Embeds a text as `[mentions "test", 1]`.
#[derive(Default)]
pub struct KeywordEmbedder {
    pub batches: AtomicUsize,
    pub fail: bool,
}

impl KeywordEmbedder {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn batch_count(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

fn keyword_vector(text: &str) -> Vec<f32> {
    let hit = if text.contains("test") { 1.0 } else { 0.0 };
    vec![hit, 1.0]
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(VidaskError::TransientNetwork("connection reset".to_string()));
        }
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }
}

/// Records prompts and answers `generated #n`, after failing `failures` times.
#[derive(Default)]
pub struct RecordingGenerator {
    prompts: Mutex<Vec<String>>,
    failures: AtomicUsize,
}

impl RecordingGenerator {
    pub fn failing_once() -> Self {
        Self {
            failures: AtomicUsize::new(1),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        let fail = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            return Err(VidaskError::Generation("model overloaded".to_string()));
        }
        Ok(format!("generated #{}", prompts.len()))
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub source: Arc<FakeSource>,
    pub embedder: Arc<KeywordEmbedder>,
    pub generator: Arc<RecordingGenerator>,
}

pub fn harness_with(source: FakeSource, embedder: KeywordEmbedder) -> Harness {
    harness_from(source, embedder, RecordingGenerator::default())
}

/// Orchestrator over fakes with `max_len = 20`, `overlap = 5` and `top_k = 2`.
pub fn harness_from(
    source: FakeSource,
    embedder: KeywordEmbedder,
    generator: RecordingGenerator,
) -> Harness {
    let mut settings = Settings::default();
    settings.chunking.max_len = 20;
    settings.chunking.overlap = 5;
    settings.rag.top_k = 2;

    let source = Arc::new(source);
    let embedder = Arc::new(embedder);
    let generator = Arc::new(generator);

    let orchestrator = Orchestrator::with_components(
        settings,
        Prompts::default(),
        source.clone(),
        embedder.clone(),
        generator.clone(),
    )
    .unwrap();

    Harness {
        orchestrator,
        source,
        embedder,
        generator,
    }
}

/// Two known videos: `aaaaaaaaaaa` with [`TEXT`] and `bbbbbbbbbbb`.
pub fn harness() -> Harness {
    harness_with(
        FakeSource::with(&[
            ("aaaaaaaaaaa", TEXT),
            ("bbbbbbbbbbb", "Another video entirely."),
        ]),
        KeywordEmbedder::default(),
    )
}
