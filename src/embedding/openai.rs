//! OpenAI-compatible embeddings implementation.

use super::Embedder;
use crate::config::{EmbeddingSettings, GenerationSettings};
use crate::error::{Result, VidaskError};
use crate::openai::{create_client, map_error};
use crate::retry::RetryPolicy;
use async_openai::types::{CreateEmbeddingRequestArgs, EmbeddingInput};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAIEmbedder {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    dimensions: Option<u32>,
    batch_size: usize,
    retry: RetryPolicy,
}

impl OpenAIEmbedder {
    /// Create an embedder for the configured service and model.
    pub fn new(
        service: &GenerationSettings,
        settings: &EmbeddingSettings,
        retry: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            client: create_client(service, retry.timeout)?,
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size.max(1),
            retry,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn request(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let mut args = CreateEmbeddingRequestArgs::default();
        args.model(&self.model).input(EmbeddingInput::StringArray(input));
        if let Some(dimensions) = self.dimensions {
            args.dimensions(dimensions);
        }
        let request = args
            .build()
            .map_err(|e| VidaskError::Embedding(format!("Failed to build request: {}", e)))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| map_error(e, VidaskError::Embedding))?;

        // Sort by index to ensure correct order
        let mut embeddings: Vec<_> = response.data.into_iter().collect();
        embeddings.sort_by_key(|e| e.index);

        Ok(embeddings.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    #[instrument(skip(self, text))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| VidaskError::Embedding("Empty embedding response".to_string()))
    }

    #[instrument(skip(self, texts), fields(count = texts.len()))]
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self
                .retry
                .run("embedding request", || self.request(chunk.to_vec()))
                .await?;

            if embeddings.len() != chunk.len() {
                return Err(VidaskError::Embedding(format!(
                    "Expected {} embeddings, got {}",
                    chunk.len(),
                    embeddings.len()
                )));
            }
            all_embeddings.extend(embeddings);
        }

        debug!("Generated {} embeddings", all_embeddings.len());
        Ok(all_embeddings)
    }
}
