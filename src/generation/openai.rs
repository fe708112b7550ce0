//! OpenAI-compatible chat completion generator.

use super::Generator;
use crate::config::GenerationSettings;
use crate::error::{Result, VidaskError};
use crate::openai::{create_client, map_error};
use crate::retry::RetryPolicy;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Generator backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
    max_new_tokens: u32,
    retry: RetryPolicy,
}

impl OpenAIGenerator {
    pub fn new(settings: &GenerationSettings, retry: RetryPolicy) -> Result<Self> {
        Ok(Self {
            client: create_client(settings, retry.timeout)?,
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_new_tokens: settings.max_new_tokens,
            retry,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| VidaskError::Generation(e.to_string()))?
                .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_completion_tokens(self.max_new_tokens)
            .build()
            .map_err(|e| VidaskError::Generation(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| map_error(e, VidaskError::Generation))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|content| content.trim().to_string())
            .ok_or_else(|| VidaskError::Generation("Empty response from model".to_string()))
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let text = self
            .retry
            .run("generation request", || self.complete(prompt))
            .await?;
        debug!("Generated {} chars", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_creation() {
        let settings = GenerationSettings {
            project_id: "proj".to_string(),
            model: "llama-3-8b-instruct".to_string(),
            ..Default::default()
        };

        let generator = OpenAIGenerator::new(&settings, RetryPolicy::default()).unwrap();
        assert_eq!(generator.model(), "llama-3-8b-instruct");
        assert_eq!(generator.max_new_tokens, 1024);
    }
}
