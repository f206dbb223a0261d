//! Groq API client implementation.

use async_trait::async_trait;
use devops_hub_core::{ChatMessage, CompletionProvider, Error, GroqSettings, Result};
use tracing::{debug, warn};

use crate::types::{ChatCompletionRequest, ChatCompletionResponse};

/// Groq chat completions client.
pub struct GroqClient {
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    client: reqwest::Client,
}

impl GroqClient {
    /// Create a Groq client from settings.
    pub fn new(settings: &GroqSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("mcp-devops-hub")
            .build()
            .map_err(|e| Error::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.expose().to_string(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionProvider for GroqClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: &messages,
            temperature: temperature.unwrap_or(self.temperature),
            max_tokens: max_tokens.unwrap_or(self.max_tokens),
        };

        debug!(
            model = %self.model,
            messages = messages.len(),
            temperature = body.temperature,
            max_tokens = body.max_tokens,
            "Groq chat completion request"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                message = message,
                "Groq API error response"
            );
            return Err(Error::from_status(status.as_u16(), message));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidData(format!("Failed to parse response: {}", e)))?;

        if let Some(usage) = &completion.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Groq token usage"
            );
        }

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| Error::InvalidData("Completion returned no choices".to_string()))
    }
}
