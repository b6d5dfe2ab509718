use super::types::ChatCompletionRequest;
use crate::{config::LlmConfig, Result};
use async_trait::async_trait;
use tracing::debug;

/// Capability the chat handler depends on: send one chat-completion request
/// and hand back the backend's HTTP response without materializing its body.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn stream_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<reqwest::Response>;
}

/// Client for any OpenAI-compatible chat-completions endpoint.
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenAiCompatClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiCompatClient {
    async fn stream_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<reqwest::Response> {
        debug!(
            "Requesting streaming chat completion from {} with {} messages",
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?
            // Quota and model errors surface as non-2xx statuses; they are
            // failures here, not responses to relay.
            .error_for_status()?;

        Ok(response)
    }
}
