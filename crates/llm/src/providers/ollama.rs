use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{chat_messages, http_client, post_json, reply_text, warn_if_truncated};
use crate::provider::{LlmError, LlmProvider, Message};

/// A local Ollama server's non-streaming `/api/chat`.
pub struct OllamaProvider {
    client: reqwest::Client,
    model: String,
    endpoint: String,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            client: http_client(),
            model,
            endpoint: format!("{url}/api/chat"),
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        debug!(model = %self.model, messages = messages.len(), "Ollama request to {}", self.endpoint);

        let body = json!({
            "model": self.model,
            "messages": chat_messages(&messages),
            "stream": false,
            "options": {
                "temperature": temperature,
                "num_predict": max_tokens,
            },
        });
        let reply = post_json(self.client.post(&self.endpoint), &body).await?;

        warn_if_truncated(self.name(), reply["done_reason"].as_str());
        reply_text(&reply, "/message/content")
    }

    fn name(&self) -> &str {
        "ollama"
    }
}
