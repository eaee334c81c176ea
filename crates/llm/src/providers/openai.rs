use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{chat_messages, http_client, post_json, reply_text, warn_if_truncated};
use crate::provider::{LlmError, LlmProvider, Message};

/// Any endpoint speaking the OpenAI chat-completions protocol.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiProvider {
    /// `base_url` without a trailing slash, e.g. `https://api.openai.com`.
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            client: http_client(),
            api_key,
            model,
            endpoint: format!("{base_url}/v1/chat/completions"),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        debug!(model = %self.model, messages = messages.len(), "OpenAI request to {}", self.endpoint);

        let body = json!({
            "model": self.model,
            "messages": chat_messages(&messages),
            "temperature": temperature,
            "max_tokens": max_tokens,
        });
        let request = self.client.post(&self.endpoint).bearer_auth(&self.api_key);
        let reply = post_json(request, &body).await?;

        warn_if_truncated(self.name(), reply["choices"][0]["finish_reason"].as_str());
        reply_text(&reply, "/choices/0/message/content")
    }

    fn name(&self) -> &str {
        "openai"
    }
}
