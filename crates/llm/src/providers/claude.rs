use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{http_client, post_json, warn_if_truncated};
use crate::provider::{LlmError, LlmProvider, Message, Role};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct ClaudeProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: http_client(),
            api_key,
            model,
        }
    }
}

/// Split out system prompts, which the Messages API takes as a top-level field.
fn request_body(model: &str, messages: &[Message], temperature: f32, max_tokens: u32) -> serde_json::Value {
    let system: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect();

    let api_messages: Vec<serde_json::Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| json!({ "role": m.role.as_str(), "content": m.content }))
        .collect();

    let mut body = json!({
        "model": model,
        "messages": api_messages,
        "temperature": temperature,
        "max_tokens": max_tokens,
    });
    if !system.is_empty() {
        body["system"] = json!(system.join("\n\n"));
    }
    body
}

/// Concatenate the text blocks of a Messages API reply.
fn reply_content(reply: &serde_json::Value) -> Result<String, LlmError> {
    let text = reply["content"]
        .as_array()
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b["type"] == "text")
                .filter_map(|b| b["text"].as_str())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(LlmError::ParseError("no text blocks in content".into()));
    }
    Ok(text.trim().to_string())
}

#[async_trait]
impl LlmProvider for ClaudeProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        debug!(model = %self.model, messages = messages.len(), "Anthropic request");

        let body = request_body(&self.model, &messages, temperature, max_tokens);
        let request = self
            .client
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION);
        let reply = post_json(request, &body).await?;

        warn_if_truncated(self.name(), reply["stop_reason"].as_str());
        reply_content(&reply)
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}
