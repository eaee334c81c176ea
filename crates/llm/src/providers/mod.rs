pub mod claude;
pub mod ollama;
pub mod openai;

use std::time::Duration;

use quickprep_core::config::{LlmConfig, OllamaConfig};
use quickprep_core::text::truncate_chars;
use serde_json::Value;

use crate::provider::{LlmError, LlmProvider, Message};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error bodies are cut to this many characters before they reach logs and clients.
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Create the appropriate LLM provider based on config.
pub fn create_provider(
    llm_config: &LlmConfig,
    ollama_config: &OllamaConfig,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    match llm_config.provider.as_str() {
        "openai" => {
            let api_key = llm_config
                .openai_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("OPENAI_API_KEY not set".into()))?;
            let base_url = llm_config
                .openai_base_url
                .as_deref()
                .unwrap_or("https://api.openai.com");
            Ok(Box::new(openai::OpenAiProvider::new(
                api_key.clone(),
                llm_config.openai_model.clone(),
                base_url.trim_end_matches('/').to_string(),
            )))
        }
        "anthropic" | "claude" => {
            let api_key = llm_config
                .anthropic_api_key
                .as_ref()
                .ok_or_else(|| LlmError::NotConfigured("ANTHROPIC_API_KEY not set".into()))?;
            Ok(Box::new(claude::ClaudeProvider::new(
                api_key.clone(),
                llm_config.anthropic_model.clone(),
            )))
        }
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(
            ollama_config.url.trim_end_matches('/').to_string(),
            ollama_config.model.clone(),
        ))),
        other => Err(LlmError::NotConfigured(format!(
            "unknown LLM provider: '{}'",
            other
        ))),
    }
}

/// Chat messages in the `{role, content}` shape shared by Ollama and OpenAI.
pub(crate) fn chat_messages(messages: &[Message]) -> Vec<serde_json::Value> {
    messages
        .iter()
        .map(|m| {
            serde_json::json!({
                "role": m.role.as_str(),
                "content": m.content,
            })
        })
        .collect()
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

/// Send `body` and decode the JSON reply. Non-2xx statuses become `ApiError`.
pub(crate) async fn post_json(request: reqwest::RequestBuilder, body: &Value) -> Result<Value, LlmError> {
    let response = request.json(body).send().await?;
    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        return Err(LlmError::ApiError {
            status: status.as_u16(),
            body: truncate_chars(&text, MAX_ERROR_BODY_CHARS).to_string(),
        });
    }
    Ok(response.json().await?)
}

/// The string at JSON `pointer`. Missing or blank text is a parse error.
pub(crate) fn reply_text(reply: &Value, pointer: &str) -> Result<String, LlmError> {
    match reply.pointer(pointer).and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(_) => Err(LlmError::ParseError(format!("empty completion at {pointer}"))),
        None => Err(LlmError::ParseError(format!("missing {pointer}"))),
    }
}

/// Log when the model stopped because it ran out of tokens.
pub(crate) fn warn_if_truncated(provider: &str, stop_reason: Option<&str>) {
    if matches!(stop_reason, Some("length" | "max_tokens")) {
        tracing::warn!(provider, "Completion hit the token limit and may be cut off");
    }
}
