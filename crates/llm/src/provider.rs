use std::time::Duration;

use async_trait::async_trait;
use quickprep_core::ErrorKind;
use serde::{Deserialize, Serialize};

/// A chat message for the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request and return the assistant's response text.
    async fn complete(
        &self,
        messages: Vec<Message>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError>;

    /// Short backend name for logs and the health endpoint.
    fn name(&self) -> &str;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    ApiError { status: u16, body: String },
    #[error("failed to parse response: {0}")]
    ParseError(String),
    #[error("provider not configured: {0}")]
    NotConfigured(String),
    #[error("model did not answer within {0:?}")]
    Timeout(Duration),
}

impl LlmError {
    /// Connection failures, rate limits, server errors and timeouts.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpError(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::ApiError { status, .. } => *status == 429 || *status >= 500,
            Self::Timeout(_) => true,
            Self::ParseError(_) | Self::NotConfigured(_) => false,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Timeout(_) => ErrorKind::ModelTimeout,
            Self::HttpError(e) if e.is_timeout() => ErrorKind::ModelTimeout,
            e if e.is_transient() => ErrorKind::ModelUnavailable,
            _ => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_status_classification() {
        let rate_limited = LlmError::ApiError { status: 429, body: String::new() };
        assert!(rate_limited.is_transient());
        assert_eq!(rate_limited.kind(), ErrorKind::ModelUnavailable);

        let overloaded = LlmError::ApiError { status: 503, body: String::new() };
        assert_eq!(overloaded.kind(), ErrorKind::ModelUnavailable);

        let bad_key = LlmError::ApiError { status: 401, body: String::new() };
        assert!(!bad_key.is_transient());
        assert_eq!(bad_key.kind(), ErrorKind::Internal);
    }

    #[test]
    fn timeout_is_retryable() {
        let e = LlmError::Timeout(Duration::from_secs(120));
        assert_eq!(e.kind(), ErrorKind::ModelTimeout);
        assert!(e.kind().is_retryable());
    }

    #[test]
    fn role_serializes_lowercase() {
        let m = Message::user("hi");
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v, serde_json::json!({"role": "user", "content": "hi"}));
    }
}
