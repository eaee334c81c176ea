//! In-process providers for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::provider::{LlmError, LlmProvider, Message};

type Responder = Box<dyn Fn(&[Message]) -> Result<String, LlmError> + Send + Sync>;

/// Answers every request through a closure and records what it was sent.
pub struct FakeProvider {
    responder: Responder,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeProvider {
    pub fn new(
        responder: impl Fn(&[Message]) -> Result<String, LlmError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always returns `reply`.
    pub fn fixed(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_| Ok(reply.clone()))
    }

    /// Returns the last user message unchanged.
    pub fn echo() -> Self {
        Self::new(|messages| Ok(last_user_message(messages).to_string()))
    }

    /// Fails every request with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        Self::new(move |_| {
            Err(LlmError::ApiError {
                status,
                body: "fake failure".into(),
            })
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// User prompts received so far, in arrival order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

pub fn last_user_message(messages: &[Message]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == crate::provider::Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(
        &self,
        messages: Vec<Message>,
        _temperature: f32,
        _max_tokens: u32,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(last_user_message(&messages).to_string());
        }
        (self.responder)(&messages)
    }

    fn name(&self) -> &str {
        "fake"
    }
}
