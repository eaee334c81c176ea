pub mod dispatch;
pub mod mcq;
pub mod provider;
pub mod providers;
pub mod summarize;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use dispatch::{ChunkDispatcher, ChunkFailure, ChunkJob, ChunkOutput};
pub use mcq::{McqError, McqGenerator};
pub use provider::{LlmError, LlmProvider, Message, Role};
pub use providers::create_provider;
pub use summarize::{Summarizer, SummarizerConfig};
