//! HTTP endpoint modules.
//!
//! Each sub-module owns one endpoint family; the per-request span helper
//! lives here.

mod health;
mod mcq;
mod summarize;

pub use health::health;
pub use mcq::generate_mcq;
pub use summarize::{summarize_pdf, summarize_pptx};

use uuid::Uuid;

/// Span carrying a fresh request id; everything a handler logs nests under it.
pub(crate) fn request_span(endpoint: &'static str) -> tracing::Span {
    let request_id = Uuid::new_v4();
    tracing::info_span!("request", %request_id, endpoint)
}
