use std::sync::Arc;

use quickprep_core::{Config, SummaryMode};
use quickprep_ingest::document::{ocr_from_config, OcrEngine};
use quickprep_llm::{create_provider, LlmProvider};

use crate::pipeline::Pipeline;

/// Process-wide state, built once at startup and shared by every request.
pub struct AppState {
    pub config: Config,
    pub pipeline: Pipeline,
    pub default_mode: SummaryMode,
    pub llm_provider: String,
}

impl AppState {
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let provider: Arc<dyn LlmProvider> =
            Arc::from(create_provider(&config.llm, &config.ollama)?);
        let ocr = ocr_from_config(&config.ocr);
        Ok(Self::with_parts(config, provider, ocr))
    }

    pub fn with_parts(config: Config, provider: Arc<dyn LlmProvider>, ocr: Arc<dyn OcrEngine>) -> Self {
        let default_mode = config.pipeline.default_mode.parse().unwrap_or_else(|e| {
            tracing::warn!("{e}; defaulting to summary");
            SummaryMode::default()
        });
        let llm_provider = provider.name().to_string();
        let pipeline = Pipeline::new(&config, provider, ocr);
        Self {
            config,
            pipeline,
            default_mode,
            llm_provider,
        }
    }
}
