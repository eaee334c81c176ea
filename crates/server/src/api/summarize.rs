//! `POST /summarize-pdf` and `POST /summarize-pptx`.

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::Json;
use quickprep_core::{DocumentKind, SummaryMode};
use serde::Deserialize;
use tracing::{info, Instrument};

use crate::error::ApiError;
use crate::pipeline::SummaryReport;
use crate::state::AppState;
use crate::upload::stage_upload;

#[derive(Debug, Default, Deserialize)]
pub struct SummarizeParams {
    /// `summary` or `points`; the configured default when absent.
    pub mode: Option<String>,
}

impl SummarizeParams {
    fn resolve(&self, default: SummaryMode) -> Result<SummaryMode, ApiError> {
        match self.mode.as_deref() {
            None | Some("") => Ok(default),
            Some(raw) => raw.parse().map_err(ApiError::bad_request),
        }
    }
}

pub async fn summarize_pdf(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummarizeParams>,
    multipart: Multipart,
) -> Result<Json<SummaryReport>, ApiError> {
    summarize_upload(state, params, multipart, DocumentKind::Pdf)
        .instrument(super::request_span("summarize-pdf"))
        .await
}

pub async fn summarize_pptx(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SummarizeParams>,
    multipart: Multipart,
) -> Result<Json<SummaryReport>, ApiError> {
    summarize_upload(state, params, multipart, DocumentKind::SlideDeck)
        .instrument(super::request_span("summarize-pptx"))
        .await
}

async fn summarize_upload(
    state: Arc<AppState>,
    params: SummarizeParams,
    mut multipart: Multipart,
    kind: DocumentKind,
) -> Result<Json<SummaryReport>, ApiError> {
    let mode = params.resolve(state.default_mode)?;
    let upload = stage_upload(&mut multipart, kind, &state.config.server.upload_dir).await?;
    info!(filename = %upload.filename, size = upload.size, ?mode, "Received {}", kind);

    let doc = upload.load().await?;
    let report = state.pipeline.summarize(doc, mode).await?;

    info!(
        sections = report.sections.len(),
        warnings = report.warnings.len(),
        "Summary ready"
    );
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_falls_back_to_default() {
        let params = SummarizeParams::default();
        assert_eq!(params.resolve(SummaryMode::Points).unwrap(), SummaryMode::Points);

        let params = SummarizeParams { mode: Some("POINTS".into()) };
        assert_eq!(params.resolve(SummaryMode::Summary).unwrap(), SummaryMode::Points);
    }

    #[test]
    fn unknown_mode_is_a_bad_request() {
        let params = SummarizeParams { mode: Some("haiku".into()) };
        let err = params.resolve(SummaryMode::Summary).unwrap_err();
        assert_eq!(err.kind, quickprep_core::ErrorKind::BadRequest);
    }
}
