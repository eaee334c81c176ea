//! `POST /generate-mcq`.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;
use quickprep_core::DocumentKind;
use tracing::{info, Instrument};

use crate::error::ApiError;
use crate::pipeline::McqReport;
use crate::state::AppState;
use crate::upload::stage_upload;

pub async fn generate_mcq(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<McqReport>, ApiError> {
    mcq_from_upload(state, multipart)
        .instrument(super::request_span("generate-mcq"))
        .await
}

async fn mcq_from_upload(
    state: Arc<AppState>,
    mut multipart: Multipart,
) -> Result<Json<McqReport>, ApiError> {
    let upload =
        stage_upload(&mut multipart, DocumentKind::Pdf, &state.config.server.upload_dir).await?;
    info!(filename = %upload.filename, size = upload.size, "Received PDF for MCQs");

    let doc = upload.load().await?;
    let questions = state.pipeline.generate_mcq(doc).await?;
    info!(questions = questions.len(), "Questions ready");
    Ok(Json(McqReport { questions }))
}
