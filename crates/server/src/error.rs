//! Error responses: `{"error", "kind", "retryable"}` plus `raw` for unparsable model output.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use quickprep_core::ErrorKind;
use quickprep_llm::McqError;
use serde::Serialize;

use crate::pipeline::PipelineError;

#[derive(Debug)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    pub raw: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    kind: ErrorKind,
    retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw: Option<&'a str>,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raw: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let kind = err.kind();
        match err {
            PipelineError::Mcq(McqError::InvalidJson { reason, raw }) => Self {
                kind,
                message: format!("Model returned invalid JSON: {reason}"),
                raw: Some(raw),
            },
            PipelineError::InsufficientText { .. } => Self::new(kind, "PDF has insufficient text"),
            other => Self::new(kind, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = %self.kind, "{}", self.message);
        } else {
            tracing::warn!(kind = %self.kind, "{}", self.message);
        }
        let body = ErrorBody {
            error: &self.message,
            kind: self.kind,
            retryable: self.kind.is_retryable(),
            raw: self.raw.as_deref(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn parse_failure_carries_raw_text() {
        let err = ApiError::from(PipelineError::Mcq(McqError::InvalidJson {
            reason: "expected value".into(),
            raw: "Sorry, no.".into(),
        }));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "model_output_parse_failure");
        assert_eq!(body["raw"], "Sorry, no.");
        assert_eq!(body["retryable"], false);
    }

    #[tokio::test]
    async fn insufficient_text_is_a_bad_request() {
        let err = ApiError::from(PipelineError::InsufficientText { chars: 3, min: 100 });
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "PDF has insufficient text");
        assert!(body.get("raw").is_none());
    }

    #[tokio::test]
    async fn model_outage_is_retryable() {
        let err = ApiError::new(ErrorKind::ModelUnavailable, "connection refused");
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["retryable"], true);
    }
}
