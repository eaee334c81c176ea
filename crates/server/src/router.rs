//! HTTP router construction.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.server.max_upload_bytes();
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(api::health))
        .route(
            "/summarize-pdf",
            post(api::summarize_pdf).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/summarize-pptx",
            post(api::summarize_pptx).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/generate-mcq",
            post(api::generate_mcq).layer(DefaultBodyLimit::max(body_limit)),
        )
        .layer(cors)
        .with_state(state)
}

/// `*` allows any origin; otherwise a comma-separated origin list.
fn cors_layer(origins: &str) -> CorsLayer {
    if origins.trim() == "*" {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins configured, allowing any");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{multipart_request, pdf_bytes, pptx_bytes, test_state};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use quickprep_llm::testing::FakeProvider;
    use tower::ServiceExt;

    const LECTURE: &str =
        "INTRODUCTION\nThis is body text. It has two sentences.\nCONCLUSION\nFinal thought here.";

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_provider() {
        let (state, _, _, _dir) = test_state(FakeProvider::fixed("ok"), "");
        let response = build_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["llm_provider"], "fake");
    }

    #[tokio::test]
    async fn docx_is_rejected_before_extraction() {
        let (state, provider, ocr, dir) = test_state(FakeProvider::fixed("unused"), LECTURE);
        let request = multipart_request("/summarize-pdf", "report.docx", b"PK fake docx");
        let response = build_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "unsupported_file_type");
        assert_eq!(body["retryable"], false);
        assert_eq!(ocr.calls(), 0);
        assert_eq!(provider.call_count(), 0);
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn pdf_summary_lists_sections_in_order() {
        let (state, _, ocr, dir) = test_state(FakeProvider::fixed("A short recap."), LECTURE);
        let request = multipart_request("/summarize-pdf", "lecture.pdf", &pdf_bytes());
        let response = build_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body,
            serde_json::json!({
                "sections": [
                    {"heading": "INTRODUCTION", "summary": "A short recap."},
                    {"heading": "CONCLUSION", "summary": "A short recap."}
                ]
            })
        );
        assert_eq!(ocr.calls(), 1);

        // The staged upload is gone once the request completes.
        let leftovers = std::fs::read_dir(dir.path().join("uploads")).unwrap().count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn pptx_points_mode() {
        let (state, provider, _, _dir) = test_state(
            FakeProvider::fixed("1. Revenue grew in every region.\n2. Costs stayed flat."),
            "",
        );
        let request = multipart_request("/summarize-pptx?mode=points", "deck.pptx", &pptx_bytes());
        let response = build_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["sections"][0]["heading"], "Quarterly review");
        assert_eq!(
            body["sections"][0]["points"],
            serde_json::json!(["Revenue grew in every region.", "Costs stayed flat."])
        );
        assert!(body.get("warnings").is_none());
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn pptx_endpoint_rejects_pdf() {
        let (state, _, _, _dir) = test_state(FakeProvider::fixed("unused"), "");
        let request = multipart_request("/summarize-pptx", "lecture.pdf", &pdf_bytes());
        let response = build_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["kind"], "unsupported_file_type");
    }

    #[tokio::test]
    async fn bad_mode_is_rejected() {
        let (state, _, _, _dir) = test_state(FakeProvider::fixed("unused"), LECTURE);
        let request = multipart_request("/summarize-pdf?mode=haiku", "lecture.pdf", &pdf_bytes());
        let response = build_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["kind"], "bad_request");
    }

    #[tokio::test]
    async fn model_outage_maps_to_503() {
        let (state, _, _, _dir) = test_state(FakeProvider::failing(502), LECTURE);
        let request = multipart_request("/summarize-pdf", "lecture.pdf", &pdf_bytes());
        let response = build_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "model_unavailable");
        assert_eq!(body["retryable"], true);
    }

    #[tokio::test]
    async fn mcq_returns_questions() {
        let reply = r#"```json
[{"question":"Which organelle makes ATP?","options":{"A":"Nucleus","B":"Mitochondrion","C":"Ribosome","D":"Golgi"},"answer":"B"}]
```"#;
        let text = "Cells contain organelles with distinct jobs. ".repeat(5);
        let (state, _, _, _dir) = test_state(FakeProvider::fixed(reply), &text);
        let request = multipart_request("/generate-mcq", "bio.pdf", &pdf_bytes());
        let response = build_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["questions"][0]["answer"], "B");
        assert_eq!(body["questions"][0]["options"]["B"], "Mitochondrion");
    }

    #[tokio::test]
    async fn mcq_parse_failure_is_422_with_raw() {
        let text = "Cells contain organelles with distinct jobs. ".repeat(5);
        let (state, _, _, _dir) = test_state(FakeProvider::fixed("I'd rather not."), &text);
        let request = multipart_request("/generate-mcq", "bio.pdf", &pdf_bytes());
        let response = build_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json_body(response).await;
        assert_eq!(body["kind"], "model_output_parse_failure");
        assert_eq!(body["raw"], "I'd rather not.");
    }

    #[tokio::test]
    async fn mcq_short_text_is_400() {
        let (state, provider, _, _dir) = test_state(FakeProvider::fixed("[]"), "Tiny.");
        let request = multipart_request("/generate-mcq", "bio.pdf", &pdf_bytes());
        let response = build_router(state).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "PDF has insufficient text");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn missing_file_field_is_400() {
        let (state, _, _, _dir) = test_state(FakeProvider::fixed("unused"), LECTURE);
        let boundary = "quickprep-test-boundary";
        let body = format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{boundary}--\r\n"
        );
        let request = Request::post("/summarize-pdf")
            .header("content-type", format!("multipart/form-data; boundary={boundary}"))
            .body(Body::from(body))
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "No file provided");
    }

    #[test]
    fn cors_origin_list_tolerates_junk() {
        // Builds without panicking for each shape of setting.
        let _ = cors_layer("*");
        let _ = cors_layer("http://localhost:3000, https://app.example.com");
        let _ = cors_layer("  ,  ");
    }
}
