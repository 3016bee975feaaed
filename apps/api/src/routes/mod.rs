pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::extraction::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/health", get(health::health_handler))
        // CV extraction API
        .route("/api/v1/cv/extract", post(handlers::handle_extract))
        .route(
            "/api/v1/cv/strategies",
            get(handlers::handle_list_strategies),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use docx_rs::{Docx, Paragraph, Run};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::extraction::ai::AiExtractionClient;
    use crate::extraction::pipeline::{ExtractionPipeline, PipelineConfig};
    use crate::llm_client::{LlmClient, LlmConfig};
    use crate::models::cv::ExtractionStrategy;

    const BOUNDARY: &str = "cv-ingest-test-boundary";

    fn test_config(max_upload_bytes: usize) -> Config {
        Config {
            llm_api_key: None,
            llm_base_url: "http://127.0.0.1:9/v1".to_string(),
            llm_model: "gpt-4o-mini".to_string(),
            ai_timeout_secs: 5,
            ai_max_retries: 0,
            default_strategy: ExtractionStrategy::HeuristicOnly,
            max_upload_bytes,
            port: 0,
            rust_log: "info".to_string(),
        }
    }

    /// Real client with no key: AI strategies fail before any network call.
    fn app_with_limit(max_upload_bytes: usize) -> Router {
        let config = test_config(max_upload_bytes);
        let llm = LlmClient::new(LlmConfig {
            api_key: None,
            base_url: config.llm_base_url.clone(),
            model: config.llm_model.clone(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();
        let pipeline = ExtractionPipeline::new(
            AiExtractionClient::new(Arc::new(llm)),
            PipelineConfig {
                ai_timeout: Duration::from_secs(5),
                ai_max_retries: 0,
            },
        );
        build_router(AppState {
            pipeline: Arc::new(pipeline),
            config,
        })
    }

    fn app() -> Router {
        app_with_limit(1024 * 1024)
    }

    fn cv_docx() -> Vec<u8> {
        let lines = [
            "Marie Curie",
            "marie.curie@example.com",
            "Expérience",
            "Institut du Radium | Directrice | Paris | 1914 - 1934",
            "Langues",
            "Polonais, Français",
        ];
        let mut doc = Docx::new();
        for line in lines {
            doc = doc.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
        }
        let mut buffer = Cursor::new(Vec::new());
        doc.build().pack(&mut buffer).unwrap();
        buffer.into_inner()
    }

    fn multipart_body(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload(uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "cv-ingest-api");
    }

    #[tokio::test]
    async fn test_list_strategies() {
        let response = app()
            .oneshot(Request::get("/api/v1/cv/strategies").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let names: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["heuristic", "ai", "augmented"]);
        assert_eq!(body[0]["isDefault"], true);
        assert_eq!(body[0]["usesAi"], false);
    }

    #[tokio::test]
    async fn test_extract_docx_with_default_strategy() {
        let body = multipart_body("file", "cv.docx", "application/octet-stream", &cv_docx());
        let response = app().oneshot(upload("/api/v1/cv/extract", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let record = json_body(response).await;
        assert_eq!(record["personalInfo"]["email"], "marie.curie@example.com");
        assert_eq!(record["experience"][0]["company"], "Institut du Radium");
        assert_eq!(record["experience"][0]["position"], "Directrice");
        assert_eq!(record["languages"].as_array().unwrap().len(), 2);
        assert_eq!(record["metadata"]["sourceFormat"], "docx");
        assert_eq!(record["metadata"]["strategy"], "heuristic_only");
    }

    #[tokio::test]
    async fn test_unsupported_content_type_is_415() {
        let body = multipart_body("file", "cv.txt", "text/plain", b"Marie Curie");
        let response = app().oneshot(upload("/api/v1/cv/extract", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn test_unknown_strategy_is_400() {
        let body = multipart_body("file", "cv.docx", "application/octet-stream", &cv_docx());
        let response = app()
            .oneshot(upload("/api/v1/cv/extract?strategy=magic", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_file_field_is_400() {
        let body = multipart_body("attachment", "cv.docx", "application/octet-stream", &cv_docx());
        let response = app().oneshot(upload("/api/v1/cv/extract", body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ai_strategy_without_key_is_503() {
        let body = multipart_body("file", "cv.docx", "application/octet-stream", &cv_docx());
        let response = app()
            .oneshot(upload("/api/v1/cv/extract?strategy=ai", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "AI_MISSING_CREDENTIAL");
    }

    #[tokio::test]
    async fn test_augmented_without_key_degrades_to_heuristics() {
        let body = multipart_body("file", "cv.docx", "application/octet-stream", &cv_docx());
        let response = app()
            .oneshot(upload("/api/v1/cv/extract?strategy=augmented", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let record = json_body(response).await;
        assert_eq!(record["experience"][0]["company"], "Institut du Radium");
        assert_eq!(record["metadata"]["warnings"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_413() {
        let body = multipart_body("file", "cv.docx", "application/octet-stream", &cv_docx());
        let response = app_with_limit(256)
            .oneshot(upload("/api/v1/cv/extract", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
