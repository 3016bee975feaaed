use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::pipeline::{ErrorKind, PipelineError};
use crate::llm_client::AiServiceErrorKind;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

fn pipeline_status(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::UnsupportedFormat => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_FORMAT"),
        ErrorKind::ExtractionFailure => (StatusCode::UNPROCESSABLE_ENTITY, "EXTRACTION_FAILURE"),
        ErrorKind::Validation => (StatusCode::BAD_GATEWAY, "AI_VALIDATION_ERROR"),
        ErrorKind::AiService(AiServiceErrorKind::RateLimited) => {
            (StatusCode::TOO_MANY_REQUESTS, "AI_RATE_LIMITED")
        }
        ErrorKind::AiService(AiServiceErrorKind::Network) => {
            (StatusCode::GATEWAY_TIMEOUT, "AI_NETWORK_ERROR")
        }
        ErrorKind::AiService(AiServiceErrorKind::MissingCredential) => {
            (StatusCode::SERVICE_UNAVAILABLE, "AI_MISSING_CREDENTIAL")
        }
        ErrorKind::AiService(AiServiceErrorKind::InvalidCredential) => {
            (StatusCode::SERVICE_UNAVAILABLE, "AI_INVALID_CREDENTIAL")
        }
        ErrorKind::AiService(AiServiceErrorKind::Unknown) => (StatusCode::BAD_GATEWAY, "AI_ERROR"),
        ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", msg.clone())
            }
            AppError::Pipeline(e) => {
                let (status, code) = pipeline_status(e.kind());
                if status.is_server_error() {
                    tracing::error!(retryable = e.is_retryable(), "Extraction failed: {e}");
                } else {
                    tracing::warn!("Extraction rejected: {e}");
                }
                let message = match e.kind() {
                    ErrorKind::Internal => "An internal server error occurred".to_string(),
                    _ => e.to_string(),
                };
                (status, code, message)
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_errors_map_to_statuses() {
        let cases = [
            (PipelineError::UnsupportedFormat("text/plain".into()), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (PipelineError::ExtractionFailure("empty".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (PipelineError::Validation("missing languages".into()), StatusCode::BAD_GATEWAY),
            (
                PipelineError::AiService {
                    kind: AiServiceErrorKind::RateLimited,
                    message: "429".into(),
                },
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                PipelineError::AiService {
                    kind: AiServiceErrorKind::Network,
                    message: "timeout".into(),
                },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                PipelineError::AiService {
                    kind: AiServiceErrorKind::MissingCredential,
                    message: "no key".into(),
                },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (PipelineError::Internal("join".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(AppError::from(error).into_response().status(), status);
        }
    }

    #[test]
    fn test_bad_request_is_400() {
        let response = AppError::BadRequest("missing file".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
