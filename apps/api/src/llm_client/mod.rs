/// LLM Client — the single point of entry for completion calls in cv-ingest.
///
/// Talks to any OpenAI-compatible `/chat/completions` endpoint. The client is
/// built from an explicit [`LlmConfig`] and injected where needed; there is no
/// global instance. It never retries: retry policy belongs to the caller.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const MAX_TOKENS: u32 = 4096;

/// Failure classes of the AI completion service, as surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiServiceErrorKind {
    MissingCredential,
    InvalidCredential,
    RateLimited,
    Network,
    Unknown,
}

impl AiServiceErrorKind {
    /// Only transient failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AiServiceErrorKind::RateLimited | AiServiceErrorKind::Network
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AiServiceErrorKind::MissingCredential => "missing_credential",
            AiServiceErrorKind::InvalidCredential => "invalid_credential",
            AiServiceErrorKind::RateLimited => "rate_limited",
            AiServiceErrorKind::Network => "network",
            AiServiceErrorKind::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("No API key configured for the completion service")]
    MissingCredential,

    #[error("Credential rejected (status {status}): {message}")]
    InvalidCredential { status: u16, message: String },

    #[error("Rate limited: {message}")]
    RateLimited { message: String },

    #[error("HTTP error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("Response decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl LlmError {
    pub fn kind(&self) -> AiServiceErrorKind {
        match self {
            LlmError::MissingCredential => AiServiceErrorKind::MissingCredential,
            LlmError::InvalidCredential { .. } => AiServiceErrorKind::InvalidCredential,
            LlmError::RateLimited { .. } => AiServiceErrorKind::RateLimited,
            LlmError::Network(_) | LlmError::Timeout => AiServiceErrorKind::Network,
            // Gateway failures are the network between us and the model.
            LlmError::Api {
                status: 502..=504, ..
            } => AiServiceErrorKind::Network,
            LlmError::Api { .. } | LlmError::EmptyContent | LlmError::Decode(_) => {
                AiServiceErrorKind::Unknown
            }
        }
    }
}

/// Connection settings for the completion service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

/// A request/response completion backend. `LlmClient` is the real one; tests
/// substitute in-memory fakes.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Returns the model's text answer to `prompt` under `system`.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl LlmResponse {
    /// Text of the first choice, if any.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    config: LlmConfig,
}

impl LlmClient {
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// Makes one call to the completion endpoint, returning the full response object.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(LlmError::MissingCredential)?;

        let request_body = ChatRequest {
            model: &self.config.model,
            max_tokens: MAX_TOKENS,
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout
                } else {
                    LlmError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            warn!("LLM API returned {}: {}", status, message);
            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::InvalidCredential {
                    status: status.as_u16(),
                    message,
                },
                StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited { message },
                _ => LlmError::Api {
                    status: status.as_u16(),
                    message,
                },
            });
        }

        let body = response.text().await?;
        let llm_response: LlmResponse = serde_json::from_str(&body)?;

        if let Some(usage) = &llm_response.usage {
            debug!(
                "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        Ok(llm_response)
    }
}

#[async_trait]
impl CompletionService for LlmClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(strip_json_fences(text).to_string())
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};

    fn config(base_url: &str, api_key: Option<&str>) -> LlmConfig {
        LlmConfig {
            api_key: api_key.map(str::to_string),
            base_url: base_url.to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    /// Serves a fixed status and body on `/v1/chat/completions`.
    async fn serve(status: AxumStatus, body: Value) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1")
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            LlmError::MissingCredential.kind(),
            AiServiceErrorKind::MissingCredential
        );
        assert_eq!(LlmError::Timeout.kind(), AiServiceErrorKind::Network);
        let gateway = LlmError::Api {
            status: 503,
            message: String::new(),
        };
        assert_eq!(gateway.kind(), AiServiceErrorKind::Network);
        let bad_request = LlmError::Api {
            status: 400,
            message: String::new(),
        };
        assert_eq!(bad_request.kind(), AiServiceErrorKind::Unknown);
        assert!(AiServiceErrorKind::RateLimited.is_retryable());
        assert!(!AiServiceErrorKind::InvalidCredential.is_retryable());
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        // Nothing listens on port 9; a network attempt would surface as Network.
        let client = LlmClient::new(config("http://127.0.0.1:9/v1", None)).unwrap();
        let err = client.complete("system", "prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential));

        let client = LlmClient::new(config("http://127.0.0.1:9/v1", Some("  "))).unwrap();
        let err = client.complete("system", "prompt").await.unwrap_err();
        assert!(matches!(err, LlmError::MissingCredential));
    }

    #[tokio::test]
    async fn test_status_codes_are_classified() {
        let unauthorized = serve(
            AxumStatus::UNAUTHORIZED,
            json!({"error": {"message": "Incorrect API key provided"}}),
        )
        .await;
        let err = LlmClient::new(config(&unauthorized, Some("sk-bad")))
            .unwrap()
            .complete("s", "p")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AiServiceErrorKind::InvalidCredential);
        assert!(err.to_string().contains("Incorrect API key"));

        let limited = serve(
            AxumStatus::TOO_MANY_REQUESTS,
            json!({"error": {"message": "slow down"}}),
        )
        .await;
        let err = LlmClient::new(config(&limited, Some("sk-test")))
            .unwrap()
            .complete("s", "p")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), AiServiceErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn test_successful_completion_returns_unfenced_text() {
        let url = serve(
            AxumStatus::OK,
            json!({
                "choices": [{"message": {"role": "assistant", "content": "```json\n{\"a\":1}\n```"}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3}
            }),
        )
        .await;
        let text = LlmClient::new(config(&url, Some("sk-test")))
            .unwrap()
            .complete("s", "p")
            .await
            .unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_empty_choice_is_empty_content() {
        let url = serve(AxumStatus::OK, json!({"choices": []})).await;
        let err = LlmClient::new(config(&url, Some("sk-test")))
            .unwrap()
            .complete("s", "p")
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
        assert_eq!(err.kind(), AiServiceErrorKind::Unknown);
    }
}
