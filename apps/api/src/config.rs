use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::extraction::pipeline::PipelineConfig;
use crate::llm_client::LlmConfig;
use crate::models::cv::ExtractionStrategy;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// A missing LLM key is not a startup error: heuristic extraction works without
/// it and AI strategies report the missing credential per request.
#[derive(Debug, Clone)]
pub struct Config {
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub ai_timeout_secs: u64,
    pub ai_max_retries: u32,
    pub default_strategy: ExtractionStrategy,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_strategy = match std::env::var("DEFAULT_STRATEGY") {
            Ok(value) => ExtractionStrategy::parse(&value).ok_or_else(|| {
                anyhow!("DEFAULT_STRATEGY must be one of heuristic, ai, augmented (got '{value}')")
            })?,
            Err(_) => ExtractionStrategy::HeuristicOnly,
        };

        Ok(Config {
            llm_api_key: optional_env("LLM_API_KEY").or_else(|| optional_env("OPENAI_API_KEY")),
            llm_base_url: optional_env("LLM_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            ai_timeout_secs: parse_env("AI_TIMEOUT_SECS", 60)?,
            ai_max_retries: parse_env("AI_MAX_RETRIES", 2)?,
            default_strategy,
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn llm_config(&self) -> LlmConfig {
        LlmConfig {
            api_key: self.llm_api_key.clone(),
            base_url: self.llm_base_url.trim_end_matches('/').to_string(),
            model: self.llm_model.clone(),
            timeout: Duration::from_secs(self.ai_timeout_secs),
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            ai_timeout: Duration::from_secs(self.ai_timeout_secs),
            ai_max_retries: self.ai_max_retries,
        }
    }
}

/// Unset and blank values are both "absent".
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number (got '{raw}')")),
        None => Ok(default),
    }
}
