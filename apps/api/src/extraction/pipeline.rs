//! Pipeline Orchestrator — bytes in, one `CvRecord` or one typed failure out.
//!
//! Decoding and heuristics are CPU-bound and run on the blocking pool. The AI
//! call is the only I/O; it is bounded by a timeout and retried here (never in
//! the client) when the failure is transient.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::extraction::ai::{AiExtractionClient, AiExtractionError};
use crate::extraction::assembler::{assemble, AssemblyContext};
use crate::extraction::document::{extract_text, DocumentError, DocumentFormat};
use crate::extraction::heuristics::{merge_preferring, run_heuristics, PartialField};
use crate::llm_client::AiServiceErrorKind;
use crate::models::cv::{CvRecord, ExtractionStrategy};

/// Flat failure taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    UnsupportedFormat,
    ExtractionFailure,
    AiService(AiServiceErrorKind),
    Validation,
    Internal,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Text extraction failed: {0}")]
    ExtractionFailure(String),

    #[error("AI service error ({}): {message}", .kind.as_str())]
    AiService {
        kind: AiServiceErrorKind,
        message: String,
    },

    #[error("AI response failed validation: {0}")]
    Validation(String),

    #[error("Internal pipeline error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            PipelineError::ExtractionFailure(_) => ErrorKind::ExtractionFailure,
            PipelineError::AiService { kind, .. } => ErrorKind::AiService(*kind),
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, PipelineError::AiService { kind, .. } if kind.is_retryable())
    }
}

impl From<DocumentError> for PipelineError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::UnsupportedFormat(tag) => PipelineError::UnsupportedFormat(tag),
            DocumentError::ExtractionFailure(msg) => PipelineError::ExtractionFailure(msg),
        }
    }
}

impl From<AiExtractionError> for PipelineError {
    fn from(e: AiExtractionError) -> Self {
        match e {
            AiExtractionError::Service(kind, message) => PipelineError::AiService { kind, message },
            AiExtractionError::Validation(msg) => PipelineError::Validation(msg),
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> PipelineError {
    PipelineError::Internal(format!("blocking task failed: {e}"))
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Bound on a single AI attempt.
    pub ai_timeout: Duration,
    /// Extra attempts after a retryable AI failure.
    pub ai_max_retries: u32,
}

#[derive(Clone)]
pub struct ExtractionPipeline {
    ai: AiExtractionClient,
    config: PipelineConfig,
}

impl ExtractionPipeline {
    pub fn new(ai: AiExtractionClient, config: PipelineConfig) -> Self {
        Self { ai, config }
    }

    /// Single entry point: raw bytes + format + strategy.
    pub async fn run(
        &self,
        bytes: Vec<u8>,
        format: DocumentFormat,
        strategy: ExtractionStrategy,
    ) -> Result<CvRecord, PipelineError> {
        let byte_count = bytes.len();
        let text = tokio::task::spawn_blocking(move || extract_text(&bytes, format))
            .await
            .map_err(join_error)??;

        let context = AssemblyContext::new(text, format, strategy);
        let record = match strategy {
            ExtractionStrategy::HeuristicOnly => {
                tokio::task::spawn_blocking(move || {
                    let fields = run_heuristics(&context.raw_text);
                    assemble(fields, context)
                })
                .await
                .map_err(join_error)?
            }
            ExtractionStrategy::AiOnly => {
                let fields = self
                    .with_retries(|| self.ai.extract(&context.raw_text))
                    .await?;
                assemble(fields, context)
            }
            ExtractionStrategy::AiAugmented => self.run_augmented(context).await?,
        };

        info!(
            "Extracted CV: format={}, strategy={}, bytes={}, chars={}, experience={}, education={}, skills={}, warnings={}",
            format,
            strategy.as_str(),
            byte_count,
            record.metadata.character_count,
            record.experience.len(),
            record.education.len(),
            record.skills.len(),
            record.metadata.warnings.len()
        );
        Ok(record)
    }

    /// Heuristics first; the AI then refines that draft. Any AI failure,
    /// validation included, leaves the heuristic draft as the answer.
    async fn run_augmented(&self, context: AssemblyContext) -> Result<CvRecord, PipelineError> {
        let text = context.raw_text.clone();
        let heuristic_fields: Vec<PartialField> =
            tokio::task::spawn_blocking(move || run_heuristics(&text))
                .await
                .map_err(join_error)?;
        let mut draft = assemble(heuristic_fields.clone(), context.clone());

        let refined = self
            .with_retries(|| self.ai.refine(&context.raw_text, &draft))
            .await;
        match refined {
            Ok(ai_fields) => Ok(assemble(
                merge_preferring(ai_fields, heuristic_fields),
                context,
            )),
            Err(e) => {
                warn!("AI refinement failed, keeping heuristic result: {e}");
                draft
                    .metadata
                    .warnings
                    .push(format!("AI augmentation unavailable, heuristic result returned: {e}"));
                Ok(draft)
            }
        }
    }

    /// Runs `call` under the per-attempt timeout, retrying transient failures
    /// with exponential backoff (1s, 2s, 4s...).
    async fn with_retries<F, Fut>(&self, mut call: F) -> Result<Vec<PartialField>, AiExtractionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Vec<PartialField>, AiExtractionError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            let result = match tokio::time::timeout(self.config.ai_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(AiExtractionError::Service(
                    AiServiceErrorKind::Network,
                    format!(
                        "AI call timed out after {}s",
                        self.config.ai_timeout.as_secs()
                    ),
                )),
            };

            match result {
                Err(AiExtractionError::Service(kind, message))
                    if kind.is_retryable() && attempt < self.config.ai_max_retries =>
                {
                    let delay = Duration::from_millis(1000 * (1u64 << attempt));
                    warn!(
                        "AI call attempt {} failed ({}), retrying after {}ms...",
                        attempt + 1,
                        message,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }
}
