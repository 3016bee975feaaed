use std::path::Path;

use axum::{
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::extraction::document::DocumentFormat;
use crate::extraction::pipeline::PipelineError;
use crate::models::cv::{CvRecord, ExtractionStrategy};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct ExtractQuery {
    pub strategy: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StrategyInfo {
    pub name: &'static str,
    pub uses_ai: bool,
    pub is_default: bool,
}

struct Upload {
    data: Bytes,
    content_type: Option<String>,
    file_name: Option<String>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Content types that say nothing about the document itself.
fn is_generic_type(content_type: &str) -> bool {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    essence.is_empty() || essence.eq_ignore_ascii_case("application/octet-stream")
}

/// Declared content type first, then the file extension, then magic bytes.
/// Sniffing only runs when nothing specific was declared, so a declared
/// unsupported type is rejected before any decoding.
fn resolve_format(
    content_type: Option<&str>,
    file_name: Option<&str>,
    data: &[u8],
) -> Result<DocumentFormat, PipelineError> {
    let declared = content_type.filter(|ct| !is_generic_type(ct));
    if let Some(format) = declared.and_then(|ct| DocumentFormat::from_tag(ct).ok()) {
        return Ok(format);
    }

    let named = file_name.filter(|name| Path::new(name).extension().is_some());
    if let Some(name) = named {
        match DocumentFormat::from_tag(name) {
            Ok(format) => return Ok(format),
            Err(_) if declared.is_none() => {
                return Err(PipelineError::UnsupportedFormat(name.to_string()))
            }
            Err(_) => {}
        }
    }

    if let Some(ct) = declared {
        return Err(PipelineError::UnsupportedFormat(ct.to_string()));
    }
    DocumentFormat::sniff(data)
        .ok_or_else(|| PipelineError::UnsupportedFormat("unknown (no content type)".to_string()))
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            // drain unknown parts
            field.bytes().await.map_err(multipart_error)?;
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_error)?;
        upload = Some(Upload {
            data,
            content_type,
            file_name,
        });
    }
    upload.ok_or_else(|| AppError::BadRequest(format!("multipart field '{FILE_FIELD}' is required")))
}

/// POST /api/v1/cv/extract?strategy=heuristic|ai|augmented
pub async fn handle_extract(
    State(state): State<AppState>,
    Query(query): Query<ExtractQuery>,
    multipart: Multipart,
) -> Result<Json<CvRecord>, AppError> {
    let strategy = match query.strategy.as_deref() {
        Some(name) => ExtractionStrategy::parse(name).ok_or_else(|| {
            AppError::BadRequest(format!(
                "unknown strategy '{name}', expected one of: heuristic, ai, augmented"
            ))
        })?,
        None => state.config.default_strategy,
    };

    let upload = read_upload(multipart).await?;
    if upload.data.is_empty() {
        return Err(AppError::BadRequest("uploaded file is empty".to_string()));
    }
    let format = resolve_format(
        upload.content_type.as_deref(),
        upload.file_name.as_deref(),
        &upload.data,
    )?;
    debug!(
        "Upload received: name={:?}, content_type={:?}, format={}, bytes={}",
        upload.file_name,
        upload.content_type,
        format,
        upload.data.len()
    );

    let record = state
        .pipeline
        .run(upload.data.to_vec(), format, strategy)
        .await?;
    Ok(Json(record))
}

/// GET /api/v1/cv/strategies
pub async fn handle_list_strategies(State(state): State<AppState>) -> Json<Vec<StrategyInfo>> {
    Json(
        ExtractionStrategy::ALL
            .iter()
            .map(|strategy| StrategyInfo {
                name: strategy.as_str(),
                uses_ai: strategy.uses_ai(),
                is_default: *strategy == state.config.default_strategy,
            })
            .collect(),
    )
}
