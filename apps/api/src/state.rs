use std::sync::Arc;

use crate::config::Config;
use crate::extraction::pipeline::ExtractionPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ExtractionPipeline>,
    pub config: Config,
}
