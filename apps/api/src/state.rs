use std::sync::Arc;

use crate::analysis::provider::AnalysisProvider;
use crate::config::Config;
use crate::ratelimit::RateLimiter;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Per-identifier quota counters. Injected so a distributed limiter can
    /// replace the in-memory one without touching the pipeline.
    pub limiter: Arc<RateLimiter>,
    /// Pluggable analysis backend, selected at startup via ANALYSIS_PROVIDER.
    pub provider: Arc<dyn AnalysisProvider>,
    pub config: Config,
}
