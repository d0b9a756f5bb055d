pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers::handle_analyze;
use crate::jobparse::handlers::handle_parse_job;
use crate::state::AppState;
use crate::upload::handlers::handle_upload;
use crate::upload::validate::{MAX_FILES_PER_UPLOAD, MAX_FILE_SIZE};

/// Request bodies up to a full upload batch plus multipart overhead. The
/// axum default (2MB) is too small for both uploads and analyze payloads
/// carrying 20 extracted CV texts.
const MAX_BODY_BYTES: usize = MAX_FILES_PER_UPLOAD * MAX_FILE_SIZE + 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::handle_health))
        .route("/upload", post(handle_upload))
        .route("/parse-job", post(handle_parse_job))
        .route("/analyze", post(handle_analyze))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
