//! Axum route handler for the analyze endpoint.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use crate::analysis::batch::{run_batch, validate_request, AnalysisRequest};
use crate::errors::AppError;
use crate::ratelimit::{client_identifier, rate_limit_headers, Pool};
use crate::state::AppState;

/// POST /analyze
///
/// The limiter is consulted before the body is even decoded: an exhausted
/// analyze pool gets a 429 with zero request processing. The raw body is
/// decoded manually afterwards so malformed JSON maps to our 400 shape.
pub async fn handle_analyze(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let identifier = client_identifier(&headers, Some(peer));
    let decision = state.limiter.check(Pool::Analyze, &identifier);
    if !decision.allowed {
        return Err(AppError::rate_limited(&decision));
    }

    let request: AnalysisRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?;

    validate_request(&request)?;

    info!(
        "analyzing {} CVs against '{}' via {}",
        request.cv_ids.len(),
        request.job_profile.title,
        state.provider.name()
    );

    let result = run_batch(state.provider.as_ref(), &request).await;

    Ok((rate_limit_headers(&decision), Json(result)).into_response())
}
