//! Axum route handler for the parse-job endpoint.

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::jobparse::{
    parse_job_description, Language, ParseJobError, ParsedJobData, MAX_JOB_TEXT_LENGTH,
};
use crate::ratelimit::{client_identifier, rate_limit_headers, Pool};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseJobRequest {
    #[serde(default)]
    pub job_text: String,
    #[serde(default)]
    pub language: Language,
}

#[derive(Debug, Serialize)]
pub struct ParseJobResponse {
    pub success: bool,
    pub data: ParsedJobData,
}

/// POST /parse-job
///
/// One LLM call per request, so it spends from the analyze pool. The limiter
/// runs before the body is decoded.
pub async fn handle_parse_job(
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

    let request: ParseJobRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))?;

    if request.job_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Job description text is required".to_string(),
        ));
    }
    if request.job_text.chars().count() > MAX_JOB_TEXT_LENGTH {
        return Err(AppError::Validation(format!(
            "Job description is too long (max {MAX_JOB_TEXT_LENGTH} characters)"
        )));
    }

    info!(
        "parsing job description ({} chars, {:?}) via {}",
        request.job_text.chars().count(),
        request.language,
        state.provider.name()
    );

    let data = parse_job_description(state.provider.as_ref(), &request.job_text, request.language)
        .await
        .map_err(|e| match e {
            ParseJobError::Provider(crate::analysis::provider::ProviderError::Config(msg)) => {
                AppError::Config(msg)
            }
            other => AppError::Llm(other.to_string()),
        })?;

    Ok((
        rate_limit_headers(&decision),
        Json(ParseJobResponse {
            success: true,
            data,
        }),
    )
        .into_response())
}
