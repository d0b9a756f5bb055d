//! Axum route handler for the upload endpoint.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Multipart, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{CvRecord, UploadResponse};
use crate::ratelimit::{client_identifier, rate_limit_headers, Pool};
use crate::state::AppState;
use crate::upload::extract::extract_text;
use crate::upload::validate::validate_files;

/// POST /upload
///
/// Multipart intake with the field name `files`. Validation rejections and
/// per-file extraction failures are reported alongside the files that did
/// succeed; only a batch with zero valid files is a 400.
pub async fn handle_upload(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let identifier = client_identifier(&headers, Some(peer));
    let decision = state.limiter.check(Pool::Upload, &identifier);
    if !decision.allowed {
        return Err(AppError::rate_limited(&decision));
    }

    let incoming = collect_files(&mut multipart).await?;
    if incoming.is_empty() {
        return Err(AppError::Validation("No files provided".to_string()));
    }

    let meta: Vec<(String, usize)> = incoming
        .iter()
        .map(|(name, data)| (name.clone(), data.len()))
        .collect();
    let outcome = validate_files(&meta);

    if outcome.accepted.is_empty() {
        return Err(AppError::Validation(format!(
            "No valid files found: {}",
            outcome.rejections.join("; ")
        )));
    }

    let mut files = Vec::with_capacity(outcome.accepted.len());
    let mut errors = outcome.rejections;

    for accepted in outcome.accepted {
        let (filename, data) = incoming[accepted.index].clone();
        let size = data.len();
        let extension = accepted.extension;

        // Extraction is CPU-bound; keep it off the async workers.
        let extracted = tokio::task::spawn_blocking(move || extract_text(&data, &extension))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction task panicked: {e}")))?;

        match extracted {
            Ok(text) => {
                info!("extracted {} chars from {filename}", text.chars().count());
                files.push(CvRecord::new(filename, text, size));
            }
            Err(e) => {
                warn!("extraction failed for {filename}: {e}");
                errors.push(format!("Failed to process {filename}: {e}"));
            }
        }
    }

    let response = UploadResponse {
        success: !files.is_empty(),
        files,
        errors: (!errors.is_empty()).then_some(errors),
    };

    Ok((rate_limit_headers(&decision), Json(response)).into_response())
}

/// Drains the multipart stream, keeping `files` fields as (filename, bytes)
/// pairs in submission order. Unknown fields are consumed and ignored.
async fn collect_files(multipart: &mut Multipart) -> Result<Vec<(String, Bytes)>, AppError> {
    let mut incoming = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart request: {e}")))?
    {
        if field.name() != Some("files") {
            let _ = field.bytes().await;
            continue;
        }

        let filename = field.file_name().unwrap_or("unknown").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read file {filename}: {e}")))?;
        incoming.push((filename, data));
    }

    Ok(incoming)
}
