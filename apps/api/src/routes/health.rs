use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::errors::AppError;
use crate::ratelimit::{client_identifier, rate_limit_headers, Pool};
use crate::state::AppState;

/// GET /health
///
/// Liveness plus the caller's current general-pool quota state. Spends from
/// the general pool, so even health checks can 429.
pub async fn handle_health(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let identifier = client_identifier(&headers, Some(peer));
    let decision = state.limiter.check(Pool::General, &identifier);
    if !decision.allowed {
        return Err(AppError::rate_limited(&decision));
    }

    let body = Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "rateLimit": {
            "remaining": decision.remaining,
            "reset": decision.reset_after_ms,
        }
    }));

    Ok((rate_limit_headers(&decision), body).into_response())
}
