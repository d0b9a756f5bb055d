//! In-memory, per-identifier rate limiting.
//!
//! Three independently configured pools gate the HTTP surface: upload,
//! analyze, and general. Counters are fixed-window and process-local — the
//! limiter is best-effort, not a security boundary, and callers must treat
//! reset times as advisory. The limiter is injected via `AppState` so a
//! distributed store can replace it without touching the pipeline.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::{HeaderMap, HeaderName, HeaderValue};

/// Shared bucket for callers whose address cannot be derived. Known
/// weakness: all unidentifiable callers spend from this one bucket.
pub const ANONYMOUS_IDENTIFIER: &str = "anonymous";

pub const REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RESET_HEADER: &str = "x-ratelimit-reset";

/// The quota pool an endpoint consumes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pool {
    Upload,
    Analyze,
    General,
}

impl Pool {
    /// Quota and window per pool. Upload: 5/60s, analyze: 3/300s,
    /// general: 100/60s.
    fn quota(self) -> (u32, Duration) {
        match self {
            Pool::Upload => (5, Duration::from_secs(60)),
            Pool::Analyze => (3, Duration::from_secs(300)),
            Pool::General => (100, Duration::from_secs(60)),
        }
    }
}

/// Outcome of a consume-check. `reset_after_ms` is the time until the
/// current window expires for this identifier.
#[derive(Debug, Clone, Copy)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_after_ms: u64,
}

#[derive(Debug)]
struct Window {
    started: Instant,
    used: u32,
}

/// Fixed-window limiter over a Mutex-guarded map. The consume-check is
/// atomic under the lock, so concurrent requests from one identifier cannot
/// double-spend quota.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<(Pool, String), Window>>,
}

/// Prune the map once it tracks this many identifiers. Keeps an unbounded
/// stream of one-shot callers from growing the map forever.
const PRUNE_THRESHOLD: usize = 4096;

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one point from `pool` for `identifier` and reports the
    /// decision. An exhausted pool reports `allowed: false` without
    /// mutating the window further.
    pub fn check(&self, pool: Pool, identifier: &str) -> Decision {
        self.check_at(pool, identifier, Instant::now())
    }

    fn check_at(&self, pool: Pool, identifier: &str, now: Instant) -> Decision {
        let (points, window) = pool.quota();
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() >= PRUNE_THRESHOLD {
            windows.retain(|(p, _), w| now.duration_since(w.started) < p.quota().1);
        }

        let entry = windows
            .entry((pool, identifier.to_string()))
            .or_insert(Window {
                started: now,
                used: 0,
            });

        let elapsed = now.duration_since(entry.started);
        if elapsed >= window {
            entry.started = now;
            entry.used = 0;
        }

        let reset_after_ms = window
            .saturating_sub(now.duration_since(entry.started))
            .as_millis() as u64;

        if entry.used >= points {
            return Decision {
                allowed: false,
                remaining: 0,
                reset_after_ms,
            };
        }

        entry.used += 1;
        Decision {
            allowed: true,
            remaining: points - entry.used,
            reset_after_ms,
        }
    }
}

/// `X-RateLimit-*` headers carried by every success and 429 response.
pub fn rate_limit_headers(decision: &Decision) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(REMAINING_HEADER),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        HeaderName::from_static(RESET_HEADER),
        HeaderValue::from(decision.reset_after_ms),
    );
    headers
}

/// Derives the limiter identifier for a request: the first address in
/// `X-Forwarded-For` if present, else the socket peer address, else the
/// shared anonymous sentinel.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => ANONYMOUS_IDENTIFIER.to_string(),
    }
}
