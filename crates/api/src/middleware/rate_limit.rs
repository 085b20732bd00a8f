//! Rate limiting middleware.
//!
//! Limits public token endpoints per client address, so invite tokens and
//! codes cannot be guessed by brute force.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::keyed::DashMapStateStore,
    Quota, RateLimiter,
};
use serde_json::json;
use std::{
    net::SocketAddr,
    num::NonZeroU32,
    sync::atomic::{AtomicU64, Ordering},
};

use crate::app::AppState;

type ClientRateLimiter<C> =
    RateLimiter<String, DashMapStateStore<String>, C, NoOpMiddleware<<C as Clock>::Instant>>;

const DEFAULT_RATE_LIMIT: NonZeroU32 = match NonZeroU32::new(60) {
    Some(n) => n,
    None => unreachable!(),
};

/// Checks between two sweeps of idle client keys.
const SWEEP_EVERY: u64 = 1024;

/// Rate limiter state shared across all requests, keyed by client address.
///
/// Keys whose bucket has fully refilled are swept periodically, so the
/// number of retained keys tracks recently active clients only.
pub struct RateLimiterState<C: Clock = DefaultClock> {
    limiter: ClientRateLimiter<C>,
    rate_limit_per_minute: u32,
    checks: AtomicU64,
}

impl RateLimiterState {
    /// Create a new rate limiter state with the specified limit per minute.
    pub fn new(rate_limit_per_minute: u32) -> Self {
        Self::with_clock(rate_limit_per_minute, DefaultClock::default())
    }
}

impl<C: Clock> RateLimiterState<C> {
    pub fn with_clock(rate_limit_per_minute: u32, clock: C) -> Self {
        let quota =
            Quota::per_minute(NonZeroU32::new(rate_limit_per_minute).unwrap_or(DEFAULT_RATE_LIMIT));
        Self {
            limiter: RateLimiter::dashmap_with_clock(quota, clock),
            rate_limit_per_minute,
            checks: AtomicU64::new(0),
        }
    }

    pub fn rate_limit_per_minute(&self) -> u32 {
        self.rate_limit_per_minute
    }

    /// Number of client keys currently held.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }

    /// Drops keys whose bucket is indistinguishable from a fresh one.
    pub fn sweep(&self) {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
    }

    /// Check if a request from the given client should be allowed.
    /// Returns Ok(()) if allowed, or Err with retry_after seconds if rate limited.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep();
        }

        match self.limiter.check_key(&key.to_string()) {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(self.limiter.clock().now());
                Err(wait_time.as_secs().max(1))
            }
        }
    }
}

impl<C: Clock> std::fmt::Debug for RateLimiterState<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("tracked_clients", &self.limiter.len())
            .finish()
    }
}

/// Resolves the key a request is limited under.
///
/// With a trusted proxy in front, the right-most `X-Forwarded-For` entry is
/// the address that proxy saw; entries to its left are client supplied.
/// Falls back to the peer address, then a shared bucket.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.rsplit(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware that applies rate limiting per client address.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(rate_limiter) = state.rate_limiter.as_ref() else {
        return next.run(req).await;
    };

    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    let key = client_key(
        req.headers(),
        peer,
        state.config.security.trust_forwarded_for,
    );

    if let Err(retry_after) = rate_limiter.check(&key) {
        tracing::warn!(client = %key, "Rate limit exceeded");
        return rate_limited_response(rate_limiter.rate_limit_per_minute(), retry_after);
    }

    next.run(req).await
}

/// Create a rate limited response with proper headers and body.
fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, header::HeaderValue::from(retry_after));

    response
}
