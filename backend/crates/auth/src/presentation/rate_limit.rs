//! Rate limit middleware
//!
//! Applies one policy per router. Every response carries the current
//! budget; denials are 429 with `Retry-After`. A failing limiter backend
//! lets the request through.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use platform::client::{ClientInfo, extract_client_ip};
use platform::rate_limit::{RateLimitConfig, RateLimitResult, RateLimitStore};

use crate::error::AuthError;

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Limiter backend plus the policy applied to one group of routes
pub struct RateLimitState<L> {
    pub store: Arc<L>,
    pub config: RateLimitConfig,
    pub trusted_proxies: Arc<[IpAddr]>,
}

impl<L> RateLimitState<L> {
    pub fn new(store: Arc<L>, config: RateLimitConfig, trusted_proxies: Arc<[IpAddr]>) -> Self {
        Self {
            store,
            config,
            trusted_proxies,
        }
    }
}

impl<L> Clone for RateLimitState<L> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            trusted_proxies: Arc::clone(&self.trusted_proxies),
        }
    }
}

/// Keyed on the socket peer. `X-Forwarded-For` counts only when the peer is
/// a trusted proxy.
pub async fn rate_limit<L>(
    State(state): State<RateLimitState<L>>,
    req: Request,
    next: Next,
) -> Response
where
    L: RateLimitStore + Send + Sync + 'static,
{
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip());
    let ip = extract_client_ip(req.headers(), peer, &state.trusted_proxies);
    let key = state.config.key_for(&ClientInfo::new(ip, None).rate_limit_id());

    let result = match state.store.check(&key, &state.config).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(
                policy = state.config.name,
                error = %e,
                "Rate limiter unavailable, allowing request"
            );
            return next.run(req).await;
        }
    };

    let mut response = match result.retry_after_secs() {
        Some(retry_after_secs) => AuthError::RateLimitExceeded { retry_after_secs }.into_response(),
        None => next.run(req).await,
    };
    set_rate_limit_headers(response.headers_mut(), &result);
    response
}

fn set_rate_limit_headers(headers: &mut HeaderMap, result: &RateLimitResult) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(result.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(result.remaining));
    if let Ok(reset) = HeaderValue::from_str(&result.reset_at.to_rfc3339()) {
        headers.insert(X_RATELIMIT_RESET, reset);
    }
}
