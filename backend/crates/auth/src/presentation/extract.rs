//! Request extractors
//!
//! Typed per-request values: the caller's network identity and the
//! identity attached by the auth guard.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use platform::client::{ClientInfo, extract_client_info};

use crate::application::AuthContext;
use crate::domain::repository::{CredentialStore, SessionStore};
use crate::error::AuthError;
use crate::presentation::handlers::AuthAppState;

/// Client address and user agent. The address is the socket peer, or the
/// forwarded client when the peer is a configured trusted proxy.
#[derive(Debug, Clone)]
pub struct Client(pub ClientInfo);

impl<C, S> FromRequestParts<AuthAppState<C, S>> for Client
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AuthAppState<C, S>,
    ) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|info| info.0.ip());
        let trusted = &state.gateway.config().trusted_proxies;
        Ok(Client(extract_client_info(&parts.headers, peer, trusted)))
    }
}

/// Identity from `require_auth`. Rejects with `Unauthenticated` if the
/// guard did not run.
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AuthError::Unauthenticated)
    }
}

/// Identity from `optional_auth`, if the request carried a good token
#[derive(Debug, Clone, Default)]
pub struct MaybeAuth(pub Option<AuthContext>);

impl<S> FromRequestParts<S> for MaybeAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<MaybeAuth>()
            .cloned()
            .unwrap_or_default())
    }
}
