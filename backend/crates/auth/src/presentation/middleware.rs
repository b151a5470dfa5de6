//! Auth Middleware
//!
//! The request guard: bearer token in, typed identity out. The identity
//! travels in request extensions and is read back with the `AuthContext`
//! and `MaybeAuth` extractors.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use platform::client::extract_bearer_token;

use crate::application::AuthContext;
use crate::domain::repository::{CredentialStore, SessionStore};
use crate::domain::value_object::role::Role;
use crate::error::{AuthError, AuthResult};
use crate::presentation::extract::MaybeAuth;
use crate::presentation::handlers::AuthAppState;

/// Middleware that requires a valid bearer token backed by an active session
pub async fn require_auth<C, S>(
    State(state): State<AuthAppState<C, S>>,
    mut req: Request,
    next: Next,
) -> AuthResult<Response>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let token = extract_bearer_token(req.headers())
        .ok_or(AuthError::Unauthenticated)?
        .to_string();

    let context = state.gateway.authenticate(&token).await?;
    req.extensions_mut().insert(context);

    Ok(next.run(req).await)
}

/// Middleware that resolves the identity when a token is present but never
/// rejects. A bad token is treated as no token.
pub async fn optional_auth<C, S>(
    State(state): State<AuthAppState<C, S>>,
    mut req: Request,
    next: Next,
) -> Response
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let context = match extract_bearer_token(req.headers()).map(str::to_string) {
        Some(token) => state.gateway.authenticate(&token).await.ok(),
        None => None,
    };
    req.extensions_mut().insert(MaybeAuth(context));

    next.run(req).await
}

/// Middleware that requires the admin role. Must run after `require_auth`.
pub async fn require_admin(context: AuthContext, req: Request, next: Next) -> AuthResult<Response> {
    context.require_role(Role::Admin)?;
    Ok(next.run(req).await)
}
