//! Auth Router

use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};
use platform::rate_limit::{RateLimitConfig, RateLimitStore};

use crate::application::{AuthConfig, AuthGateway};
use crate::domain::repository::{CredentialStore, SessionStore};
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::{optional_auth, require_admin, require_auth};
use crate::presentation::rate_limit::{RateLimitState, rate_limit};

/// `/api/auth` and `/api/admin` over one gateway and one limiter backend
pub fn api_router<C, S, L>(gateway: AuthGateway<C, S>, limiter: Arc<L>) -> Router
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    Router::new()
        .nest("/api/auth", auth_router(gateway.clone(), limiter.clone()))
        .nest("/api/admin", admin_router(gateway, limiter))
}

/// Create the Auth router
pub fn auth_router<C, S, L>(gateway: AuthGateway<C, S>, limiter: Arc<L>) -> Router
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let config = gateway.config();
    let auth_limit = limit_layer_state(&limiter, config.auth_rate_limit.clone(), config);
    let general_limit = limit_layer_state(&limiter, config.general_rate_limit.clone(), config);
    let state = AuthAppState { gateway };

    // Credential endpoints
    let public = Router::new()
        .route("/register", post(handlers::register::<C, S>))
        .route("/login", post(handlers::login::<C, S>))
        .route("/refresh", post(handlers::refresh::<C, S>))
        .route_layer(middleware::from_fn_with_state(auth_limit, rate_limit::<L>));

    // Limiter runs before the guard
    let protected = Router::new()
        .route("/logout", post(handlers::logout::<C, S>))
        .route("/logout-all", post(handlers::logout_all::<C, S>))
        .route("/profile", get(handlers::profile::<C, S>))
        .route("/change-password", post(handlers::change_password::<C, S>))
        .route("/sessions", get(handlers::list_sessions::<C, S>))
        .route("/sessions/{id}", delete(handlers::revoke_session::<C, S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<C, S>,
        ))
        .route_layer(middleware::from_fn_with_state(
            general_limit.clone(),
            rate_limit::<L>,
        ));

    let optional = Router::new()
        .route("/whoami", get(handlers::whoami::<C, S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            optional_auth::<C, S>,
        ))
        .route_layer(middleware::from_fn_with_state(general_limit, rate_limit::<L>));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(optional)
        .with_state(state)
}

/// Create the admin router. Every route requires the admin role.
pub fn admin_router<C, S, L>(gateway: AuthGateway<C, S>, limiter: Arc<L>) -> Router
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
    L: RateLimitStore + Send + Sync + 'static,
{
    let config = gateway.config();
    let general_limit = limit_layer_state(&limiter, config.general_rate_limit.clone(), config);
    let state = AuthAppState { gateway };

    Router::new()
        .route("/accounts", get(handlers::list_accounts::<C, S>))
        .route("/accounts/{id}", patch(handlers::update_account::<C, S>))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_auth::<C, S>,
        ))
        .route_layer(middleware::from_fn_with_state(general_limit, rate_limit::<L>))
        .with_state(state)
}

fn limit_layer_state<L>(
    limiter: &Arc<L>,
    policy: RateLimitConfig,
    config: &AuthConfig,
) -> RateLimitState<L> {
    RateLimitState::new(
        Arc::clone(limiter),
        policy,
        Arc::from(config.trusted_proxies.as_slice()),
    )
}
