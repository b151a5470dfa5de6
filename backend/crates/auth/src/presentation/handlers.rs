//! HTTP Handlers

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::application::{
    AdminAccountUpdate, AuthContext, AuthGateway, ChangePasswordInput, LoginInput, RegisterInput,
};
use crate::domain::repository::{CredentialStore, SessionStore};
use crate::domain::value_object::{AccountId, SessionId};
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    AccountResponse, AccountsResponse, AuthResponse, ChangePasswordRequest, LoginRequest,
    LogoutAllRequest, RefreshRequest, RefreshResponse, RegisterRequest, RevokedResponse,
    RevokedSessionsResponse, SessionsResponse, UpdateAccountRequest, WhoamiResponse,
};
use crate::presentation::extract::{Client, MaybeAuth};

/// Shared state for auth handlers
pub struct AuthAppState<C, S> {
    pub gateway: AuthGateway<C, S>,
}

impl<C, S> Clone for AuthAppState<C, S> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

// ============================================================================
// Register / Login / Refresh
// ============================================================================

/// POST /api/auth/register
pub async fn register<C, S>(
    State(state): State<AuthAppState<C, S>>,
    Client(client): Client,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<AuthResponse>)>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let input = RegisterInput {
        email: req.email,
        password: req.password,
        first_name: req.first_name,
        last_name: req.last_name,
    };

    let outcome = state.gateway.register(input, &client).await?;

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// POST /api/auth/login
pub async fn login<C, S>(
    State(state): State<AuthAppState<C, S>>,
    Client(client): Client,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<AuthResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let input = LoginInput {
        email: req.email,
        password: req.password,
    };

    let outcome = state.gateway.login(input, &client).await?;

    Ok(Json(outcome.into()))
}

/// POST /api/auth/refresh
pub async fn refresh<C, S>(
    State(state): State<AuthAppState<C, S>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<RefreshResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let output = state.gateway.refresh(&req.refresh_token).await?;
    Ok(Json(output.into()))
}

// ============================================================================
// Logout (requires authentication)
// ============================================================================

/// POST /api/auth/logout
pub async fn logout<C, S>(
    State(state): State<AuthAppState<C, S>>,
    context: AuthContext,
) -> AuthResult<Json<RevokedResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let revoked = state.gateway.logout(context.session_id).await?;
    Ok(Json(RevokedResponse { revoked }))
}

/// POST /api/auth/logout-all
///
/// Body is optional; `{"exceptCurrent": true}` keeps the calling session.
pub async fn logout_all<C, S>(
    State(state): State<AuthAppState<C, S>>,
    context: AuthContext,
    body: Bytes,
) -> AuthResult<Json<RevokedSessionsResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let req: LogoutAllRequest = if body.is_empty() {
        LogoutAllRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AuthError::Validation(format!("Invalid request body: {e}")))?
    };

    let except = req.except_current.then_some(context.session_id);
    let revoked_sessions = state
        .gateway
        .logout_all(context.account_id(), except)
        .await?;

    Ok(Json(RevokedSessionsResponse { revoked_sessions }))
}

// ============================================================================
// Account (requires authentication)
// ============================================================================

/// GET /api/auth/profile
pub async fn profile<C, S>(
    State(state): State<AuthAppState<C, S>>,
    context: AuthContext,
) -> AuthResult<Json<AccountResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let account = state.gateway.profile(context.account_id()).await?;
    Ok(Json(AccountResponse { account }))
}

/// POST /api/auth/change-password
pub async fn change_password<C, S>(
    State(state): State<AuthAppState<C, S>>,
    context: AuthContext,
    Json(req): Json<ChangePasswordRequest>,
) -> AuthResult<Json<RevokedSessionsResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let input = ChangePasswordInput {
        current_password: req.current_password,
        new_password: req.new_password,
    };

    let revoked_sessions = state
        .gateway
        .change_password(context.account_id(), context.session_id, input)
        .await?;

    Ok(Json(RevokedSessionsResponse { revoked_sessions }))
}

/// GET /api/auth/sessions
pub async fn list_sessions<C, S>(
    State(state): State<AuthAppState<C, S>>,
    context: AuthContext,
) -> AuthResult<Json<SessionsResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let sessions = state
        .gateway
        .list_sessions(context.account_id(), Some(context.session_id))
        .await?;
    Ok(Json(SessionsResponse { sessions }))
}

/// DELETE /api/auth/sessions/{id}
pub async fn revoke_session<C, S>(
    State(state): State<AuthAppState<C, S>>,
    context: AuthContext,
    Path(id): Path<String>,
) -> AuthResult<Json<RevokedResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let session_id: SessionId = id.parse().map_err(|_| AuthError::SessionNotFound)?;
    let revoked = state
        .gateway
        .revoke_session(context.account_id(), session_id)
        .await?;
    Ok(Json(RevokedResponse { revoked }))
}

/// GET /api/auth/whoami
pub async fn whoami<C, S>(
    State(state): State<AuthAppState<C, S>>,
    MaybeAuth(context): MaybeAuth,
) -> AuthResult<Json<WhoamiResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let account = match context {
        Some(context) => match state.gateway.profile(context.account_id()).await {
            Ok(account) => Some(account),
            Err(AuthError::AccountNotFound) => None,
            Err(e) => return Err(e),
        },
        None => None,
    };

    Ok(Json(WhoamiResponse {
        authenticated: account.is_some(),
        account,
    }))
}

// ============================================================================
// Admin (requires admin role)
// ============================================================================

/// GET /api/admin/accounts
pub async fn list_accounts<C, S>(
    State(state): State<AuthAppState<C, S>>,
) -> AuthResult<Json<AccountsResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let accounts = state.gateway.list_accounts().await?;
    Ok(Json(AccountsResponse { accounts }))
}

/// PATCH /api/admin/accounts/{id}
pub async fn update_account<C, S>(
    State(state): State<AuthAppState<C, S>>,
    context: AuthContext,
    Path(id): Path<String>,
    Json(req): Json<UpdateAccountRequest>,
) -> AuthResult<Json<AccountResponse>>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    let account_id: AccountId = id.parse().map_err(|_| AuthError::AccountNotFound)?;

    let update = AdminAccountUpdate {
        role: req.role,
        is_active: req.is_active,
        email_verified: req.email_verified,
    };

    tracing::info!(
        admin_id = %context.account_id(),
        account_id = %account_id,
        "Admin account update"
    );
    let account = state.gateway.update_account(account_id, update).await?;

    Ok(Json(AccountResponse { account }))
}
