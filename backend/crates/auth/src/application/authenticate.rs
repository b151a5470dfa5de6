//! Authenticate Use Case
//!
//! Resolves a bearer access token to a request identity. A token is
//! accepted only while the session holding it is active, which is what
//! makes server-side revocation work for self-verifying tokens.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::tokens::{TokenClaims, TokenIssuer};
use crate::domain::repository::SessionStore;
use crate::domain::value_object::{AccountId, SessionId, role::Role};
use crate::error::{AuthError, AuthResult};

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub claims: TokenClaims,
    pub session_id: SessionId,
}

impl AuthContext {
    pub fn account_id(&self) -> AccountId {
        self.claims.sub
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn require_role(&self, role: Role) -> AuthResult<()> {
        if self.claims.role == role {
            Ok(())
        } else {
            tracing::debug!(
                account_id = %self.claims.sub,
                required = %role,
                actual = %self.claims.role,
                "Role check failed"
            );
            Err(AuthError::Forbidden)
        }
    }
}

/// Authenticate use case
pub struct AuthenticateUseCase<S>
where
    S: SessionStore,
{
    sessions: Arc<S>,
    tokens: Arc<TokenIssuer>,
}

impl<S> AuthenticateUseCase<S>
where
    S: SessionStore,
{
    pub fn new(sessions: Arc<S>, tokens: Arc<TokenIssuer>) -> Self {
        Self { sessions, tokens }
    }

    /// Every rejection is `Unauthenticated`.
    pub async fn execute(
        &self,
        access_token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<AuthContext> {
        let claims = self
            .tokens
            .verify_access_at(access_token, now)
            .map_err(|_| {
                if let Some(unverified) = TokenIssuer::decode_unverified(access_token) {
                    tracing::debug!(
                        claimed_sub = %unverified.sub,
                        "Access token failed verification"
                    );
                }
                AuthError::Unauthenticated
            })?;

        let session = self
            .sessions
            .find_active_by_access_token(access_token, now)
            .await?
            .filter(|s| s.account_id == claims.sub)
            .ok_or_else(|| {
                tracing::debug!(account_id = %claims.sub, "Access token has no active session");
                AuthError::Unauthenticated
            })?;

        Ok(AuthContext {
            claims,
            session_id: session.id,
        })
    }
}
