//! Refresh Use Case
//!
//! Exchanges a refresh token for a new pair and rotates the session's
//! stored tokens. A signature-valid token is not enough: the session that
//! currently holds it must still be active.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::crypto::fingerprint;

use crate::application::tokens::TokenIssuer;
use crate::domain::entity::session::{SessionPatch, TokenPair};
use crate::domain::repository::{CredentialStore, SessionStore};
use crate::domain::value_object::SessionId;
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Clone)]
pub struct RefreshOutput {
    pub tokens: TokenPair,
    pub session_id: SessionId,
}

/// Refresh use case
pub struct RefreshUseCase<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    credentials: Arc<C>,
    sessions: Arc<S>,
    tokens: Arc<TokenIssuer>,
}

impl<C, S> RefreshUseCase<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    pub fn new(credentials: Arc<C>, sessions: Arc<S>, tokens: Arc<TokenIssuer>) -> Self {
        Self {
            credentials,
            sessions,
            tokens,
        }
    }

    /// Every rejection is `InvalidRefreshToken`.
    pub async fn execute(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<RefreshOutput> {
        let claims = self
            .tokens
            .verify_refresh_at(refresh_token, now)
            .map_err(|_| AuthError::InvalidRefreshToken)?;

        let Some(session) = self
            .sessions
            .find_active_by_refresh_token(refresh_token, now)
            .await?
        else {
            tracing::warn!(
                account_id = %claims.sub,
                token = %fingerprint(refresh_token),
                "Refresh token has no active session"
            );
            return Err(AuthError::InvalidRefreshToken);
        };

        if session.account_id != claims.sub {
            tracing::warn!(session_id = %session.id, "Refresh token subject mismatch");
            return Err(AuthError::InvalidRefreshToken);
        }

        // Claims are reissued from the current account, not the old token
        let account = match self.credentials.find_by_id(claims.sub).await? {
            Some(account) if account.can_login() => account,
            _ => return Err(AuthError::InvalidRefreshToken),
        };

        let pair = self.tokens.issue_pair_at(&account, now)?;
        let rotated = self
            .sessions
            .update(session.id, SessionPatch::rotate(refresh_token, pair.clone()), now)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        tracing::debug!(session_id = %rotated.id, "Tokens refreshed");

        Ok(RefreshOutput {
            tokens: pair,
            session_id: rotated.id,
        })
    }
}
