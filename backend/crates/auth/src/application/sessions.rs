//! Session Management Use Cases

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::entity::session::SessionInfo;
use crate::domain::repository::SessionStore;
use crate::domain::value_object::{AccountId, SessionId};
use crate::error::{AuthError, AuthResult};

/// Session management for the owning account, plus the periodic sweep
pub struct SessionsUseCase<S>
where
    S: SessionStore,
{
    sessions: Arc<S>,
}

impl<S> SessionsUseCase<S>
where
    S: SessionStore,
{
    pub fn new(sessions: Arc<S>) -> Self {
        Self { sessions }
    }

    pub async fn list(
        &self,
        account_id: AccountId,
        current: Option<SessionId>,
    ) -> AuthResult<Vec<SessionInfo>> {
        let sessions = self.sessions.find_by_account(account_id).await?;
        Ok(sessions.iter().map(|s| s.info(current)).collect())
    }

    /// Revoke a session the caller owns. A foreign session id is reported
    /// exactly like an unknown one.
    pub async fn revoke_own(
        &self,
        account_id: AccountId,
        session_id: SessionId,
        now: DateTime<Utc>,
    ) -> AuthResult<bool> {
        match self.sessions.get(session_id).await? {
            Some(session) if session.account_id == account_id => {}
            _ => return Err(AuthError::SessionNotFound),
        }
        let revoked = self.sessions.revoke(session_id, now).await?;
        tracing::info!(
            account_id = %account_id,
            session_id = %session_id,
            revoked,
            "Session revoked by owner"
        );
        Ok(revoked)
    }

    pub async fn sweep(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let count = self.sessions.sweep_expired(now).await?;
        if count > 0 {
            tracing::info!(count, "Expired sessions swept");
        }
        Ok(count)
    }
}
