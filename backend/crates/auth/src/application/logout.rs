//! Logout Use Case

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::repository::SessionStore;
use crate::domain::value_object::{AccountId, SessionId};
use crate::error::AuthResult;

/// Logout use case
pub struct LogoutUseCase<S>
where
    S: SessionStore,
{
    sessions: Arc<S>,
}

impl<S> LogoutUseCase<S>
where
    S: SessionStore,
{
    pub fn new(sessions: Arc<S>) -> Self {
        Self { sessions }
    }

    /// Revoke one session. False if it was already inactive or unknown.
    pub async fn execute(&self, session_id: SessionId, now: DateTime<Utc>) -> AuthResult<bool> {
        let revoked = self.sessions.revoke(session_id, now).await?;
        if revoked {
            tracing::info!(session_id = %session_id, "Session signed out");
        }
        Ok(revoked)
    }

    /// Revoke every active session of the account, optionally keeping one.
    pub async fn execute_all(
        &self,
        account_id: AccountId,
        except: Option<SessionId>,
        now: DateTime<Utc>,
    ) -> AuthResult<u64> {
        let count = self
            .sessions
            .revoke_all_for_account(account_id, except, now)
            .await?;
        tracing::info!(account_id = %account_id, count, "Account signed out everywhere");
        Ok(count)
    }
}
