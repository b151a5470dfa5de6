//! In-memory session store
//!
//! Sessions are indexed by id, by owning account, and by the current access
//! and refresh token values. The token indexes only ever point at active
//! sessions; a hit is still re-checked for expiry before it is returned.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use platform::crypto::constant_time_eq;
use tokio::sync::RwLock;

use crate::domain::entity::session::{Session, SessionPatch};
use crate::domain::repository::SessionStore;
use crate::domain::value_object::{AccountId, SessionId};
use crate::error::AuthResult;

#[derive(Debug, Default)]
struct Registry {
    sessions: HashMap<SessionId, Session>,
    by_account: HashMap<AccountId, HashSet<SessionId>>,
    by_access: HashMap<String, SessionId>,
    by_refresh: HashMap<String, SessionId>,
}

impl Registry {
    fn index_tokens(&mut self, session: &Session) {
        self.by_access.insert(session.access_token.clone(), session.id);
        self.by_refresh.insert(session.refresh_token.clone(), session.id);
    }

    fn unindex_tokens(&mut self, access: &str, refresh: &str) {
        self.by_access.remove(access);
        self.by_refresh.remove(refresh);
    }

    /// Deactivate and drop from the token indexes. False if already inactive.
    fn deactivate(&mut self, id: SessionId, now: DateTime<Utc>) -> bool {
        let Some(session) = self.sessions.get_mut(&id) else {
            return false;
        };
        if !session.deactivate(now) {
            return false;
        }
        let (access, refresh) = (session.access_token.clone(), session.refresh_token.clone());
        self.unindex_tokens(&access, &refresh);
        true
    }

    fn remove(&mut self, id: SessionId) {
        if let Some(session) = self.sessions.remove(&id) {
            self.unindex_tokens(&session.access_token, &session.refresh_token);
            if let Some(ids) = self.by_account.get_mut(&session.account_id) {
                ids.remove(&id);
                if ids.is_empty() {
                    self.by_account.remove(&session.account_id);
                }
            }
        }
    }

    /// Resolve a token index hit to a usable session, expiring it lazily.
    fn resolve(&mut self, id: Option<SessionId>, now: DateTime<Utc>) -> Option<Session> {
        let id = id?;
        let session = self.sessions.get(&id)?;
        if session.is_usable(now) {
            return Some(session.clone());
        }
        if session.is_expired(now) {
            self.deactivate(id, now);
        }
        None
    }
}

/// Session registry held in process memory
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    registry: RwLock<Registry>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, active or not
    pub async fn len(&self) -> usize {
        self.registry.read().await.sessions.len()
    }

}

impl SessionStore for MemorySessionStore {
    async fn create(&self, session: Session) -> AuthResult<Session> {
        let mut registry = self.registry.write().await;

        registry
            .by_account
            .entry(session.account_id)
            .or_default()
            .insert(session.id);
        if session.is_active {
            registry.index_tokens(&session);
        }
        registry.sessions.insert(session.id, session.clone());

        tracing::debug!(
            session_id = %session.id,
            account_id = %session.account_id,
            expires_at = %session.expires_at,
            "Session created"
        );
        Ok(session)
    }

    async fn get(&self, id: SessionId) -> AuthResult<Option<Session>> {
        Ok(self.registry.read().await.sessions.get(&id).cloned())
    }

    async fn update(
        &self,
        id: SessionId,
        patch: SessionPatch,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>> {
        let mut guard = self.registry.write().await;
        let registry = &mut *guard;

        let Some(session) = registry.sessions.get_mut(&id) else {
            return Ok(None);
        };
        if !session.is_usable(now) {
            return Ok(None);
        }
        if !constant_time_eq(
            session.refresh_token.as_bytes(),
            patch.expected_refresh.as_bytes(),
        ) {
            return Ok(None);
        }

        let old_access = std::mem::replace(&mut session.access_token, patch.tokens.access_token);
        let old_refresh = std::mem::replace(&mut session.refresh_token, patch.tokens.refresh_token);
        session.updated_at = now;
        let rotated = session.clone();

        registry.unindex_tokens(&old_access, &old_refresh);
        registry.index_tokens(&rotated);

        tracing::debug!(session_id = %id, "Session tokens rotated");
        Ok(Some(rotated))
    }

    async fn revoke(&self, id: SessionId, now: DateTime<Utc>) -> AuthResult<bool> {
        let revoked = self.registry.write().await.deactivate(id, now);
        if revoked {
            tracing::debug!(session_id = %id, "Session revoked");
        }
        Ok(revoked)
    }

    async fn revoke_all_for_account(
        &self,
        account_id: AccountId,
        except: Option<SessionId>,
        now: DateTime<Utc>,
    ) -> AuthResult<u64> {
        let mut registry = self.registry.write().await;

        let ids: Vec<SessionId> = registry
            .by_account
            .get(&account_id)
            .map(|ids| ids.iter().copied().filter(|id| Some(*id) != except).collect())
            .unwrap_or_default();

        let mut count = 0;
        for id in ids {
            if registry.deactivate(id, now) {
                count += 1;
            }
        }

        tracing::debug!(account_id = %account_id, count, "Account sessions revoked");
        Ok(count)
    }

    async fn is_valid(&self, id: SessionId, now: DateTime<Utc>) -> AuthResult<bool> {
        let mut registry = self.registry.write().await;
        Ok(registry.resolve(Some(id), now).is_some())
    }

    async fn sweep_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut registry = self.registry.write().await;

        let mut stale = Vec::new();
        let mut expiring = Vec::new();
        for session in registry.sessions.values() {
            if !session.is_expired(now) {
                continue;
            }
            if session.is_active {
                expiring.push(session.id);
            } else {
                stale.push(session.id);
            }
        }

        for id in stale {
            registry.remove(id);
        }

        let mut count = 0;
        for id in expiring {
            if registry.deactivate(id, now) {
                count += 1;
            }
        }
        Ok(count)
    }

    async fn find_by_account(&self, account_id: AccountId) -> AuthResult<Vec<Session>> {
        let registry = self.registry.read().await;
        let mut sessions: Vec<Session> = registry
            .by_account
            .get(&account_id)
            .into_iter()
            .flatten()
            .filter_map(|id| registry.sessions.get(id))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn find_active_by_access_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>> {
        let mut registry = self.registry.write().await;
        let id = registry.by_access.get(token).copied();
        Ok(registry.resolve(id, now))
    }

    async fn find_active_by_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>> {
        let mut registry = self.registry.write().await;
        let id = registry.by_refresh.get(token).copied();
        Ok(registry.resolve(id, now))
    }
}
