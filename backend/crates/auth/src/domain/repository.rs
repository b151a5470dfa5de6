//! Store Traits
//!
//! Interfaces for the account and session registries. Every mutation is a
//! single store-owned operation that looks up, validates and writes under
//! one critical section. Implementations live in the infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::{
    account::{Account, AccountPatch},
    session::{Session, SessionPatch},
};
use crate::domain::value_object::{AccountId, SessionId};
use crate::error::AuthResult;

/// Account registry keyed by id with a unique normalized-email index
#[trait_variant::make(CredentialStore: Send)]
pub trait LocalCredentialStore {
    /// Insert a new account. Fails with `DuplicateAccount` when the
    /// normalized email is taken; the check and insert are atomic.
    async fn create(&self, account: Account) -> AuthResult<Account>;

    async fn find_by_id(&self, id: AccountId) -> AuthResult<Option<Account>>;

    /// Lookup by email. The argument is normalized before matching.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>>;

    /// Apply a patch. `None` if the account does not exist. An email change
    /// onto another account's address fails with `DuplicateAccount`.
    async fn update(
        &self,
        id: AccountId,
        patch: AccountPatch,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>>;

    /// All accounts, oldest first
    async fn list(&self) -> AuthResult<Vec<Account>>;
}

/// Session registry
#[trait_variant::make(SessionStore: Send)]
pub trait LocalSessionStore {
    async fn create(&self, session: Session) -> AuthResult<Session>;

    async fn get(&self, id: SessionId) -> AuthResult<Option<Session>>;

    /// Rotate the token pair. `None` when the session is missing, not
    /// usable at `now`, or its refresh token no longer matches.
    async fn update(
        &self,
        id: SessionId,
        patch: SessionPatch,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>>;

    /// Deactivate one session. True only if it was active.
    async fn revoke(&self, id: SessionId, now: DateTime<Utc>) -> AuthResult<bool>;

    /// Deactivate every active session of an account, optionally sparing
    /// one. Returns how many were deactivated.
    async fn revoke_all_for_account(
        &self,
        account_id: AccountId,
        except: Option<SessionId>,
        now: DateTime<Utc>,
    ) -> AuthResult<u64>;

    /// Lazy expiry: an expired session is deactivated and reported invalid.
    async fn is_valid(&self, id: SessionId, now: DateTime<Utc>) -> AuthResult<bool>;

    /// Deactivate every session expired at `now` and drop records that were
    /// already inactive and expired. Returns how many were deactivated.
    async fn sweep_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;

    /// All sessions of an account, newest first
    async fn find_by_account(&self, account_id: AccountId) -> AuthResult<Vec<Session>>;

    /// The usable session currently holding this access token
    async fn find_active_by_access_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>>;

    /// The usable session currently holding this refresh token
    async fn find_active_by_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Session>>;
}
