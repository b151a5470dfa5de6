//! Login Use Case
//!
//! Authenticates an account by email and password and opens a session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::client::ClientInfo;
use platform::crypto::fingerprint;

use crate::application::config::AuthConfig;
use crate::application::hasher::PasswordHasher;
use crate::application::tokens::TokenIssuer;
use crate::domain::entity::account::{Account, AccountPatch, PublicAccount};
use crate::domain::entity::session::{Session, TokenPair};
use crate::domain::repository::{CredentialStore, SessionStore};
use crate::domain::value_object::SessionId;
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Result of a successful login or registration
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub account: PublicAccount,
    pub tokens: TokenPair,
    pub session_id: SessionId,
    pub expires_at: DateTime<Utc>,
}

/// Issue a token pair for `account` and store the session bound to it.
/// Shared by login and registration so both open sessions identically.
pub(crate) async fn start_session<S>(
    sessions: &S,
    tokens: &TokenIssuer,
    config: &AuthConfig,
    account: &Account,
    client: &ClientInfo,
    now: DateTime<Utc>,
) -> AuthResult<AuthOutcome>
where
    S: SessionStore,
{
    let pair = tokens.issue_pair_at(account, now)?;
    let session = Session::new(
        account.id,
        pair.clone(),
        config.session_expiry(now),
        client.ip_string(),
        client.user_agent.clone(),
        now,
    );
    let session = sessions.create(session).await?;

    tracing::debug!(
        session_id = %session.id,
        token = %fingerprint(&pair.access_token),
        "Session opened"
    );

    Ok(AuthOutcome {
        account: account.to_public(),
        tokens: pair,
        session_id: session.id,
        expires_at: session.expires_at,
    })
}

/// Login use case
pub struct LoginUseCase<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    credentials: Arc<C>,
    sessions: Arc<S>,
    tokens: Arc<TokenIssuer>,
    hasher: PasswordHasher,
    config: Arc<AuthConfig>,
}

impl<C, S> LoginUseCase<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    pub fn new(
        credentials: Arc<C>,
        sessions: Arc<S>,
        tokens: Arc<TokenIssuer>,
        hasher: PasswordHasher,
        config: Arc<AuthConfig>,
    ) -> Self {
        Self {
            credentials,
            sessions,
            tokens,
            hasher,
            config,
        }
    }

    /// Unknown email, inactive account and wrong password all fail with the
    /// same `InvalidCredentials`, after the same amount of hashing work.
    pub async fn execute(
        &self,
        input: LoginInput,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AuthResult<AuthOutcome> {
        let Some(account) = self.credentials.find_by_email(&input.email).await? else {
            self.hasher.verify_dummy(input.password).await?;
            return Err(AuthError::InvalidCredentials);
        };

        let retained = self
            .hasher
            .needs_rehash(&account.password_hash)
            .then(|| input.password.clone());

        let password_valid = self
            .hasher
            .verify(input.password, &account.password_hash)
            .await?;

        if !password_valid || !account.can_login() {
            tracing::debug!(account_id = %account.id, active = account.is_active, "Login refused");
            return Err(AuthError::InvalidCredentials);
        }

        let mut patch = AccountPatch::last_login(now);
        if let Some(password) = retained {
            match self.hasher.rehash(password).await {
                Ok(hash) => patch.password_hash = Some(hash),
                Err(e) => tracing::warn!(account_id = %account.id, error = %e, "Rehash failed"),
            }
        }

        let account = self
            .credentials
            .update(account.id, patch, now)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let outcome = start_session(
            self.sessions.as_ref(),
            &self.tokens,
            &self.config,
            &account,
            client,
            now,
        )
        .await?;

        tracing::info!(
            account_id = %account.id,
            session_id = %outcome.session_id,
            "Account signed in"
        );

        Ok(outcome)
    }
}
