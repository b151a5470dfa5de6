//! Register Use Case
//!
//! Creates an account with the `user` role and opens its first session.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use platform::client::ClientInfo;

use crate::application::config::AuthConfig;
use crate::application::hasher::PasswordHasher;
use crate::application::login::{AuthOutcome, start_session};
use crate::application::tokens::TokenIssuer;
use crate::domain::entity::account::Account;
use crate::domain::repository::{CredentialStore, SessionStore};
use crate::domain::value_object::{display_name::DisplayName, email::Email, role::Role};
use crate::error::{AuthError, AuthResult};

/// Register input
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Register use case
pub struct RegisterUseCase<C, S>
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

impl<C, S> RegisterUseCase<C, S>
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

    pub async fn execute(
        &self,
        input: RegisterInput,
        client: &ClientInfo,
        now: DateTime<Utc>,
    ) -> AuthResult<AuthOutcome> {
        let email = Email::new(&input.email)?;
        let first_name = DisplayName::new(&input.first_name, "firstName")?;
        let last_name = DisplayName::new(&input.last_name, "lastName")?;

        // Early exit saves a hash; the store re-checks atomically on insert
        if self.credentials.find_by_email(email.as_str()).await?.is_some() {
            return Err(AuthError::DuplicateAccount);
        }

        let password_hash = self.hasher.hash(input.password).await?;

        let account = Account::new(email, password_hash, first_name, last_name, Role::User, now);
        let account = self.credentials.create(account).await?;

        tracing::info!(account_id = %account.id, "Account registered");

        start_session(
            self.sessions.as_ref(),
            &self.tokens,
            &self.config,
            &account,
            client,
            now,
        )
        .await
    }
}
