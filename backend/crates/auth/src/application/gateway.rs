//! Auth Gateway
//!
//! Facade owning the stores, the token issuer and the hasher. Each method
//! builds the matching use case and runs it against the current time.

use std::sync::Arc;

use chrono::Utc;
use platform::client::ClientInfo;

use crate::application::account::{AccountUseCase, AdminAccountUpdate, ChangePasswordInput};
use crate::application::authenticate::{AuthContext, AuthenticateUseCase};
use crate::application::config::AuthConfig;
use crate::application::hasher::PasswordHasher;
use crate::application::login::{AuthOutcome, LoginInput, LoginUseCase};
use crate::application::logout::LogoutUseCase;
use crate::application::refresh::{RefreshOutput, RefreshUseCase};
use crate::application::register::{RegisterInput, RegisterUseCase};
use crate::application::sessions::SessionsUseCase;
use crate::application::tokens::TokenIssuer;
use crate::domain::entity::{account::PublicAccount, session::SessionInfo};
use crate::domain::repository::{CredentialStore, SessionStore};
use crate::domain::value_object::{AccountId, SessionId};
use crate::error::AuthResult;

pub struct AuthGateway<C, S> {
    credentials: Arc<C>,
    sessions: Arc<S>,
    tokens: Arc<TokenIssuer>,
    hasher: PasswordHasher,
    config: Arc<AuthConfig>,
}

impl<C, S> Clone for AuthGateway<C, S> {
    fn clone(&self) -> Self {
        Self {
            credentials: Arc::clone(&self.credentials),
            sessions: Arc::clone(&self.sessions),
            tokens: Arc::clone(&self.tokens),
            hasher: self.hasher.clone(),
            config: Arc::clone(&self.config),
        }
    }
}

impl<C, S> AuthGateway<C, S>
where
    C: CredentialStore + Send + Sync + 'static,
    S: SessionStore + Send + Sync + 'static,
{
    pub fn new(credentials: Arc<C>, sessions: Arc<S>, config: AuthConfig) -> Self {
        Self {
            credentials,
            sessions,
            tokens: Arc::new(TokenIssuer::new(&config)),
            hasher: PasswordHasher::new(config.pepper(), config.hashing),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub fn credentials(&self) -> &Arc<C> {
        &self.credentials
    }

    pub fn sessions(&self) -> &Arc<S> {
        &self.sessions
    }

    pub async fn register(
        &self,
        input: RegisterInput,
        client: &ClientInfo,
    ) -> AuthResult<AuthOutcome> {
        RegisterUseCase::new(
            self.credentials.clone(),
            self.sessions.clone(),
            self.tokens.clone(),
            self.hasher.clone(),
            self.config.clone(),
        )
        .execute(input, client, Utc::now())
        .await
    }

    pub async fn login(&self, input: LoginInput, client: &ClientInfo) -> AuthResult<AuthOutcome> {
        LoginUseCase::new(
            self.credentials.clone(),
            self.sessions.clone(),
            self.tokens.clone(),
            self.hasher.clone(),
            self.config.clone(),
        )
        .execute(input, client, Utc::now())
        .await
    }

    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<RefreshOutput> {
        RefreshUseCase::new(
            self.credentials.clone(),
            self.sessions.clone(),
            self.tokens.clone(),
        )
        .execute(refresh_token, Utc::now())
        .await
    }

    pub async fn logout(&self, session_id: SessionId) -> AuthResult<bool> {
        LogoutUseCase::new(self.sessions.clone())
            .execute(session_id, Utc::now())
            .await
    }

    pub async fn logout_all(
        &self,
        account_id: AccountId,
        except: Option<SessionId>,
    ) -> AuthResult<u64> {
        LogoutUseCase::new(self.sessions.clone())
            .execute_all(account_id, except, Utc::now())
            .await
    }

    /// Guard entry point: bearer token to request identity
    pub async fn authenticate(&self, access_token: &str) -> AuthResult<AuthContext> {
        AuthenticateUseCase::new(self.sessions.clone(), self.tokens.clone())
            .execute(access_token, Utc::now())
            .await
    }

    pub async fn profile(&self, account_id: AccountId) -> AuthResult<PublicAccount> {
        self.accounts().profile(account_id).await
    }

    pub async fn change_password(
        &self,
        account_id: AccountId,
        current_session: SessionId,
        input: ChangePasswordInput,
    ) -> AuthResult<u64> {
        self.accounts()
            .change_password(account_id, current_session, input, Utc::now())
            .await
    }

    pub async fn list_sessions(
        &self,
        account_id: AccountId,
        current: Option<SessionId>,
    ) -> AuthResult<Vec<SessionInfo>> {
        SessionsUseCase::new(self.sessions.clone())
            .list(account_id, current)
            .await
    }

    pub async fn revoke_session(
        &self,
        account_id: AccountId,
        session_id: SessionId,
    ) -> AuthResult<bool> {
        SessionsUseCase::new(self.sessions.clone())
            .revoke_own(account_id, session_id, Utc::now())
            .await
    }

    pub async fn sweep_expired_sessions(&self) -> AuthResult<u64> {
        SessionsUseCase::new(self.sessions.clone())
            .sweep(Utc::now())
            .await
    }

    pub async fn list_accounts(&self) -> AuthResult<Vec<PublicAccount>> {
        self.accounts().list().await
    }

    pub async fn update_account(
        &self,
        account_id: AccountId,
        update: AdminAccountUpdate,
    ) -> AuthResult<PublicAccount> {
        self.accounts()
            .admin_update(account_id, update, Utc::now())
            .await
    }

    /// Create the configured bootstrap admin, if any
    pub async fn ensure_bootstrap_admin(&self) -> AuthResult<bool> {
        match &self.config.bootstrap_admin {
            Some(admin) => self.accounts().ensure_admin(admin, Utc::now()).await,
            None => Ok(false),
        }
    }

    fn accounts(&self) -> AccountUseCase<C, S> {
        AccountUseCase::new(
            self.credentials.clone(),
            self.sessions.clone(),
            self.hasher.clone(),
        )
    }
}
