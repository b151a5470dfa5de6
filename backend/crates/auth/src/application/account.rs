//! Account Use Cases
//!
//! Profile, password change, and the admin surface over accounts.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::application::config::BootstrapAdmin;
use crate::application::hasher::PasswordHasher;
use crate::domain::entity::account::{Account, AccountPatch, PublicAccount};
use crate::domain::repository::{CredentialStore, SessionStore};
use crate::domain::value_object::{
    AccountId, SessionId, display_name::DisplayName, email::Email, role::Role,
};
use crate::error::{AuthError, AuthResult};

/// Change password input
pub struct ChangePasswordInput {
    pub current_password: String,
    pub new_password: String,
}

/// Fields an admin may change on any account
#[derive(Debug, Clone, Default)]
pub struct AdminAccountUpdate {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub email_verified: Option<bool>,
}

/// Account use case
pub struct AccountUseCase<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    credentials: Arc<C>,
    sessions: Arc<S>,
    hasher: PasswordHasher,
}

impl<C, S> AccountUseCase<C, S>
where
    C: CredentialStore,
    S: SessionStore,
{
    pub fn new(credentials: Arc<C>, sessions: Arc<S>, hasher: PasswordHasher) -> Self {
        Self {
            credentials,
            sessions,
            hasher,
        }
    }

    pub async fn profile(&self, account_id: AccountId) -> AuthResult<PublicAccount> {
        self.credentials
            .find_by_id(account_id)
            .await?
            .map(|a| a.to_public())
            .ok_or(AuthError::AccountNotFound)
    }

    /// Replace the password and revoke every other session of the account.
    /// Returns how many sessions were revoked.
    pub async fn change_password(
        &self,
        account_id: AccountId,
        current_session: SessionId,
        input: ChangePasswordInput,
        now: DateTime<Utc>,
    ) -> AuthResult<u64> {
        let account = self
            .credentials
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if !self
            .hasher
            .verify(input.current_password, &account.password_hash)
            .await?
        {
            return Err(AuthError::InvalidCredentials);
        }

        let new_hash = self.hasher.hash(input.new_password).await?;
        self.credentials
            .update(account_id, AccountPatch::password(new_hash), now)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let revoked = self
            .sessions
            .revoke_all_for_account(account_id, Some(current_session), now)
            .await?;

        tracing::info!(account_id = %account_id, revoked, "Password changed");
        Ok(revoked)
    }

    pub async fn list(&self) -> AuthResult<Vec<PublicAccount>> {
        let accounts = self.credentials.list().await?;
        Ok(accounts.iter().map(Account::to_public).collect())
    }

    /// Deactivation or a role change revokes all the account's sessions, so
    /// tokens carrying the old role stop working.
    pub async fn admin_update(
        &self,
        account_id: AccountId,
        update: AdminAccountUpdate,
        now: DateTime<Utc>,
    ) -> AuthResult<PublicAccount> {
        let before = self
            .credentials
            .find_by_id(account_id)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let patch = AccountPatch {
            role: update.role,
            is_active: update.is_active,
            email_verified: update.email_verified,
            ..Default::default()
        };
        let after = self
            .credentials
            .update(account_id, patch, now)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let deactivated = before.is_active && !after.is_active;
        let role_changed = before.role != after.role;
        if deactivated || role_changed {
            let revoked = self
                .sessions
                .revoke_all_for_account(account_id, None, now)
                .await?;
            tracing::info!(
                account_id = %account_id,
                deactivated,
                role_changed,
                revoked,
                "Account sessions revoked after admin update"
            );
        }

        Ok(after.to_public())
    }

    /// Create the configured admin unless an account already has its email.
    /// Returns true when an account was created.
    pub async fn ensure_admin(
        &self,
        admin: &BootstrapAdmin,
        now: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let email = Email::new(&admin.email)?;
        if self.credentials.find_by_email(email.as_str()).await?.is_some() {
            tracing::debug!(email = %email, "Bootstrap admin already present");
            return Ok(false);
        }

        let hash = self.hasher.hash(admin.password.clone()).await?;
        let mut account = Account::new(
            email,
            hash,
            DisplayName::new(&admin.first_name, "firstName")?,
            DisplayName::new(&admin.last_name, "lastName")?,
            Role::Admin,
            now,
        );
        account.email_verified = true;

        match self.credentials.create(account).await {
            Ok(account) => {
                tracing::info!(account_id = %account.id, "Bootstrap admin created");
                Ok(true)
            }
            Err(AuthError::DuplicateAccount) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
