//! Account Entity
//!
//! Identity record owned by the credential store.

use chrono::{DateTime, Utc};
use platform::password::HashedPassword;
use serde::Serialize;

use crate::domain::value_object::{
    AccountId, display_name::DisplayName, email::Email, role::Role,
};

#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    /// Normalized (lowercase) and unique across the store
    pub email: Email,
    pub password_hash: HashedPassword,
    pub first_name: DisplayName,
    pub last_name: DisplayName,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(
        email: Email,
        password_hash: HashedPassword,
        first_name: DisplayName,
        last_name: DisplayName,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            email,
            password_hash,
            first_name,
            last_name,
            role,
            is_active: true,
            email_verified: false,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }

    pub fn can_login(&self) -> bool {
        self.is_active
    }

    pub fn to_public(&self) -> PublicAccount {
        PublicAccount::from(self)
    }
}

/// Field-level changes applied by the credential store under its lock.
#[derive(Debug, Clone, Default)]
pub struct AccountPatch {
    pub email: Option<Email>,
    pub password_hash: Option<HashedPassword>,
    pub first_name: Option<DisplayName>,
    pub last_name: Option<DisplayName>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub email_verified: Option<bool>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl AccountPatch {
    pub fn last_login(at: DateTime<Utc>) -> Self {
        Self {
            last_login_at: Some(at),
            ..Default::default()
        }
    }

    pub fn password(hash: HashedPassword) -> Self {
        Self {
            password_hash: Some(hash),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.password_hash.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.role.is_none()
            && self.is_active.is_none()
            && self.email_verified.is_none()
            && self.last_login_at.is_none()
    }

    /// Write every present field and bump `updated_at`.
    pub fn apply(self, account: &mut Account, now: DateTime<Utc>) {
        if let Some(email) = self.email {
            account.email = email;
        }
        if let Some(hash) = self.password_hash {
            account.password_hash = hash;
        }
        if let Some(first_name) = self.first_name {
            account.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            account.last_name = last_name;
        }
        if let Some(role) = self.role {
            account.role = role;
        }
        if let Some(is_active) = self.is_active {
            account.is_active = is_active;
        }
        if let Some(email_verified) = self.email_verified {
            account.email_verified = email_verified;
        }
        if let Some(at) = self.last_login_at {
            account.last_login_at = Some(at);
        }
        account.updated_at = now;
    }
}

/// Account as returned over the API. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAccount {
    pub id: AccountId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub is_active: bool,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&Account> for PublicAccount {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.to_string(),
            first_name: account.first_name.to_string(),
            last_name: account.last_name.to_string(),
            role: account.role,
            is_active: account.is_active,
            email_verified: account.email_verified,
            created_at: account.created_at,
            updated_at: account.updated_at,
            last_login_at: account.last_login_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use platform::password::{ClearTextPassword, HashingParams};

    fn sample(now: DateTime<Utc>) -> Account {
        let hash = ClearTextPassword::new("Sample1Password".to_string())
            .unwrap()
            .hash(None, &HashingParams::minimal())
            .unwrap();
        Account::new(
            Email::new("ada@example.com").unwrap(),
            hash,
            DisplayName::new("Ada", "firstName").unwrap(),
            DisplayName::new("Lovelace", "lastName").unwrap(),
            Role::User,
            now,
        )
    }

    #[test]
    fn test_new_account_defaults() {
        let now = Utc::now();
        let account = sample(now);
        assert!(account.is_active);
        assert!(!account.email_verified);
        assert_eq!(account.created_at, now);
        assert_eq!(account.updated_at, now);
        assert!(account.last_login_at.is_none());
    }

    #[test]
    fn test_patch_applies_fields_and_bumps_updated_at() {
        let now = Utc::now();
        let mut account = sample(now);
        let later = now + Duration::seconds(5);

        let patch = AccountPatch {
            role: Some(Role::Admin),
            is_active: Some(false),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut account, later);

        assert_eq!(account.role, Role::Admin);
        assert!(!account.is_active);
        assert!(!account.can_login());
        assert_eq!(account.updated_at, later);
        assert_eq!(account.created_at, now);
    }

    #[test]
    fn test_public_account_hides_hash() {
        let account = sample(Utc::now());
        let json = serde_json::to_value(account.to_public()).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["role"], "user");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
    }
}
