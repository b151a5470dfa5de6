//! In-memory credential store

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::entity::account::{Account, AccountPatch};
use crate::domain::repository::CredentialStore;
use crate::domain::value_object::{AccountId, email::Email};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Default)]
struct Registry {
    accounts: HashMap<AccountId, Account>,
    /// normalized email -> account id
    by_email: HashMap<String, AccountId>,
}

/// Account registry held in process memory
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    registry: RwLock<Registry>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.registry.read().await.accounts.len()
    }
}

impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, account: Account) -> AuthResult<Account> {
        let key = account.email.as_str().to_string();
        let mut registry = self.registry.write().await;

        if registry.by_email.contains_key(&key) {
            return Err(AuthError::DuplicateAccount);
        }

        registry.by_email.insert(key, account.id);
        registry.accounts.insert(account.id, account.clone());

        tracing::debug!(account_id = %account.id, "Account stored");
        Ok(account)
    }

    async fn find_by_id(&self, id: AccountId) -> AuthResult<Option<Account>> {
        Ok(self.registry.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>> {
        let key = Email::normalize(email);
        let registry = self.registry.read().await;
        Ok(registry
            .by_email
            .get(&key)
            .and_then(|id| registry.accounts.get(id))
            .cloned())
    }

    async fn update(
        &self,
        id: AccountId,
        patch: AccountPatch,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>> {
        let mut guard = self.registry.write().await;
        let registry = &mut *guard;

        let Some(account) = registry.accounts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(new_email) = &patch.email {
            let new_key = new_email.as_str();
            if new_key != account.email.as_str() {
                if registry.by_email.contains_key(new_key) {
                    return Err(AuthError::DuplicateAccount);
                }
                registry.by_email.remove(account.email.as_str());
                registry.by_email.insert(new_key.to_string(), id);
            }
        }

        patch.apply(account, now);
        Ok(Some(account.clone()))
    }

    async fn list(&self) -> AuthResult<Vec<Account>> {
        let registry = self.registry.read().await;
        let mut accounts: Vec<Account> = registry.accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::{display_name::DisplayName, role::Role};
    use platform::password::{ClearTextPassword, HashedPassword, HashingParams};
    use std::sync::OnceLock;

    fn hash() -> HashedPassword {
        static HASH: OnceLock<HashedPassword> = OnceLock::new();
        HASH.get_or_init(|| {
            ClearTextPassword::new("Fixture1Password".to_string())
                .unwrap()
                .hash(None, &HashingParams::minimal())
                .unwrap()
        })
        .clone()
    }

    fn account(email: &str) -> Account {
        Account::new(
            Email::new(email).unwrap(),
            hash(),
            DisplayName::new("Test", "firstName").unwrap(),
            DisplayName::new("User", "lastName").unwrap(),
            Role::User,
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let store = MemoryCredentialStore::new();
        let created = store.create(account("a@example.com")).await.unwrap();

        let by_id = store.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email.as_str(), "a@example.com");

        let by_email = store.find_by_email("A@Example.COM").await.unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        assert!(store.find_by_email("b@example.com").await.unwrap().is_none());
        assert!(store.find_by_id(AccountId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryCredentialStore::new();
        store.create(account("dup@example.com")).await.unwrap();

        let err = store.create(account("DUP@example.com")).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateAccount));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_missing_account() {
        let store = MemoryCredentialStore::new();
        let result = store
            .update(AccountId::new(), AccountPatch::last_login(Utc::now()), Utc::now())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_email_reindexes() {
        let store = MemoryCredentialStore::new();
        let a = store.create(account("a@example.com")).await.unwrap();
        store.create(account("b@example.com")).await.unwrap();

        let taken = AccountPatch {
            email: Some(Email::new("b@example.com").unwrap()),
            ..Default::default()
        };
        let err = store.update(a.id, taken, Utc::now()).await.unwrap_err();
        assert!(matches!(err, AuthError::DuplicateAccount));

        let moved = AccountPatch {
            email: Some(Email::new("c@example.com").unwrap()),
            ..Default::default()
        };
        store.update(a.id, moved, Utc::now()).await.unwrap().unwrap();

        assert!(store.find_by_email("a@example.com").await.unwrap().is_none());
        assert_eq!(
            store.find_by_email("c@example.com").await.unwrap().unwrap().id,
            a.id
        );
    }

    #[tokio::test]
    async fn test_list_oldest_first() {
        let store = MemoryCredentialStore::new();
        let first = store.create(account("first@example.com")).await.unwrap();
        let second = store.create(account("second@example.com")).await.unwrap();

        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), 2);
        if first.created_at < second.created_at {
            assert_eq!(ids, vec![first.id, second.id]);
        }
    }
}
