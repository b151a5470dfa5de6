//! Password Hasher
//!
//! Async front for argon2. Every hash and verify runs on the blocking pool
//! so a login never stalls the request executor or a store lock.

use std::sync::Arc;

use platform::password::{ClearTextPassword, HashedPassword, HashingParams};
use tokio::sync::OnceCell;

use crate::error::{AuthError, AuthResult};

/// Plaintext hashed once per process and verified against when the login
/// email is unknown, so both paths cost one argon2 verification.
const DUMMY_PASSWORD: &str = "Dummy-Password-0";

#[derive(Clone)]
pub struct PasswordHasher {
    pepper: Option<Arc<[u8]>>,
    params: HashingParams,
    dummy: Arc<OnceCell<HashedPassword>>,
}

impl PasswordHasher {
    pub fn new(pepper: Option<&[u8]>, params: HashingParams) -> Self {
        Self {
            pepper: pepper.map(Arc::from),
            params,
            dummy: Arc::new(OnceCell::new()),
        }
    }

    /// Apply the strength policy, then hash. Fails with `WeakPassword`.
    pub async fn hash(&self, plaintext: String) -> AuthResult<HashedPassword> {
        let password = ClearTextPassword::new(plaintext)?;
        self.hash_validated(password).await
    }

    /// Verify; a mismatch or an unreadable hash is `false`.
    pub async fn verify(&self, plaintext: String, hash: &HashedPassword) -> AuthResult<bool> {
        let password = ClearTextPassword::unvalidated(plaintext);
        let hash = hash.clone();
        let pepper = self.pepper.clone();

        let ok = tokio::task::spawn_blocking(move || hash.verify(&password, pepper.as_deref()))
            .await?;
        Ok(ok)
    }

    /// Burn one verification against a fixed hash. Always false.
    pub async fn verify_dummy(&self, plaintext: String) -> AuthResult<bool> {
        let dummy = self
            .dummy
            .get_or_try_init(|| async {
                let password = ClearTextPassword::unvalidated(DUMMY_PASSWORD.to_string());
                self.hash_validated(password).await
            })
            .await?
            .clone();

        self.verify(plaintext, &dummy).await?;
        Ok(false)
    }

    pub fn needs_rehash(&self, hash: &HashedPassword) -> bool {
        hash.needs_rehash(&self.params)
    }

    /// Hash an already-accepted password with the current parameters,
    /// skipping the strength policy it may predate.
    pub async fn rehash(&self, plaintext: String) -> AuthResult<HashedPassword> {
        self.hash_validated(ClearTextPassword::unvalidated(plaintext))
            .await
    }

    async fn hash_validated(&self, password: ClearTextPassword) -> AuthResult<HashedPassword> {
        let pepper = self.pepper.clone();
        let params = self.params;

        tokio::task::spawn_blocking(move || password.hash(pepper.as_deref(), &params))
            .await?
            .map_err(|e| AuthError::Internal(format!("Password hashing failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(Some(b"pepper"), HashingParams::minimal())
    }

    #[tokio::test]
    async fn test_round_trip() {
        let hasher = hasher();
        let hash = hasher.hash("Round1Trip".to_string()).await.unwrap();

        assert!(hasher.verify("Round1Trip".to_string(), &hash).await.unwrap());
        assert!(!hasher.verify("Round1Trip!".to_string(), &hash).await.unwrap());
        assert!(!hasher.verify("round1trip".to_string(), &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_weak_password_rejected() {
        let err = hasher().hash("short".to_string()).await.unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
        assert_eq!(err.code(), "WEAK_PASSWORD");
    }

    #[tokio::test]
    async fn test_pepper_is_bound() {
        let peppered = hasher();
        let plain = PasswordHasher::new(None, HashingParams::minimal());
        let hash = peppered.hash("Pepper1Bound".to_string()).await.unwrap();
        assert!(!plain.verify("Pepper1Bound".to_string(), &hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_dummy_always_false() {
        let hasher = hasher();
        assert!(!hasher.verify_dummy(DUMMY_PASSWORD.to_string()).await.unwrap());
        assert!(!hasher.verify_dummy("anything".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_needs_rehash_on_param_change() {
        let cheap = hasher();
        let hash = cheap.hash("Rehash1Me".to_string()).await.unwrap();
        assert!(!cheap.needs_rehash(&hash));

        let strong = PasswordHasher::new(Some(b"pepper"), HashingParams::default());
        assert!(strong.needs_rehash(&hash));
    }

    #[tokio::test]
    async fn test_rehash_skips_policy() {
        let hasher = hasher();
        let hash = hasher.rehash("legacy".to_string()).await.unwrap();
        assert!(hasher.verify("legacy".to_string(), &hash).await.unwrap());
    }
}
