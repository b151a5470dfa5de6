//! Password Policy and Hashing
//!
//! - Strength policy: 8..=128 characters after NFKC normalization, at least
//!   one lowercase letter, one uppercase letter and one digit, no control
//!   characters. Every violation is reported, not just the first.
//! - Argon2id hashing into PHC strings, with an optional pepper.
//! - Clear text is zeroized on drop.
//!
//! Hashing is deliberately slow. Callers on an async runtime should run
//! [`ClearTextPassword::hash`] and [`HashedPassword::verify`] on a blocking
//! thread.

use std::fmt;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

// ============================================================================
// Constants
// ============================================================================

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub const MAX_PASSWORD_LENGTH: usize = 128;

// ============================================================================
// Error Types
// ============================================================================

/// A single strength-policy violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min} characters (got {actual})")]
    TooShort { min: usize, actual: usize },

    #[error("Password must be at most {max} characters (got {actual})")]
    TooLong { max: usize, actual: usize },

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one number")]
    MissingDigit,

    #[error("Password contains invalid control characters")]
    InvalidCharacter,
}

/// The password failed the strength policy. Carries every violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.0))]
pub struct WeakPasswordError(Vec<PasswordPolicyError>);

impl WeakPasswordError {
    pub fn violations(&self) -> &[PasswordPolicyError] {
        &self.0
    }
}

fn describe(violations: &[PasswordPolicyError]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Password hashing errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,

    #[error("Invalid Argon2 parameters: {0}")]
    InvalidParams(String),
}

// ============================================================================
// Hashing cost
// ============================================================================

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory in KiB
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashingParams {
    /// OWASP recommendation: m=19456 (19 MiB), t=2, p=1
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingParams {
    /// Smallest cost Argon2 accepts. Only for tests.
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }

    fn argon2(&self) -> Result<Argon2<'static>, PasswordHashError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| PasswordHashError::InvalidParams(e.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

// ============================================================================
// Strength policy
// ============================================================================

/// All policy violations for an already-normalized password.
pub fn check_strength(password: &str) -> Vec<PasswordPolicyError> {
    let mut violations = Vec::new();

    // Count code points, not bytes
    let char_count = password.chars().count();
    if char_count < MIN_PASSWORD_LENGTH {
        violations.push(PasswordPolicyError::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual: char_count,
        });
    }
    if char_count > MAX_PASSWORD_LENGTH {
        violations.push(PasswordPolicyError::TooLong {
            max: MAX_PASSWORD_LENGTH,
            actual: char_count,
        });
    }
    if !password.chars().any(char::is_lowercase) {
        violations.push(PasswordPolicyError::MissingLowercase);
    }
    if !password.chars().any(char::is_uppercase) {
        violations.push(PasswordPolicyError::MissingUppercase);
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        violations.push(PasswordPolicyError::MissingDigit);
    }
    if password.chars().any(char::is_control) {
        violations.push(PasswordPolicyError::InvalidCharacter);
    }

    violations
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password, NFKC-normalized and zeroized on drop.
///
/// Not `Clone`; `Debug` is redacted.
///
/// ```rust
/// use platform::password::{ClearTextPassword, HashingParams};
///
/// let password = ClearTextPassword::new("Correct1Horse".to_string()).unwrap();
/// let hashed = password.hash(None, &HashingParams::minimal()).unwrap();
/// assert!(hashed.verify(&password, None));
/// ```
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

impl ClearTextPassword {
    /// Normalize and apply the strength policy. Use for new passwords.
    pub fn new(raw: String) -> Result<Self, WeakPasswordError> {
        let password = Self::unvalidated(raw);
        let violations = check_strength(&password.0);
        if violations.is_empty() {
            Ok(password)
        } else {
            Err(WeakPasswordError(violations))
        }
    }

    /// Normalize only. Use for passwords presented for verification, which
    /// may predate the current policy.
    pub fn unvalidated(mut raw: String) -> Self {
        let normalized: String = raw.nfkc().collect();
        raw.zeroize();
        Self(normalized)
    }

    fn peppered(&self, pepper: Option<&[u8]>) -> Zeroizing<Vec<u8>> {
        let mut bytes = Zeroizing::new(self.0.as_bytes().to_vec());
        if let Some(p) = pepper {
            bytes.extend_from_slice(p);
        }
        bytes
    }

    /// Hash with Argon2id and a fresh 128-bit salt
    pub fn hash(
        &self,
        pepper: Option<&[u8]>,
        params: &HashingParams,
    ) -> Result<HashedPassword, PasswordHashError> {
        let password_bytes = self.peppered(pepper);
        let salt = SaltString::generate(&mut OsRng);

        let hash = params
            .argon2()?
            .hash_password(&password_bytes, &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id hash in PHC string format (algorithm, version, cost, salt, hash)
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash. A mismatch is `false`, never an
    /// error. The cost parameters are read from the PHC string.
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        // Argon2 uses constant-time comparison internally
        Argon2::default()
            .verify_password(&password.peppered(pepper), &parsed_hash)
            .is_ok()
    }

    /// True when the hash is not Argon2id or was made with different cost
    /// parameters than `params`.
    pub fn needs_rehash(&self, params: &HashingParams) -> bool {
        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return true,
        };

        if parsed_hash.algorithm != Algorithm::Argon2id.ident() {
            return true;
        }

        match Params::try_from(&parsed_hash) {
            Ok(stored) => {
                stored.m_cost() != params.memory_kib
                    || stored.t_cost() != params.iterations
                    || stored.p_cost() != params.parallelism
            }
            Err(_) => true,
        }
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> HashingParams {
        HashingParams::minimal()
    }

    #[test]
    fn test_password_too_short() {
        let err = ClearTextPassword::new("Ab1".to_string()).unwrap_err();
        assert_eq!(
            err.violations(),
            &[PasswordPolicyError::TooShort { min: 8, actual: 3 }]
        );
    }

    #[test]
    fn test_password_too_long() {
        let long_password = format!("Aa1{}", "a".repeat(MAX_PASSWORD_LENGTH));
        let err = ClearTextPassword::new(long_password).unwrap_err();
        assert!(matches!(
            err.violations(),
            [PasswordPolicyError::TooLong { .. }]
        ));
    }

    #[test]
    fn test_missing_character_classes_are_all_reported() {
        let err = ClearTextPassword::new("        ".to_string()).unwrap_err();
        assert_eq!(
            err.violations(),
            &[
                PasswordPolicyError::MissingLowercase,
                PasswordPolicyError::MissingUppercase,
                PasswordPolicyError::MissingDigit,
            ]
        );
        let message = err.to_string();
        assert!(message.contains("lowercase"));
        assert!(message.contains("uppercase"));
        assert!(message.contains("number"));
    }

    #[test]
    fn test_each_class_is_required() {
        assert_eq!(
            check_strength("lowercase1"),
            vec![PasswordPolicyError::MissingUppercase]
        );
        assert_eq!(
            check_strength("UPPERCASE1"),
            vec![PasswordPolicyError::MissingLowercase]
        );
        assert_eq!(
            check_strength("NoDigitsHere"),
            vec![PasswordPolicyError::MissingDigit]
        );
    }

    #[test]
    fn test_control_characters_rejected() {
        let err = ClearTextPassword::new("Valid1Pass\u{0007}".to_string()).unwrap_err();
        assert_eq!(err.violations(), &[PasswordPolicyError::InvalidCharacter]);
    }

    #[test]
    fn test_valid_password() {
        assert!(ClearTextPassword::new("MySecure#Pass2024!".to_string()).is_ok());
    }

    #[test]
    fn test_nfkc_normalization() {
        // Fullwidth digits normalize to ASCII and satisfy the digit rule
        assert!(ClearTextPassword::new("Password１２３".to_string()).is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = password.hash(None, &cheap()).unwrap();

        assert!(hashed.verify(&password, None));

        let wrong = ClearTextPassword::unvalidated("WrongPassword123!".to_string());
        assert!(!hashed.verify(&wrong, None));
    }

    #[test]
    fn test_same_password_different_salts() {
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let a = password.hash(None, &cheap()).unwrap();
        let b = password.hash(None, &cheap()).unwrap();
        assert_ne!(a.as_phc_string(), b.as_phc_string());
    }

    #[test]
    fn test_hash_with_pepper() {
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let pepper = b"my_secret_pepper";
        let hashed = password.hash(Some(pepper), &cheap()).unwrap();

        assert!(hashed.verify(&password, Some(pepper)));
        assert!(!hashed.verify(&password, None));
        assert!(!hashed.verify(&password, Some(b"wrong_pepper")));
    }

    #[test]
    fn test_phc_string_roundtrip() {
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = password.hash(None, &cheap()).unwrap();

        assert!(hashed.as_phc_string().starts_with("$argon2id$"));
        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&password, None));
    }

    #[test]
    fn test_invalid_phc_string() {
        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_needs_rehash_on_cost_change() {
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = password.hash(None, &cheap()).unwrap();

        assert!(!hashed.needs_rehash(&cheap()));
        assert!(hashed.needs_rehash(&HashingParams::default()));
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::unvalidated("secret".to_string());
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));
    }
}
