//! Platform Crate - Technical Infrastructure
//!
//! Building blocks with no knowledge of accounts or sessions:
//! - Cryptographic helpers (random secrets, SHA-256 fingerprints,
//!   constant-time comparison)
//! - Password policy and Argon2id hashing
//! - Fixed-window rate limiting
//! - Client identification (forwarded IP, user agent, bearer token)

pub mod client;
pub mod crypto;
pub mod password;
pub mod rate_limit;
