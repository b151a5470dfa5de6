//! Infrastructure Layer
//!
//! Process-local store implementations. Each store owns one registry behind
//! one lock; no operation holds more than one store's lock.

pub mod credential_store;
pub mod session_store;

pub use credential_store::MemoryCredentialStore;
pub use session_store::MemorySessionStore;
