//! Value Object Module

pub mod display_name;
pub mod email;
pub mod role;

pub use kernel::id::{AccountId, SessionId};
