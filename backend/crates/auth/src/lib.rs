//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, store traits
//! - `application/` - Config, token issuer, password hasher, use cases, gateway
//! - `infra/` - In-memory store implementations
//! - `presentation/` - HTTP handlers, DTOs, guard and rate-limit middleware, router
//!
//! ## Features
//! - Registration and email/password login
//! - HS256 access/refresh token pairs with rotation on refresh
//! - Server-side sessions: a valid token is only accepted while its session
//!   is active, so logout and logout-all take effect immediately
//! - Role-based access (`user`, `admin`)
//!
//! ## Security Model
//! - Passwords hashed with Argon2id on the blocking pool
//! - Login failures are indistinguishable (unknown email, inactive account,
//!   wrong password) and cost the same hashing work
//! - Fixed-window rate limiting on credential endpoints

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;


// Re-exports for convenience
pub use application::{AuthConfig, AuthContext, AuthGateway, TokenIssuer};
pub use error::{AuthError, AuthResult};
pub use infra::{MemoryCredentialStore, MemorySessionStore};
pub use presentation::router::{admin_router, api_router, auth_router};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::account::*;
    pub use crate::domain::entity::session::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
