//! Presentation Layer
//!
//! HTTP handlers, DTOs, extractors, router, and middleware.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod router;

pub use extract::{Client, MaybeAuth};
pub use handlers::AuthAppState;
pub use middleware::{optional_auth, require_admin, require_auth};
pub use rate_limit::{RateLimitState, rate_limit};
pub use router::{admin_router, api_router, auth_router};
