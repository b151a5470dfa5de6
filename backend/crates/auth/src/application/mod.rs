//! Application Layer
//!
//! Use cases and application services.

pub mod account;
pub mod authenticate;
pub mod config;
pub mod gateway;
pub mod hasher;
pub mod login;
pub mod logout;
pub mod refresh;
pub mod register;
pub mod sessions;
pub mod tokens;

// Re-exports
pub use account::{AccountUseCase, AdminAccountUpdate, ChangePasswordInput};
pub use authenticate::{AuthContext, AuthenticateUseCase};
pub use config::{AuthConfig, BootstrapAdmin, ConfigError};
pub use gateway::AuthGateway;
pub use hasher::PasswordHasher;
pub use login::{AuthOutcome, LoginInput, LoginUseCase};
pub use logout::LogoutUseCase;
pub use refresh::{RefreshOutput, RefreshUseCase};
pub use register::{RegisterInput, RegisterUseCase};
pub use sessions::SessionsUseCase;
pub use tokens::{TokenClaims, TokenIssuer};
