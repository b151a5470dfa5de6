//! Auth Error Types
//!
//! The closed error taxonomy of the auth core. Each variant maps to one
//! [`ErrorKind`] and one machine-readable code, and converts into the
//! unified `kernel::error::AppError` at the HTTP boundary.

use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::WeakPasswordError;
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed input (email shape, display names, ids)
    #[error("{0}")]
    Validation(String),

    #[error("Password does not meet requirements: {0}")]
    WeakPassword(#[from] WeakPasswordError),

    #[error("An account with this email already exists")]
    DuplicateAccount,

    /// Unknown account, inactive account or wrong password. Deliberately
    /// one variant.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Bad signature, expired, or wrong token type
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Refresh failed for any reason
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// Guard rejected the request: no token, or a token that does not map
    /// to a live session
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Insufficient permissions")]
    Forbidden,

    #[error("Too many requests, retry in {retry_after_secs} seconds")]
    RateLimitExceeded { retry_after_secs: u64 },

    #[error("Account not found")]
    AccountNotFound,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Validation(_) | AuthError::WeakPassword(_) => ErrorKind::BadRequest,
            AuthError::DuplicateAccount => ErrorKind::Conflict,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::InvalidRefreshToken
            | AuthError::Unauthenticated => ErrorKind::Unauthorized,
            AuthError::Forbidden => ErrorKind::Forbidden,
            AuthError::RateLimitExceeded { .. } => ErrorKind::TooManyRequests,
            AuthError::AccountNotFound | AuthError::SessionNotFound => ErrorKind::NotFound,
            AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Machine-readable code, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::WeakPassword(_) => "WEAK_PASSWORD",
            AuthError::DuplicateAccount => "DUPLICATE_ACCOUNT",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            AuthError::Unauthenticated => "UNAUTHENTICATED",
            AuthError::Forbidden => "FORBIDDEN",
            AuthError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            AuthError::AccountNotFound => "ACCOUNT_NOT_FOUND",
            AuthError::SessionNotFound => "SESSION_NOT_FOUND",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to AppError. Internal details stay in the logs.
    pub fn to_app_error(&self) -> AppError {
        let message = match self {
            AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };
        let err = AppError::new(self.kind(), message).with_code(self.code());
        match self {
            AuthError::InvalidRefreshToken => err.with_action("Sign in again"),
            AuthError::RateLimitExceeded { .. } => err.with_action("Wait before retrying"),
            _ => err,
        }
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::InvalidRefreshToken => {
                tracing::warn!("Rejected refresh attempt");
            }
            AuthError::RateLimitExceeded { retry_after_secs } => {
                tracing::warn!(retry_after_secs, "Request rate limited");
            }
            _ => {
                tracing::debug!(error = %self, code = self.code(), "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let mut response = self.to_app_error().into_response();
        match &self {
            AuthError::RateLimitExceeded { retry_after_secs } => {
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(*retry_after_secs));
            }
            AuthError::Unauthenticated | AuthError::InvalidToken => {
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
            }
            _ => {}
        }
        response
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err.kind() {
            ErrorKind::BadRequest => AuthError::Validation(err.message().to_string()),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(format!("Blocking task failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::Validation("x".into()).status_code(), 400);
        assert_eq!(AuthError::DuplicateAccount.status_code(), 409);
        assert_eq!(AuthError::InvalidCredentials.status_code(), 401);
        assert_eq!(AuthError::InvalidToken.status_code(), 401);
        assert_eq!(AuthError::InvalidRefreshToken.status_code(), 401);
        assert_eq!(AuthError::Unauthenticated.status_code(), 401);
        assert_eq!(AuthError::Forbidden.status_code(), 403);
        assert_eq!(
            AuthError::RateLimitExceeded {
                retry_after_secs: 3
            }
            .status_code(),
            429
        );
        assert_eq!(AuthError::SessionNotFound.status_code(), 404);
        assert_eq!(AuthError::Internal("boom".into()).status_code(), 500);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let app = AuthError::Internal("lock poisoned at 0xdead".into()).to_app_error();
        assert_eq!(app.message(), "Internal server error");
        assert_eq!(app.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_rate_limit_response_has_retry_after() {
        let response = AuthError::RateLimitExceeded {
            retry_after_secs: 42,
        }
        .into_response();
        assert_eq!(response.status().as_u16(), 429);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[test]
    fn test_unauthenticated_response_has_challenge() {
        let response = AuthError::Unauthenticated.into_response();
        assert_eq!(response.status().as_u16(), 401);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
    }

    #[test]
    fn test_app_error_bad_request_becomes_validation() {
        let err: AuthError = AppError::bad_request("Invalid email format").into();
        assert!(matches!(err, AuthError::Validation(ref m) if m == "Invalid email format"));
    }
}
