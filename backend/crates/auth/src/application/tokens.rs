//! Token Issuer
//!
//! HS256 JWTs. Access and refresh tokens are signed with different secrets
//! and carry different lifetimes. Every verification failure (bad
//! signature, wrong secret, expired, malformed, wrong issuer) is reported
//! as the same `InvalidToken` so callers cannot tell which check failed.

use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::{account::Account, session::TokenPair};
use crate::domain::value_object::{AccountId, role::Role};
use crate::error::{AuthError, AuthResult};

/// Claims carried by both token kinds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: AccountId,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    /// Unique per token, so two pairs minted in the same second differ
    pub jti: Uuid,
}

impl TokenClaims {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// Expired at `now` with zero leeway
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.exp <= now.timestamp()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: TimeDelta,
}

impl SigningKeys {
    fn new(secret: &str, ttl: TimeDelta) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

pub struct TokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
    issuer: String,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against an explicit clock in `verify`
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "sub"]);

        Self {
            access: SigningKeys::new(&config.access_token_secret, config.access_token_ttl_delta()),
            refresh: SigningKeys::new(
                &config.refresh_token_secret,
                config.refresh_token_ttl_delta(),
            ),
            issuer: config.issuer.clone(),
            validation,
        }
    }

    pub fn issue_pair(&self, account: &Account) -> AuthResult<TokenPair> {
        self.issue_pair_at(account, Utc::now())
    }

    pub fn issue_pair_at(&self, account: &Account, now: DateTime<Utc>) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.sign(account, TokenKind::Access, now)?,
            refresh_token: self.sign(account, TokenKind::Refresh, now)?,
        })
    }

    pub fn verify_access(&self, token: &str) -> AuthResult<TokenClaims> {
        self.verify_access_at(token, Utc::now())
    }

    pub fn verify_access_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<TokenClaims> {
        self.verify(token, TokenKind::Access, now)
    }

    pub fn verify_refresh(&self, token: &str) -> AuthResult<TokenClaims> {
        self.verify_refresh_at(token, Utc::now())
    }

    pub fn verify_refresh_at(&self, token: &str, now: DateTime<Utc>) -> AuthResult<TokenClaims> {
        self.verify(token, TokenKind::Refresh, now)
    }

    /// Read claims without checking signature or expiry.
    /// Diagnostics only; never use the result for an access decision.
    pub fn decode_unverified(token: &str) -> Option<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<TokenClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .map(|data| data.claims)
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn sign(&self, account: &Account, kind: TokenKind, now: DateTime<Utc>) -> AuthResult<String> {
        let keys = self.keys(kind);
        let iat = now.timestamp();
        let claims = TokenClaims {
            sub: account.id,
            email: account.email.to_string(),
            role: account.role,
            iat,
            exp: iat.saturating_add(keys.ttl.num_seconds()),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(|e| {
            AuthError::Internal(format!("Failed to sign {} token: {e}", kind.as_str()))
        })
    }

    fn verify(&self, token: &str, kind: TokenKind, now: DateTime<Utc>) -> AuthResult<TokenClaims> {
        let claims = decode::<TokenClaims>(token, &self.keys(kind).decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(kind = kind.as_str(), error = %e, "Token rejected");
                AuthError::InvalidToken
            })?
            .claims;

        if claims.is_expired_at(now) {
            tracing::debug!(kind = kind.as_str(), "Token expired");
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }
}
