//! Session Entity
//!
//! Binds one account to one live access/refresh token pair.
//! `Active -> Inactive` is the only transition; inactive is terminal.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::domain::value_object::{AccountId, SessionId};

#[derive(Clone)]
pub struct Session {
    pub id: SessionId,
    pub account_id: AccountId,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl Session {
    pub fn new(
        account_id: AccountId,
        tokens: TokenPair,
        expires_at: DateTime<Utc>,
        client_ip: Option<String>,
        user_agent: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            account_id,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_at,
            is_active: true,
            created_at: now,
            updated_at: now,
            client_ip,
            user_agent,
        }
    }

    /// The single expiry predicate used by lazy checks and the sweep.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    #[inline]
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }

    /// Flip to inactive. Returns false if it already was.
    pub fn deactivate(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        self.is_active = false;
        self.updated_at = now;
        true
    }

    pub fn info(&self, current: Option<SessionId>) -> SessionInfo {
        SessionInfo {
            id: self.id,
            is_active: self.is_active,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            client_ip: self.client_ip.clone(),
            user_agent: self.user_agent.clone(),
            is_current: current == Some(self.id),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("account_id", &self.account_id)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .field("client_ip", &self.client_ip)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Freshly issued access/refresh tokens
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenPair([REDACTED])")
    }
}

/// Token rotation the store applies atomically: the pair is replaced only
/// if the stored refresh token still equals `expected_refresh`.
#[derive(Clone)]
pub struct SessionPatch {
    pub expected_refresh: String,
    pub tokens: TokenPair,
}

impl SessionPatch {
    pub fn rotate(expected_refresh: impl Into<String>, tokens: TokenPair) -> Self {
        Self {
            expected_refresh: expected_refresh.into(),
            tokens,
        }
    }
}

/// Session as shown to its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: SessionId,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub is_current: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pair(tag: &str) -> TokenPair {
        TokenPair {
            access_token: format!("access-{tag}"),
            refresh_token: format!("refresh-{tag}"),
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        let session = Session::new(
            AccountId::new(),
            pair("a"),
            now + Duration::seconds(10),
            None,
            None,
            now,
        );
        assert!(session.is_usable(now));
        assert!(!session.is_expired(now + Duration::seconds(9)));
        assert!(session.is_expired(now + Duration::seconds(10)));
        assert!(!session.is_usable(now + Duration::seconds(10)));
    }

    #[test]
    fn test_deactivate_is_one_way() {
        let now = Utc::now();
        let mut session = Session::new(
            AccountId::new(),
            pair("a"),
            now + Duration::hours(1),
            None,
            None,
            now,
        );
        let later = now + Duration::seconds(1);
        assert!(session.deactivate(later));
        assert!(!session.is_active);
        assert_eq!(session.updated_at, later);
        assert!(!session.deactivate(later + Duration::seconds(1)));
        assert_eq!(session.updated_at, later);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let now = Utc::now();
        let session = Session::new(
            AccountId::new(),
            pair("secret"),
            now + Duration::hours(1),
            None,
            None,
            now,
        );
        let debug = format!("{session:?}");
        assert!(!debug.contains("access-secret"));
        assert!(!debug.contains("refresh-secret"));
        assert!(!format!("{:?}", pair("secret")).contains("secret"));
    }

    #[test]
    fn test_info_marks_current() {
        let now = Utc::now();
        let session = Session::new(
            AccountId::new(),
            pair("a"),
            now + Duration::hours(1),
            Some("10.0.0.1".into()),
            Some("curl/8".into()),
            now,
        );
        assert!(session.info(Some(session.id)).is_current);
        assert!(!session.info(None).is_current);
        assert_eq!(session.info(None).client_ip.as_deref(), Some("10.0.0.1"));
    }
}
