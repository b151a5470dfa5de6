//! Application Configuration
//!
//! Configuration for the Auth application layer.

use std::env;
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use platform::crypto::random_secret;
use platform::password::HashingParams;
use platform::rate_limit::RateLimitConfig;
use thiserror::Error;

/// Length of generated development secrets, in random bytes
const GENERATED_SECRET_BYTES: usize = 48;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("JWT_SECRET and JWT_REFRESH_SECRET must differ")]
    SharedSecret,
}

/// Account created at startup with the admin role
#[derive(Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Auth application configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for access tokens
    pub access_token_secret: String,
    /// HMAC secret for refresh tokens. Must differ from the access secret.
    pub refresh_token_secret: String,
    /// `iss` claim written and required on every token
    pub issuer: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    /// Lifetime of the server-side session, fixed at login
    pub session_ttl: Duration,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    pub hashing: HashingParams,
    pub auth_rate_limit: RateLimitConfig,
    pub general_rate_limit: RateLimitConfig,
    pub strict_rate_limit: RateLimitConfig,
    pub session_sweep_interval: Duration,
    pub rate_limit_sweep_interval: Duration,
    /// Peers whose `X-Forwarded-For` is believed. Empty means the socket
    /// address is always the client address.
    pub trusted_proxies: Vec<IpAddr>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_secret: String::new(),
            refresh_token_secret: String::new(),
            issuer: "fastify-app".to_string(),
            access_token_ttl: Duration::from_secs(15 * 60), // 15 minutes
            refresh_token_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            session_ttl: Duration::from_secs(7 * 24 * 3600), // 1 week
            password_pepper: None,
            hashing: HashingParams::default(),
            auth_rate_limit: RateLimitConfig::auth(),
            general_rate_limit: RateLimitConfig::general(),
            strict_rate_limit: RateLimitConfig::strict(),
            session_sweep_interval: Duration::from_secs(60),
            rate_limit_sweep_interval: Duration::from_secs(60),
            trusted_proxies: Vec::new(),
            bootstrap_admin: None,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("issuer", &self.issuer)
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("session_ttl", &self.session_ttl)
            .field("pepper_set", &self.password_pepper.is_some())
            .field("hashing", &self.hashing)
            .field("trusted_proxies", &self.trusted_proxies)
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}

impl AuthConfig {
    /// Create config with random token secrets
    pub fn with_random_secrets() -> Self {
        Self {
            access_token_secret: random_secret(GENERATED_SECRET_BYTES),
            refresh_token_secret: random_secret(GENERATED_SECRET_BYTES),
            ..Default::default()
        }
    }

    /// Create config for development
    pub fn development() -> Self {
        Self::with_random_secrets()
    }

    /// Random secrets and the cheapest argon2 parameters
    pub fn testing() -> Self {
        Self {
            hashing: HashingParams::minimal(),
            ..Self::with_random_secrets()
        }
    }

    /// Read configuration from the process environment.
    ///
    /// Missing token secrets are an error in release builds. Debug builds
    /// fall back to random secrets, which invalidates tokens on restart.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let access = optional_var("JWT_SECRET");
        let refresh = optional_var("JWT_REFRESH_SECRET");
        match (access, refresh) {
            (Some(access), Some(refresh)) => {
                config.access_token_secret = access;
                config.refresh_token_secret = refresh;
            }
            (access, refresh) if cfg!(debug_assertions) => {
                tracing::warn!("JWT secrets not configured, using random development secrets");
                config.access_token_secret =
                    access.unwrap_or_else(|| random_secret(GENERATED_SECRET_BYTES));
                config.refresh_token_secret =
                    refresh.unwrap_or_else(|| random_secret(GENERATED_SECRET_BYTES));
            }
            (None, _) => return Err(ConfigError::Missing("JWT_SECRET")),
            (_, None) => return Err(ConfigError::Missing("JWT_REFRESH_SECRET")),
        }

        if config.access_token_secret == config.refresh_token_secret {
            return Err(ConfigError::SharedSecret);
        }

        if let Some(issuer) = optional_var("JWT_ISSUER") {
            config.issuer = issuer;
        }
        config.access_token_ttl = secs_var("ACCESS_TOKEN_TTL_SECS", config.access_token_ttl)?;
        config.refresh_token_ttl = secs_var("REFRESH_TOKEN_TTL_SECS", config.refresh_token_ttl)?;
        config.session_ttl = secs_var("SESSION_TTL_SECS", config.session_ttl)?;
        config.password_pepper = optional_var("PASSWORD_PEPPER").map(String::into_bytes);
        if let Some(raw) = optional_var("TRUSTED_PROXIES") {
            config.trusted_proxies = parse_ip_list("TRUSTED_PROXIES", &raw)?;
        }

        let admin = (optional_var("ADMIN_EMAIL"), optional_var("ADMIN_PASSWORD"));
        config.bootstrap_admin = match admin {
            (Some(email), Some(password)) => Some(BootstrapAdmin {
                email,
                password,
                first_name: optional_var("ADMIN_FIRST_NAME").unwrap_or_else(|| "Admin".into()),
                last_name: optional_var("ADMIN_LAST_NAME").unwrap_or_else(|| "User".into()),
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_EMAIL")),
        };

        Ok(config)
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }

    pub fn access_token_ttl_delta(&self) -> TimeDelta {
        to_delta(self.access_token_ttl)
    }

    pub fn refresh_token_ttl_delta(&self) -> TimeDelta {
        to_delta(self.refresh_token_ttl)
    }

    /// Expiry of a session opened at `now`
    pub fn session_expiry(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(to_delta(self.session_ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

fn to_delta(duration: Duration) -> TimeDelta {
    TimeDelta::from_std(duration).unwrap_or(TimeDelta::MAX)
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Comma-separated IP addresses
fn parse_ip_list(name: &'static str, raw: &str) -> Result<Vec<IpAddr>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry.parse::<IpAddr>().map_err(|e| ConfigError::Invalid {
                name,
                reason: format!("{entry:?}: {e}"),
            })
        })
        .collect()
}

fn secs_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let Some(raw) = optional_var(name) else {
        return Ok(default);
    };
    let secs: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
        name,
        reason: format!("{e}"),
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be greater than zero".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}
