//! Display Name Value Object
//!
//! First/last name as shown to users. Sanitized before storage.

use crate::error::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};

pub const DISPLAY_NAME_MAX_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DisplayName(String);

impl DisplayName {
    /// Strip control characters, trim, then check length in characters.
    pub fn new(raw: impl AsRef<str>, field: &'static str) -> AuthResult<Self> {
        let cleaned = Self::sanitize(raw.as_ref());
        let len = cleaned.chars().count();

        if len == 0 {
            return Err(AuthError::Validation(format!("{field} cannot be empty")));
        }
        if len > DISPLAY_NAME_MAX_LENGTH {
            return Err(AuthError::Validation(format!(
                "{field} must be at most {DISPLAY_NAME_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(cleaned))
    }

    pub fn sanitize(raw: &str) -> String {
        let stripped: String = raw.chars().filter(|c| !c.is_control()).collect();
        stripped.trim().to_string()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DisplayName {
    type Error = AuthError;

    fn try_from(value: String) -> AuthResult<Self> {
        DisplayName::new(value, "name")
    }
}

impl From<DisplayName> for String {
    fn from(name: DisplayName) -> Self {
        name.0
    }
}

impl std::fmt::Display for DisplayName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_sanitized() {
        let name = DisplayName::new("  Ada\u{0000}\u{0007} ", "firstName").unwrap();
        assert_eq!(name.as_str(), "Ada");

        let name = DisplayName::new("Jean\n-Luc", "firstName").unwrap();
        assert_eq!(name.as_str(), "Jean-Luc");
    }

    #[test]
    fn test_display_name_empty_after_sanitize() {
        let err = DisplayName::new(" \t\r\n ", "lastName").unwrap_err();
        assert!(matches!(err, AuthError::Validation(ref m) if m.contains("lastName")));
    }

    #[test]
    fn test_display_name_length_counts_chars() {
        assert!(DisplayName::new("é".repeat(50), "firstName").is_ok());
        assert!(DisplayName::new("é".repeat(51), "firstName").is_err());
    }

    #[test]
    fn test_display_name_deserialize_sanitizes() {
        let name: DisplayName = serde_json::from_str("\" Grace\\u0007 \"").unwrap();
        assert_eq!(name.as_str(), "Grace");
        assert!(serde_json::from_str::<DisplayName>("\" \\t \"").is_err());
    }
}
