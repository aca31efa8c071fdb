use serde::{Deserialize, Serialize};

use std::fmt;

/// Name of the secret holding the Anthropic API key.
pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";

/// A secret key identifier (e.g., "ANTHROPIC_API_KEY").
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretKey(pub String);

impl SecretKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Whether this is a usable env-file key: ASCII letters, digits and
    /// underscores, not starting with a digit.
    pub fn is_valid(&self) -> bool {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretKey(\"{}\")", self.0)
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A wrapper that redacts secret values in Debug and Display output.
///
/// Use this to wrap any `String` that might contain sensitive data.
/// The actual value is accessible via `.expose()`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Redacted(String);

impl Redacted {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Access the underlying secret value.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Show masked representation: last 4 chars visible.
    pub fn masked(&self) -> String {
        let count = self.0.chars().count();
        if count <= 4 {
            "****".to_string()
        } else {
            let tail: String = self.0.chars().skip(count - 4).collect();
            format!("****{tail}")
        }
    }
}

impl fmt::Debug for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Redacted(\"***\")")
    }
}

impl fmt::Display for Redacted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_debug_hides_value() {
        let secret = Redacted::new("sk-ant-very-secret");
        assert_eq!(format!("{secret:?}"), "Redacted(\"***\")");
        assert_eq!(format!("{secret}"), "***");
        assert_eq!(secret.expose(), "sk-ant-very-secret");
    }

    #[test]
    fn test_redacted_masked() {
        assert_eq!(Redacted::new("sk-abcdefghijklmnop").masked(), "****mnop");
        assert_eq!(Redacted::new("abcd").masked(), "****");
        assert_eq!(Redacted::new("").masked(), "****");
    }

    #[test]
    fn test_secret_key_validity() {
        assert!(SecretKey::new(ANTHROPIC_API_KEY).is_valid());
        assert!(SecretKey::new("_PRIVATE").is_valid());
        assert!(!SecretKey::new("1KEY").is_valid());
        assert!(!SecretKey::new("MY-KEY").is_valid());
        assert!(!SecretKey::new("").is_valid());
    }
}
