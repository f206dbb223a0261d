//! Credential wrapper that never prints its value.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

const REDACTED: &str = "********";

/// A credential such as an API token or webhook secret.
///
/// `Debug` and `Display` print a mask; use [`Secret::expose`] to read it.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Return the underlying credential.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret({})", REDACTED)
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}

// Serialized form is masked so `config show` output and saved files never leak tokens.
impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_masked() {
        let secret = Secret::new("ghp_abc123");
        assert_eq!(format!("{}", secret), "********");
        assert_eq!(format!("{:?}", secret), "Secret(********)");
        assert!(!format!("{:?}", Some(secret.clone())).contains("ghp_abc123"));
        assert_eq!(secret.expose(), "ghp_abc123");
    }

    #[test]
    fn test_deserialize_from_plain_string() {
        let secret: Secret = serde_json::from_str("\"token\"").unwrap();
        assert_eq!(secret.expose(), "token");
    }

    #[test]
    fn test_serialize_is_masked() {
        let json = serde_json::to_string(&Secret::new("token")).unwrap();
        assert_eq!(json, "\"********\"");
    }
}
