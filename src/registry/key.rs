//! Stream identity and name rules
//!
//! Streams are addressed by their containing scope plus their own name.
//! Both names follow the same character rules.

use crate::error::{ControllerError, Result};

/// Unique identifier for a stream (scope + stream name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamKey {
    /// Containing scope (e.g., "examples")
    pub scope: String,
    /// Stream name within the scope (e.g., "orders")
    pub name: String,
}

impl StreamKey {
    /// Create a new stream key
    pub fn new(scope: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for StreamKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.scope, self.name)
    }
}

/// Check a scope or stream name
///
/// Names are non-empty, at most `max_len` characters, and made of ASCII
/// alphanumerics, `-` and `.`.
pub fn validate_name(name: &str, max_len: usize) -> Result<()> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name.len() > max_len {
        Some("name is too long")
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
    {
        Some("name may only contain alphanumerics, '-' and '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ControllerError::InvalidName {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let key = StreamKey::new("testStreamsAndScopesManagement0", "7");
        assert_eq!(key.to_string(), "testStreamsAndScopesManagement0/7");
    }

    #[test]
    fn test_valid_names() {
        assert!(validate_name("scope", 255).is_ok());
        assert!(validate_name("my-stream.v2", 255).is_ok());
        assert!(validate_name("1", 255).is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(validate_name("", 255).is_err());
        assert!(validate_name("a/b", 255).is_err());
        assert!(validate_name("with space", 255).is_err());
        assert!(validate_name("_internal", 255).is_err());

        let err = validate_name("abcdef", 5).unwrap_err();
        assert!(matches!(
            err,
            ControllerError::InvalidName {
                reason: "name is too long",
                ..
            }
        ));
    }
}
