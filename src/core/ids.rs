//! Validated identifiers for users, words and wordbooks.
//!
//! Identifiers end up in storage keys and file names, so they are restricted
//! to ASCII alphanumerics, `-` and `_`, and at most [`MAX_ID_LEN`] bytes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WordtrailError};

/// Maximum identifier length in bytes.
pub const MAX_ID_LEN: usize = 64;

/// Check an identifier against the allowed alphabet and length.
fn validate(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(WordtrailError::invalid_argument(format!(
            "{} must not be empty",
            kind
        )));
    }
    if value.len() > MAX_ID_LEN {
        return Err(WordtrailError::invalid_argument(format!(
            "{} '{}' is longer than {} characters",
            kind, value, MAX_ID_LEN
        )));
    }
    if let Some(bad) = value
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(WordtrailError::invalid_argument(format!(
            "{} '{}' contains invalid character {:?}",
            kind, value, bad
        )));
    }
    Ok(())
}

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse and validate an identifier.
            pub fn new(value: impl Into<String>) -> Result<Self> {
                let value = value.into();
                validate($kind, &value)?;
                Ok(Self(value))
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = WordtrailError;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = WordtrailError;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

identifier!(
    /// Identifier of a learner.
    UserId,
    "user id"
);

identifier!(
    /// Identifier of a vocabulary item.
    WordId,
    "word id"
);

identifier!(
    /// Identifier of a system or user-curated wordbook.
    BookId,
    "book id"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_identifiers() {
        assert_eq!(UserId::new("alice").unwrap().as_str(), "alice");
        assert_eq!(WordId::new("w_001-a").unwrap().to_string(), "w_001-a");
        assert!(BookId::new("65f1c2a9e4b0a1b2c3d4e5f6").is_ok());
    }

    #[test]
    fn test_empty_identifier_rejected() {
        let err = UserId::new("").unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("user id must not be empty"));
    }

    #[test]
    fn test_path_characters_rejected() {
        assert!(WordId::new("../etc").unwrap_err().is_invalid_argument());
        assert!(WordId::new("a/b").is_err());
        assert!(WordId::new("has space").is_err());
    }

    #[test]
    fn test_length_limit() {
        assert!(BookId::new("x".repeat(MAX_ID_LEN)).is_ok());
        assert!(BookId::new("x".repeat(MAX_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_from_str() {
        let id: UserId = "bob".parse().unwrap();
        assert_eq!(id.as_str(), "bob");
        assert!("".parse::<UserId>().is_err());
    }

    #[test]
    fn test_serde_validates() {
        let id: WordId = serde_json::from_str("\"apple\"").unwrap();
        assert_eq!(id.as_str(), "apple");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"apple\"");

        assert!(serde_json::from_str::<WordId>("\"bad id\"").is_err());
    }
}
