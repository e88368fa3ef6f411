//! Email address type.
//!
//! Customer identity frequently falls back to an email address (guest
//! checkout, abandoned carts), so addresses are normalized on parse:
//! surrounding whitespace is trimmed and the address is lowercased. Two
//! spellings of the same address therefore compare equal, which is what
//! visitor-deduplication and customer-grouping rely on.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty (after trimming).
    #[error("email cannot be empty")]
    Empty,
    /// The input string exceeds the RFC 5321 length limit.
    #[error("email must be at most {0} characters")]
    TooLong(usize),
    /// The input is not of the form `local@domain`.
    #[error("malformed email address: {0}")]
    Malformed(String),
}

/// A normalized email address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse and normalize an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, longer than 254
    /// characters, or not of the form `local@domain` with a non-empty
    /// local part and domain.
    pub fn parse(input: &str) -> Result<Self, EmailError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong(Self::MAX_LENGTH));
        }

        let mut parts = trimmed.splitn(2, '@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(EmailError::Malformed(trimmed.to_owned()));
        }

        Ok(Self(trimmed.to_lowercase()))
    }

    /// Returns the normalized address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the domain part of the address.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or_default()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let email = Email::parse("shopper@example.com").expect("valid");
        assert_eq!(email.as_str(), "shopper@example.com");
        assert_eq!(email.domain(), "example.com");
    }

    #[test]
    fn test_normalization() {
        let a = Email::parse("  Shopper@Example.COM ").expect("valid");
        let b = Email::parse("shopper@example.com").expect("valid");
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
        assert_eq!(Email::parse("   "), Err(EmailError::Empty));
        assert!(matches!(
            Email::parse("no-at-symbol"),
            Err(EmailError::Malformed(_))
        ));
        assert!(matches!(
            Email::parse("@example.com"),
            Err(EmailError::Malformed(_))
        ));
        assert!(matches!(Email::parse("user@"), Err(EmailError::Malformed(_))));
        assert!(matches!(
            Email::parse("a@b@c.com"),
            Err(EmailError::Malformed(_))
        ));
    }

    #[test]
    fn test_rejects_too_long() {
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(Email::parse(&long), Err(EmailError::TooLong(_))));
    }
}
