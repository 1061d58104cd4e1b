//! Unguessable order tracking token.
//!
//! Guests have no account, so the confirmation and tracking pages are keyed by
//! a random token instead of the sequential order number.

use core::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`TrackingToken`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingTokenError {
    #[error("tracking token must be {expected} characters")]
    Length { expected: usize },
    #[error("tracking token contains invalid characters")]
    InvalidChar,
}

/// Random URL-safe token identifying one order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(transparent)]
pub struct TrackingToken(String);

impl TrackingToken {
    const RAW_BYTES: usize = 24;

    /// Encoded length of a token.
    pub const LENGTH: usize = 32;

    /// Generate a fresh token from the thread-local CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::RAW_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Validate a token taken from a URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has the wrong length or characters
    /// outside the URL-safe base64 alphabet.
    pub fn parse(s: &str) -> Result<Self, TrackingTokenError> {
        if s.len() != Self::LENGTH {
            return Err(TrackingTokenError::Length {
                expected: Self::LENGTH,
            });
        }
        if !s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(TrackingTokenError::InvalidChar);
        }
        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for TrackingToken {
    type Err = TrackingTokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_token_is_parseable() {
        let token = TrackingToken::generate();
        assert_eq!(token.as_str().len(), TrackingToken::LENGTH);
        assert_eq!(TrackingToken::parse(token.as_str()).unwrap(), token);
    }

    #[test]
    fn test_generated_tokens_differ() {
        assert_ne!(TrackingToken::generate(), TrackingToken::generate());
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!(
            TrackingToken::parse("abc"),
            Err(TrackingTokenError::Length { expected: 32 })
        );
    }

    #[test]
    fn test_parse_rejects_bad_alphabet() {
        let bad = format!("{}+/", "a".repeat(30));
        assert_eq!(
            TrackingToken::parse(&bad),
            Err(TrackingTokenError::InvalidChar)
        );
    }
}
