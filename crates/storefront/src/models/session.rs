//! Session-related types.
//!
//! Everything the storefront remembers between requests lives in the
//! `tower-sessions` record under one of the [`keys`].

use serde::{Deserialize, Serialize};

use solera_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub email: Email,
    pub full_name: String,
}

impl CurrentUser {
    /// First word of the full name, for greetings.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.full_name
            .split_whitespace()
            .next()
            .unwrap_or(&self.full_name)
    }
}

/// Severity of a one-shot message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlashKind {
    Info,
    Error,
}

impl FlashKind {
    /// CSS modifier class.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Info => "flash--info",
            Self::Error => "flash--error",
        }
    }
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// Cart lines as `(variant, quantity)` pairs.
    pub const CART: &str = "cart";

    /// Coupon code the customer applied to the cart.
    pub const COUPON_CODE: &str = "coupon_code";

    /// Checkout wizard draft.
    pub const CHECKOUT: &str = "checkout";

    /// One-shot message for the next page.
    pub const FLASH: &str = "flash";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_first_name() {
        let user = CurrentUser {
            id: UserId::new(1),
            email: Email::parse("ayse@example.com").unwrap(),
            full_name: "Ayşe Nur Yılmaz".to_string(),
        };
        assert_eq!(user.first_name(), "Ayşe");
    }
}
