//! Multi-step checkout draft.
//!
//! The storefront keeps a [`CheckoutDraft`] in the session while the customer
//! walks through contact, shipping and payment. A step can only be entered
//! once every step before it is complete.

use serde::{Deserialize, Serialize};

use crate::types::{Email, PaymentMethod};

/// Checkout wizard steps in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Contact,
    Shipping,
    Payment,
    Review,
}

impl CheckoutStep {
    pub const ALL: [Self; 4] = [Self::Contact, Self::Shipping, Self::Payment, Self::Review];

    /// URL path for the step.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Contact => "/checkout/contact",
            Self::Shipping => "/checkout/shipping",
            Self::Payment => "/checkout/payment",
            Self::Review => "/checkout/review",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Contact => "Contact",
            Self::Shipping => "Shipping",
            Self::Payment => "Payment",
            Self::Review => "Review",
        }
    }
}

/// A validation failure on one form field.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Customer contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ContactDetails {
    pub email: String,
    pub full_name: String,
    pub phone: String,
}

impl ContactDetails {
    pub const MAX_NAME_LENGTH: usize = 120;

    /// Validate the details, returning every failing field.
    ///
    /// # Errors
    ///
    /// Returns one [`FieldError`] per invalid field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        if let Err(e) = Email::parse(self.email.trim()) {
            errors.push(FieldError::new("email", e.to_string()));
        }

        let name = self.full_name.trim();
        if name.is_empty() {
            errors.push(FieldError::new("full_name", "name is required"));
        } else if name.chars().count() > Self::MAX_NAME_LENGTH {
            errors.push(FieldError::new(
                "full_name",
                format!("name must be at most {} characters", Self::MAX_NAME_LENGTH),
            ));
        }

        if normalize_phone(&self.phone).is_none() {
            errors.push(FieldError::new(
                "phone",
                "phone number must have 10 to 15 digits",
            ));
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Strip spaces, dashes, parentheses and a leading `+`, then require 10-15
/// digits.
#[must_use]
pub fn normalize_phone(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let valid = (10..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit());
    valid.then_some(digits)
}

/// Delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ShippingAddress {
    pub city: String,
    pub district: String,
    pub address_line: String,
    pub postal_code: String,
}

impl ShippingAddress {
    pub const MAX_ADDRESS_LENGTH: usize = 500;

    /// Validate the address, returning every failing field.
    ///
    /// # Errors
    ///
    /// Returns one [`FieldError`] per invalid field.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("city", &self.city),
            ("district", &self.district),
            ("address_line", &self.address_line),
        ] {
            if value.trim().is_empty() {
                errors.push(FieldError::new(field, "this field is required"));
            }
        }
        if self.address_line.chars().count() > Self::MAX_ADDRESS_LENGTH {
            errors.push(FieldError::new(
                "address_line",
                format!(
                    "address must be at most {} characters",
                    Self::MAX_ADDRESS_LENGTH
                ),
            ));
        }
        let postal = self.postal_code.trim();
        if !postal.is_empty() && !(postal.len() == 5 && postal.bytes().all(|b| b.is_ascii_digit()))
        {
            errors.push(FieldError::new("postal_code", "postal code must be 5 digits"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Checkout state carried across requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CheckoutDraft {
    pub contact: Option<ContactDetails>,
    pub shipping: Option<ShippingAddress>,
    pub payment_method: Option<PaymentMethod>,
    pub note: Option<String>,
}

impl CheckoutDraft {
    fn step_complete(&self, step: CheckoutStep) -> bool {
        match step {
            CheckoutStep::Contact => self.contact.as_ref().is_some_and(|c| c.validate().is_ok()),
            CheckoutStep::Shipping => self.shipping.as_ref().is_some_and(|s| s.validate().is_ok()),
            CheckoutStep::Payment => self.payment_method.is_some(),
            CheckoutStep::Review => self.is_complete(),
        }
    }

    /// First step that still needs input, or `Review` when everything is
    /// filled in.
    #[must_use]
    pub fn next_step(&self) -> CheckoutStep {
        [
            CheckoutStep::Contact,
            CheckoutStep::Shipping,
            CheckoutStep::Payment,
        ]
        .into_iter()
        .find(|step| !self.step_complete(*step))
        .unwrap_or(CheckoutStep::Review)
    }

    /// Whether every step before `step` is complete.
    #[must_use]
    pub fn can_enter(&self, step: CheckoutStep) -> bool {
        CheckoutStep::ALL
            .into_iter()
            .take_while(|s| *s < step)
            .all(|s| self.step_complete(s))
    }

    /// Whether the draft has everything needed to place an order.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.step_complete(CheckoutStep::Contact)
            && self.step_complete(CheckoutStep::Shipping)
            && self.step_complete(CheckoutStep::Payment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn contact() -> ContactDetails {
        ContactDetails {
            email: "ayse@example.com".to_string(),
            full_name: "Ayşe Yılmaz".to_string(),
            phone: "+90 (532) 123-45-67".to_string(),
        }
    }

    fn address() -> ShippingAddress {
        ShippingAddress {
            city: "İzmir".to_string(),
            district: "Karşıyaka".to_string(),
            address_line: "Atatürk Cd. No:12 D:3".to_string(),
            postal_code: "35540".to_string(),
        }
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(
            normalize_phone("+90 (532) 123-45-67").as_deref(),
            Some("905321234567")
        );
        assert_eq!(normalize_phone("0532 123 45 67").as_deref(), Some("05321234567"));
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("0532-abc-4567"), None);
        assert_eq!(normalize_phone(&"1".repeat(16)), None);
    }

    #[test]
    fn test_contact_validation_collects_all_errors() {
        let bad = ContactDetails {
            email: "not-an-email".to_string(),
            full_name: "   ".to_string(),
            phone: "123".to_string(),
        };
        let errors = bad.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["email", "full_name", "phone"]);
        assert!(contact().validate().is_ok());
    }

    #[test]
    fn test_contact_rejects_doubled_at() {
        let mut bad = contact();
        bad.email = "ayse@@example.com".to_string();
        let fields: Vec<_> = bad.validate().unwrap_err().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["email"]);
    }

    #[test]
    fn test_address_validation() {
        assert!(address().validate().is_ok());

        let mut bad = address();
        bad.district = String::new();
        bad.postal_code = "35A".to_string();
        let errors = bad.validate().unwrap_err();
        assert_eq!(errors.len(), 2);

        let mut long = address();
        long.address_line = "x".repeat(501);
        assert!(long.validate().is_err());

        let mut no_postal = address();
        no_postal.postal_code = String::new();
        assert!(no_postal.validate().is_ok());
    }

    #[test]
    fn test_next_step_walks_forward() {
        let mut draft = CheckoutDraft::default();
        assert_eq!(draft.next_step(), CheckoutStep::Contact);

        draft.contact = Some(contact());
        assert_eq!(draft.next_step(), CheckoutStep::Shipping);

        draft.shipping = Some(address());
        assert_eq!(draft.next_step(), CheckoutStep::Payment);

        draft.payment_method = Some(PaymentMethod::CashOnDelivery);
        assert_eq!(draft.next_step(), CheckoutStep::Review);
        assert!(draft.is_complete());
    }

    #[test]
    fn test_cannot_skip_ahead() {
        let mut draft = CheckoutDraft::default();
        assert!(draft.can_enter(CheckoutStep::Contact));
        assert!(!draft.can_enter(CheckoutStep::Shipping));
        assert!(!draft.can_enter(CheckoutStep::Review));

        draft.contact = Some(contact());
        draft.payment_method = Some(PaymentMethod::Card);
        assert!(draft.can_enter(CheckoutStep::Shipping));
        assert!(!draft.can_enter(CheckoutStep::Payment));
        assert!(!draft.is_complete());
    }

    #[test]
    fn test_invalid_stored_contact_is_incomplete() {
        let mut stale = contact();
        stale.phone = "1".to_string();
        let draft = CheckoutDraft {
            contact: Some(stale),
            ..CheckoutDraft::default()
        };
        assert_eq!(draft.next_step(), CheckoutStep::Contact);
    }
}
