//! Type-safe money representation using decimal arithmetic.
//!
//! All amounts are held in the currency's standard unit (lira, dollars) as a
//! [`Decimal`]; rounding to cents happens only at the edges where a value is
//! shown to a customer or persisted on an order.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Round an amount to two decimal places, midpoint away from zero.
#[must_use]
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// An amount with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: CurrencyCode,
}

impl Money {
    /// Create a new amount.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Zero in the given currency.
    #[must_use]
    pub const fn zero(currency: CurrencyCode) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }

    /// Format for display, e.g. `₺1249.90`.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency.symbol(), round_to_cents(self.amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes accepted by the shop.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    TRY,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Every supported currency, for settings forms.
    pub const ALL: [Self; 4] = [Self::TRY, Self::USD, Self::EUR, Self::GBP];

    /// Display symbol placed before the amount.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::TRY => "₺",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TRY => "TRY",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRY" => Ok(Self::TRY),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to_cents_midpoint_away_from_zero() {
        assert_eq!(round_to_cents(Decimal::new(12345, 3)), Decimal::new(1235, 2));
        assert_eq!(round_to_cents(Decimal::new(12344, 3)), Decimal::new(1234, 2));
    }

    #[test]
    fn test_display_pads_to_two_decimals() {
        let money = Money::new(Decimal::new(1250, 0), CurrencyCode::TRY);
        assert_eq!(money.display(), "₺1250.00");

        let money = Money::new(Decimal::new(19999, 3), CurrencyCode::USD);
        assert_eq!(money.to_string(), "$20.00");
    }

    #[test]
    fn test_zero() {
        assert_eq!(Money::zero(CurrencyCode::EUR).display(), "€0.00");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("try".parse::<CurrencyCode>().unwrap(), CurrencyCode::TRY);
        assert_eq!(" GBP ".parse::<CurrencyCode>().unwrap(), CurrencyCode::GBP);
        assert!("JPY".parse::<CurrencyCode>().is_err());
    }
}
