//! Custom Askama template filters and display helpers.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use solera_core::{CurrencyCode, Money};

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(Utc::now().year())
}

/// Returns the content hash for admin.css, computed at build time.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Format an amount for display, e.g. `₺1249.90`.
#[must_use]
pub fn price(amount: Decimal, currency: CurrencyCode) -> String {
    Money::new(amount, currency).display()
}

/// Format an amount stored with its currency code as text.
#[must_use]
pub fn price_in(amount: Decimal, currency: &str) -> String {
    price(amount, currency.parse().unwrap_or_default())
}

/// Format a timestamp as a short date, e.g. `09.05.2026`.
#[must_use]
pub fn date(at: DateTime<Utc>) -> String {
    at.format("%d.%m.%Y").to_string()
}

/// Format a timestamp with time of day, e.g. `09.05.2026 14:05`.
#[must_use]
pub fn datetime(at: DateTime<Utc>) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

/// Value for an `<input type="datetime-local">`, e.g. `2026-05-09T14:05`.
#[must_use]
pub fn datetime_local(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%Y-%m-%dT%H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_price_in_falls_back_to_default_currency() {
        assert_eq!(price_in(Decimal::new(4990, 2), "EUR"), "€49.90");
        assert_eq!(price_in(Decimal::new(4990, 2), "???"), "₺49.90");
    }

    #[test]
    fn test_datetime_local() {
        let at = Utc.with_ymd_and_hms(2026, 5, 9, 14, 5, 0).single();
        assert_eq!(datetime_local(at), "2026-05-09T14:05");
        assert_eq!(datetime_local(None), "");
    }
}
