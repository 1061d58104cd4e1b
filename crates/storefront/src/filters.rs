//! Custom Askama template filters and view formatting helpers.

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

/// Returns the content hash for main.css, computed at build time.
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

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_price() {
        assert_eq!(price(Decimal::new(124_990, 2), CurrencyCode::TRY), "₺1249.90");
        assert_eq!(price(Decimal::new(45, 0), CurrencyCode::EUR), "€45.00");
    }

    #[test]
    fn test_dates() {
        let at = Utc.with_ymd_and_hms(2026, 5, 9, 14, 5, 0).single();
        let Some(at) = at else {
            panic!("valid timestamp");
        };
        assert_eq!(date(at), "09.05.2026");
        assert_eq!(datetime(at), "09.05.2026 14:05");
    }
}
