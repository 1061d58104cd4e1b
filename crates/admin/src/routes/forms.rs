//! Parsing helpers for admin HTML forms.
//!
//! Admin forms deserialize every field as text so a typo never turns into
//! an extractor rejection. Handlers convert the text into repository inputs
//! here, collecting one [`FieldError`] per bad field.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use solera_core::Slug;
use solera_core::checkout::FieldError;

/// `<input type="datetime-local">` value format.
const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Collects field errors while a form is converted.
#[derive(Debug, Default)]
pub struct FormErrors(Vec<FieldError>);

impl FormErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// `Ok(value)` when nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns the recorded errors.
    pub fn finish<T>(self, value: T) -> Result<T, Vec<FieldError>> {
        if self.0.is_empty() {
            Ok(value)
        } else {
            Err(self.0)
        }
    }

    /// Trimmed text that must not be empty.
    pub fn required(&mut self, field: &'static str, raw: &str) -> String {
        let value = raw.trim();
        if value.is_empty() {
            self.add(field, "is required");
        }
        value.to_string()
    }

    /// Non-negative amount. A comma is accepted as the decimal separator.
    pub fn decimal(&mut self, field: &'static str, raw: &str) -> Decimal {
        self.optional_decimal(field, raw).unwrap_or_else(|| {
            if raw.trim().is_empty() {
                self.add(field, "is required");
            }
            Decimal::ZERO
        })
    }

    /// Non-negative amount, `None` when left blank.
    pub fn optional_decimal(&mut self, field: &'static str, raw: &str) -> Option<Decimal> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        match value.replace(',', ".").parse::<Decimal>() {
            Ok(amount) if amount.is_sign_negative() => {
                self.add(field, "cannot be negative");
                None
            }
            Ok(amount) => Some(amount.round_dp(2)),
            Err(_) => {
                self.add(field, "must be a number");
                None
            }
        }
    }

    /// Whole number, `default` when left blank.
    pub fn integer(&mut self, field: &'static str, raw: &str, default: i32) -> i32 {
        self.optional_integer(field, raw).unwrap_or(default)
    }

    /// Whole number, `None` when left blank.
    pub fn optional_integer(&mut self, field: &'static str, raw: &str) -> Option<i32> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        value.parse::<i32>().map_or_else(
            |_| {
                self.add(field, "must be a whole number");
                None
            },
            Some,
        )
    }

    /// Timestamp from a `datetime-local` input, read as UTC.
    pub fn optional_datetime(&mut self, field: &'static str, raw: &str) -> Option<DateTime<Utc>> {
        let value = raw.trim();
        if value.is_empty() {
            return None;
        }
        NaiveDateTime::parse_from_str(value, DATETIME_LOCAL_FORMAT).map_or_else(
            |_| {
                self.add(field, "must be a date and time");
                None
            },
            |naive| Some(naive.and_utc()),
        )
    }

    /// The given slug, or one derived from `title` when left blank.
    pub fn slug(&mut self, field: &'static str, raw: &str, title: &str) -> String {
        let value = raw.trim();
        let parsed = if value.is_empty() {
            Slug::from_title(title)
        } else {
            Slug::parse(value)
        };
        match parsed {
            Ok(slug) => slug.into_inner(),
            Err(e) => {
                self.add(field, e.to_string());
                String::new()
            }
        }
    }

    /// Reject a date range that ends before it starts.
    pub fn date_range(
        &mut self,
        field: &'static str,
        starts_at: Option<DateTime<Utc>>,
        ends_at: Option<DateTime<Utc>>,
    ) {
        if let (Some(start), Some(end)) = (starts_at, ends_at)
            && end < start
        {
            self.add(field, "must be after the start");
        }
    }
}

/// Trimmed text, `None` when blank.
#[must_use]
pub fn optional_text(raw: &str) -> Option<String> {
    let value = raw.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// HTML checkboxes send a value only when ticked.
#[must_use]
pub const fn checkbox(value: Option<&String>) -> bool {
    value.is_some()
}

/// One line per error, for the notice banner.
#[must_use]
pub fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field.replace('_', " "), e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Text shown in a form input for an optional amount.
#[must_use]
pub fn amount_text(amount: Option<Decimal>) -> String {
    amount.map(|a| a.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_accepts_comma() {
        let mut errors = FormErrors::new();
        assert_eq!(errors.decimal("price", " 1249,90 "), Decimal::new(124_990, 2));
        assert!(errors.finish(()).is_ok());
    }

    #[test]
    fn test_decimal_rejects_negative_and_text() {
        let mut errors = FormErrors::new();
        errors.decimal("price", "-5");
        errors.optional_decimal("compare_at_price", "cheap");
        errors.decimal("shipping", "");
        let fields: Vec<_> = errors
            .finish(())
            .err()
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["price", "compare_at_price", "shipping"]);
    }

    #[test]
    fn test_optional_values_blank_is_none() {
        let mut errors = FormErrors::new();
        assert_eq!(errors.optional_decimal("x", "  "), None);
        assert_eq!(errors.optional_integer("y", ""), None);
        assert_eq!(errors.optional_datetime("z", ""), None);
        assert_eq!(errors.integer("w", "", 7), 7);
        assert!(errors.finish(()).is_ok());
        assert_eq!(optional_text("  "), None);
        assert_eq!(optional_text(" Deri "), Some("Deri".to_string()));
    }

    #[test]
    fn test_datetime_local() {
        let mut errors = FormErrors::new();
        let at = errors.optional_datetime("starts_at", "2026-06-01T09:30");
        assert_eq!(at.map(|at| at.to_rfc3339()).as_deref(), Some("2026-06-01T09:30:00+00:00"));
        errors.optional_datetime("ends_at", "yarın");
        assert!(errors.finish(()).is_err());
    }

    #[test]
    fn test_slug_derived_from_title_when_blank() {
        let mut errors = FormErrors::new();
        assert_eq!(errors.slug("slug", "", "Yaz Koleksiyonu"), "yaz-koleksiyonu");
        assert_eq!(errors.slug("slug", "bodrum", "ignored"), "bodrum");
        assert!(errors.finish(()).is_ok());

        let mut errors = FormErrors::new();
        errors.slug("slug", "Not A Slug", "x");
        assert!(errors.finish(()).is_err());
    }

    #[test]
    fn test_date_range() {
        let mut errors = FormErrors::new();
        let start = errors.optional_datetime("starts_at", "2026-06-02T00:00");
        let end = errors.optional_datetime("ends_at", "2026-06-01T00:00");
        errors.date_range("ends_at", start, end);
        assert!(errors.finish(()).is_err());
    }

    #[test]
    fn test_describe() {
        let errors = vec![FieldError {
            field: "base_price",
            message: "must be a number".to_string(),
        }];
        assert_eq!(describe(&errors), "base price: must be a number");
    }
}
