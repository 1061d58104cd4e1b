//! Typed store settings backed by the `shop.setting` key/value table.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use solera_core::CurrencyCode;
use solera_core::pricing::ShippingPolicy;

/// Store-wide settings editable from the admin panel.
///
/// Each field is persisted under its own key; keys missing from the table
/// take the default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSettings {
    pub store_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub currency: CurrencyCode,
    pub flat_shipping_rate: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
    pub announcement: Option<String>,
    pub low_stock_threshold: i32,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: "Solera".to_owned(),
            contact_email: "hello@solera.shop".to_owned(),
            contact_phone: String::new(),
            currency: CurrencyCode::TRY,
            flat_shipping_rate: Decimal::new(4990, 2),
            free_shipping_threshold: Some(Decimal::new(1500, 0)),
            announcement: None,
            low_stock_threshold: 3,
        }
    }
}

impl StoreSettings {
    /// Build settings from stored key/value pairs.
    ///
    /// Unknown keys are ignored and values that fail to decode fall back to
    /// the default for that field.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, JsonValue)>) -> Self {
        let Ok(JsonValue::Object(mut merged)) = serde_json::to_value(Self::default()) else {
            return Self::default();
        };
        let defaults = merged.clone();

        for (key, value) in pairs {
            if merged.contains_key(&key) {
                merged.insert(key, value);
            }
        }

        // Decode field by field so one bad value does not discard the rest.
        let mut settings = Self::default();
        for (key, value) in merged {
            let mut candidate = defaults.clone();
            candidate.insert(key.clone(), value);
            if let Ok(decoded) = serde_json::from_value::<Self>(JsonValue::Object(candidate)) {
                settings.take_field(&key, decoded);
            } else {
                tracing::warn!(key = %key, "ignoring undecodable store setting");
            }
        }
        settings
    }

    fn take_field(&mut self, key: &str, from: Self) {
        match key {
            "store_name" => self.store_name = from.store_name,
            "contact_email" => self.contact_email = from.contact_email,
            "contact_phone" => self.contact_phone = from.contact_phone,
            "currency" => self.currency = from.currency,
            "flat_shipping_rate" => self.flat_shipping_rate = from.flat_shipping_rate,
            "free_shipping_threshold" => {
                self.free_shipping_threshold = from.free_shipping_threshold;
            }
            "announcement" => self.announcement = from.announcement,
            "low_stock_threshold" => self.low_stock_threshold = from.low_stock_threshold,
            _ => {}
        }
    }

    /// Settings as key/value pairs for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_pairs(&self) -> Result<Vec<(String, JsonValue)>, serde_json::Error> {
        match serde_json::to_value(self)? {
            JsonValue::Object(map) => Ok(map.into_iter().collect()),
            _ => Ok(Vec::new()),
        }
    }

    #[must_use]
    pub const fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy {
            flat_rate: self.flat_shipping_rate,
            free_threshold: self.free_shipping_threshold,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_keys_use_defaults() {
        assert_eq!(StoreSettings::from_pairs([]), StoreSettings::default());
    }

    #[test]
    fn test_stored_values_override_defaults() {
        let settings = StoreSettings::from_pairs([
            ("store_name".to_string(), json!("Solera Bodrum")),
            ("flat_shipping_rate".to_string(), json!("59.90")),
            ("free_shipping_threshold".to_string(), json!(null)),
            ("unrelated".to_string(), json!(true)),
        ]);
        assert_eq!(settings.store_name, "Solera Bodrum");
        assert_eq!(settings.flat_shipping_rate, Decimal::new(5990, 2));
        assert_eq!(settings.free_shipping_threshold, None);
        assert_eq!(settings.currency, CurrencyCode::TRY);
    }

    #[test]
    fn test_bad_value_falls_back_per_field() {
        let settings = StoreSettings::from_pairs([
            ("currency".to_string(), json!("JPY")),
            ("store_name".to_string(), json!("Kept")),
        ]);
        assert_eq!(settings.currency, CurrencyCode::TRY);
        assert_eq!(settings.store_name, "Kept");
    }

    #[test]
    fn test_pairs_round_trip() {
        let mut original = StoreSettings::default();
        original.announcement = Some("Free shipping over ₺1500".to_string());
        let restored = StoreSettings::from_pairs(original.to_pairs().unwrap());
        assert_eq!(restored, original);
    }

    #[test]
    fn test_shipping_policy() {
        let policy = StoreSettings::default().shipping_policy();
        assert_eq!(policy.flat_rate, Decimal::new(4990, 2));
        assert_eq!(policy.free_threshold, Some(Decimal::new(1500, 0)));
    }
}
