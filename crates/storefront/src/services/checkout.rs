//! Checkout draft persistence and address checks.

use tower_sessions::Session;

use solera_core::checkout::{CheckoutDraft, FieldError, ShippingAddress};

use crate::models::session_keys;
use crate::services::locations::Locations;

/// Load the draft; a missing or unreadable entry starts a fresh one.
pub async fn load_draft(session: &Session) -> CheckoutDraft {
    session
        .get::<CheckoutDraft>(session_keys::CHECKOUT)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the draft.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn save_draft(
    session: &Session,
    draft: &CheckoutDraft,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CHECKOUT, draft).await
}

/// Discard the draft after an order is placed.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn clear_draft(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CheckoutDraft>(session_keys::CHECKOUT)
        .await?;
    Ok(())
}

/// Validate an address, including that the city and district exist.
///
/// # Errors
///
/// Returns every failing field.
pub fn validate_address(
    address: &ShippingAddress,
    locations: &Locations,
) -> Result<(), Vec<FieldError>> {
    let mut errors = address.validate().err().unwrap_or_default();

    let has_error = |errors: &[FieldError], field: &str| errors.iter().any(|e| e.field == field);

    if !has_error(&errors, "city") && locations.city_by_name(&address.city).is_none() {
        errors.push(FieldError {
            field: "city",
            message: "we do not deliver to this city".to_string(),
        });
    } else if !has_error(&errors, "city")
        && !has_error(&errors, "district")
        && !locations.contains(&address.city, &address.district)
    {
        errors.push(FieldError {
            field: "district",
            message: "district does not belong to the selected city".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn address(city: &str, district: &str) -> ShippingAddress {
        ShippingAddress {
            city: city.to_string(),
            district: district.to_string(),
            address_line: "Neyzen Tevfik Cd. No:12".to_string(),
            postal_code: "48400".to_string(),
        }
    }

    #[test]
    fn test_known_pair_passes() {
        let locations = Locations::bundled().unwrap();
        assert!(validate_address(&address("Muğla", "Bodrum"), &locations).is_ok());
    }

    #[test]
    fn test_unknown_city_rejected() {
        let locations = Locations::bundled().unwrap();
        let errors = validate_address(&address("Atlantis", "Bodrum"), &locations).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "city");
    }

    #[test]
    fn test_mismatched_district_rejected() {
        let locations = Locations::bundled().unwrap();
        let errors = validate_address(&address("Ankara", "Bodrum"), &locations).unwrap_err();
        assert_eq!(errors[0].field, "district");
    }

    #[test]
    fn test_blank_fields_reported_once() {
        let locations = Locations::bundled().unwrap();
        let errors = validate_address(&address("", ""), &locations).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["city", "district"]);
    }
}
