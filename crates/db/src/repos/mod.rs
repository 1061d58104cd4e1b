//! Repository structs, one per aggregate.
//!
//! Each repository borrows the pool and issues runtime-checked queries via
//! `sqlx::query_as`, mapping rows straight into the types in [`crate::models`].

mod admin_users;
mod banners;
mod categories;
mod collections;
mod coupons;
mod faqs;
mod orders;
mod pages;
mod products;
mod settings;
mod users;

pub use admin_users::AdminUserRepository;
pub use banners::BannerRepository;
pub use categories::CategoryRepository;
pub use collections::CollectionRepository;
pub use coupons::{CouponRepository, normalize_code as normalize_coupon_code};
pub use faqs::FaqRepository;
pub use orders::OrderRepository;
pub use pages::PageRepository;
pub use products::ProductRepository;
pub use settings::SettingsRepository;
pub use users::UserRepository;

/// Escape `%`, `_` and `\` so user input matches literally inside `LIKE`.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `ILIKE` pattern matching `q` anywhere, or `None` for blank input.
pub(crate) fn contains_pattern(q: Option<&str>) -> Option<String> {
    q.map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| format!("%{}%", escape_like(q)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50% off_now\\"), "50\\% off\\_now\\\\");
        assert_eq!(escape_like("bodrum"), "bodrum");
    }

    #[test]
    fn test_contains_pattern() {
        assert_eq!(contains_pattern(None), None);
        assert_eq!(contains_pattern(Some("   ")), None);
        assert_eq!(contains_pattern(Some(" SL26 ")).as_deref(), Some("%SL26%"));
        assert_eq!(
            contains_pattern(Some("100%_kum")).as_deref(),
            Some("%100\\%\\_kum%")
        );
    }
}
