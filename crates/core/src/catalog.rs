//! Size/color matrix for a product's variants.
//!
//! Product pages render a color swatch row and a size grid. Sizes that are
//! out of stock for the selected color stay visible but disabled.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::types::VariantId;

/// The fields of a variant the matrix needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption {
    pub id: VariantId,
    pub size: String,
    pub color: String,
    pub stock: i32,
}

impl VariantOption {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Lookup structure over one product's variants.
#[derive(Debug, Clone, Default)]
pub struct VariantMatrix {
    variants: Vec<VariantOption>,
}

impl VariantMatrix {
    #[must_use]
    pub const fn new(variants: Vec<VariantOption>) -> Self {
        Self { variants }
    }

    #[must_use]
    pub fn variants(&self) -> &[VariantOption] {
        &self.variants
    }

    /// Distinct colors in the order they first appear.
    #[must_use]
    pub fn colors(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for v in &self.variants {
            if !out.contains(&v.color.as_str()) {
                out.push(&v.color);
            }
        }
        out
    }

    /// Distinct sizes, numeric sizes ascending before any non-numeric ones.
    #[must_use]
    pub fn sizes(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for v in &self.variants {
            if !out.contains(&v.size.as_str()) {
                out.push(&v.size);
            }
        }
        out.sort_by(|a, b| compare_sizes(a, b));
        out
    }

    /// Sizes with stock for `color`.
    #[must_use]
    pub fn sizes_in_stock(&self, color: &str) -> Vec<&str> {
        self.sizes()
            .into_iter()
            .filter(|size| self.find(color, size).is_some_and(VariantOption::in_stock))
            .collect()
    }

    #[must_use]
    pub fn find(&self, color: &str, size: &str) -> Option<&VariantOption> {
        self.variants
            .iter()
            .find(|v| v.color == color && v.size == size)
    }

    /// First in-stock variant, falling back to the first variant.
    #[must_use]
    pub fn default_selection(&self) -> Option<&VariantOption> {
        self.variants
            .iter()
            .find(|v| v.in_stock())
            .or_else(|| self.variants.first())
    }

    #[must_use]
    pub fn total_stock(&self) -> i64 {
        self.variants
            .iter()
            .map(|v| i64::from(v.stock.max(0)))
            .sum()
    }
}

/// Order sizes numerically where possible; non-numeric sizes sort after
/// every number, alphabetically.
#[must_use]
pub fn compare_sizes(a: &str, b: &str) -> Ordering {
    size_key(a).cmp(&size_key(b))
}

/// Sort key: parsed number when the size is numeric (`"38"`, `"38.5"`),
/// otherwise the raw string after every number.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn size_key(size: &str) -> (u8, u32, &str) {
    match size.trim().parse::<f32>() {
        Ok(n) if n.is_finite() && n >= 0.0 => (0, (n * 10.0).round() as u32, size),
        _ => (1, 0, size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: i32, color: &str, size: &str, stock: i32) -> VariantOption {
        VariantOption {
            id: VariantId::new(id),
            size: size.to_string(),
            color: color.to_string(),
            stock,
        }
    }

    fn matrix() -> VariantMatrix {
        VariantMatrix::new(vec![
            variant(1, "Taba", "40", 0),
            variant(2, "Taba", "38", 3),
            variant(3, "Siyah", "39", 2),
            variant(4, "Taba", "39", 1),
            variant(5, "Siyah", "40", 0),
            variant(6, "Taba", "36.5", 4),
        ])
    }

    #[test]
    fn test_colors_keep_first_seen_order() {
        assert_eq!(matrix().colors(), vec!["Taba", "Siyah"]);
    }

    #[test]
    fn test_sizes_sorted_numerically() {
        assert_eq!(matrix().sizes(), vec!["36.5", "38", "39", "40"]);
    }

    #[test]
    fn test_non_numeric_sizes_sort_last() {
        let m = VariantMatrix::new(vec![
            variant(1, "Natural", "L", 1),
            variant(2, "Natural", "41", 1),
            variant(3, "Natural", "M", 1),
        ]);
        assert_eq!(m.sizes(), vec!["41", "L", "M"]);
    }

    #[test]
    fn test_sizes_in_stock_for_color() {
        let m = matrix();
        assert_eq!(m.sizes_in_stock("Taba"), vec!["36.5", "38", "39"]);
        assert_eq!(m.sizes_in_stock("Siyah"), vec!["39"]);
        assert!(m.sizes_in_stock("Kırmızı").is_empty());
    }

    #[test]
    fn test_find_and_default() {
        let m = matrix();
        assert_eq!(m.find("Siyah", "39").map(|v| v.id), Some(VariantId::new(3)));
        assert!(m.find("Siyah", "38").is_none());
        assert_eq!(m.default_selection().map(|v| v.id), Some(VariantId::new(2)));
    }

    #[test]
    fn test_default_falls_back_when_sold_out() {
        let m = VariantMatrix::new(vec![variant(7, "Taba", "38", 0)]);
        assert_eq!(m.default_selection().map(|v| v.id), Some(VariantId::new(7)));
        assert_eq!(m.total_stock(), 0);
        assert!(VariantMatrix::default().default_selection().is_none());
    }

    #[test]
    fn test_total_stock() {
        assert_eq!(matrix().total_stock(), 10);
    }
}
