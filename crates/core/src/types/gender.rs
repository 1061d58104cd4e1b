//! Product gender line.
//!
//! Product URLs are namespaced by gender (`/shop/women/bodrum`), so a slug
//! only has to be unique within one gender.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned for an unknown gender segment.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown gender: {0}")]
pub struct GenderError(pub String);

/// The line a product is sold under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.gender", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Women,
    Men,
    Unisex,
}

impl Gender {
    /// All genders in navigation order.
    pub const ALL: [Self; 3] = [Self::Women, Self::Men, Self::Unisex];

    /// URL path segment.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Women => "women",
            Self::Men => "men",
            Self::Unisex => "unisex",
        }
    }

    /// Navigation label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Women => "Women",
            Self::Men => "Men",
            Self::Unisex => "Unisex",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Gender {
    type Err = GenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "women" => Ok(Self::Women),
            "men" => Ok(Self::Men),
            "unisex" => Ok(Self::Unisex),
            other => Err(GenderError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trips_path_segment() {
        for gender in Gender::ALL {
            assert_eq!(gender.as_str().parse::<Gender>(), Ok(gender));
        }
    }

    #[test]
    fn test_rejects_unknown() {
        assert_eq!(
            "kids".parse::<Gender>(),
            Err(GenderError("kids".to_string()))
        );
    }
}
