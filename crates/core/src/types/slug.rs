//! URL slug type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input is empty (or only separators).
    #[error("slug cannot be empty")]
    Empty,
    /// The input is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character outside `[a-z0-9-]` or a misplaced dash.
    #[error("slug may only contain lowercase letters, digits and single dashes")]
    InvalidChar,
}

/// A URL-safe identifier such as `kapadokya-deri-sandalet`.
///
/// ## Constraints
///
/// - Length: 1-120 characters
/// - Lowercase ASCII letters, digits and `-`
/// - No leading, trailing or doubled dashes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum length of a slug.
    pub const MAX_LENGTH: usize = 120;

    /// Parse an existing slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or not in slug form.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if s.starts_with('-') || s.ends_with('-') || s.contains("--") {
            return Err(SlugError::InvalidChar);
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SlugError::InvalidChar);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive a slug from a human title.
    ///
    /// Turkish letters are folded to their ASCII base letter; every other run
    /// of non-alphanumeric characters becomes a single dash.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if nothing alphanumeric remains and
    /// [`SlugError::TooLong`] if the result exceeds the maximum length.
    pub fn from_title(title: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(title.len());
        let mut pending_dash = false;

        for c in title.chars() {
            let folded = match c {
                'ç' | 'Ç' => 'c',
                'ğ' | 'Ğ' => 'g',
                'ı' | 'I' | 'İ' | 'i' => 'i',
                'ö' | 'Ö' => 'o',
                'ş' | 'Ş' => 's',
                'ü' | 'Ü' => 'u',
                other => other.to_ascii_lowercase(),
            };

            if folded.is_ascii_lowercase() || folded.is_ascii_digit() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push(folded);
            } else {
                pending_dash = true;
            }
        }

        if out.is_empty() {
            return Err(SlugError::Empty);
        }
        if out.len() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(out))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert!(Slug::parse("bodrum").is_ok());
        assert!(Slug::parse("bodrum-sandal-2").is_ok());
        assert!(Slug::parse("a").is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_forms() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(Slug::parse("Bodrum"), Err(SlugError::InvalidChar));
        assert_eq!(Slug::parse("-bodrum"), Err(SlugError::InvalidChar));
        assert_eq!(Slug::parse("bodrum-"), Err(SlugError::InvalidChar));
        assert_eq!(Slug::parse("bod--rum"), Err(SlugError::InvalidChar));
        assert_eq!(Slug::parse("bod rum"), Err(SlugError::InvalidChar));
        assert!(matches!(
            Slug::parse(&"a".repeat(121)),
            Err(SlugError::TooLong { max: 120 })
        ));
    }

    #[test]
    fn test_from_title_folds_turkish_letters() {
        let slug = Slug::from_title("Çeşme Örgülü Sandalet").unwrap();
        assert_eq!(slug.as_str(), "cesme-orgulu-sandalet");

        let slug = Slug::from_title("Ağva IŞIK Güneş").unwrap();
        assert_eq!(slug.as_str(), "agva-isik-gunes");
    }

    #[test]
    fn test_from_title_collapses_separators() {
        let slug = Slug::from_title("  Handmade -- Leather / Sandal!! ").unwrap();
        assert_eq!(slug.as_str(), "handmade-leather-sandal");
    }

    #[test]
    fn test_from_title_empty() {
        assert_eq!(Slug::from_title(" -- !! "), Err(SlugError::Empty));
    }

    #[test]
    fn test_from_title_result_parses() {
        let slug = Slug::from_title("Model 42 / Taba").unwrap();
        assert_eq!(Slug::parse(slug.as_str()).unwrap(), slug);
    }
}
