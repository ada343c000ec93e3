//! URL slugs for CMS entities.
//!
//! WordPress slugs are lowercase path segments. Non-ASCII slugs arrive
//! percent-decoded from the router, so any Unicode alphanumeric is allowed.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Slug`] or [`SlugPath`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input string is empty.
    #[error("slug cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("slug must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains a character slugs never contain.
    #[error("slug contains invalid character {0:?}")]
    InvalidChar(char),
}

/// A single URL path segment naming a CMS entity.
///
/// ## Examples
///
/// ```
/// use fernleaf_core::Slug;
///
/// assert_eq!(Slug::parse("Summer-Sale").unwrap().as_str(), "summer-sale");
/// assert!(Slug::parse("../etc").is_err());
/// assert!(Slug::parse("").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Maximum length WordPress allows for `post_name`.
    pub const MAX_LENGTH: usize = 200;

    /// Parse and normalize a slug.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, too long, or contains anything
    /// other than alphanumerics, `-` and `_`.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(SlugError::Empty);
        }

        if s.chars().count() > Self::MAX_LENGTH {
            return Err(SlugError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(SlugError::InvalidChar(bad));
        }

        Ok(Self(s.to_lowercase()))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
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

/// A non-empty sequence of slugs from a catch-all URL path.
///
/// Product and post lookups use the [`leaf`](Self::leaf); hierarchical
/// pages use the full [`uri`](Self::uri).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlugPath {
    segments: Vec<Slug>,
}

impl SlugPath {
    /// Parse a path like `"about/team"` or `"/about/team/"`.
    ///
    /// # Errors
    ///
    /// Returns `SlugError::Empty` for a path with no segments, or the first
    /// segment error encountered.
    pub fn parse(path: &str) -> Result<Self, SlugError> {
        let segments = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(Slug::parse)
            .collect::<Result<Vec<_>, _>>()?;

        if segments.is_empty() {
            return Err(SlugError::Empty);
        }

        Ok(Self { segments })
    }

    /// The last segment.
    #[must_use]
    pub fn leaf(&self) -> &Slug {
        // Construction guarantees at least one segment
        self.segments
            .last()
            .unwrap_or_else(|| unreachable!("SlugPath is never empty"))
    }

    /// All segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Slug] {
        &self.segments
    }

    /// Whether the path has more than one segment.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.segments.len() > 1
    }

    /// WordPress page URI form: `/parent/child/`.
    #[must_use]
    pub fn uri(&self) -> String {
        let mut uri = String::from("/");
        for segment in &self.segments {
            uri.push_str(segment.as_str());
            uri.push('/');
        }
        uri
    }
}

impl fmt::Display for SlugPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .segments
            .iter()
            .map(Slug::as_str)
            .collect::<Vec<_>>()
            .join("/");
        f.write_str(&joined)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lowercases() {
        assert_eq!(Slug::parse("Linen-Shirt").unwrap().as_str(), "linen-shirt");
    }

    #[test]
    fn test_parse_unicode() {
        assert_eq!(Slug::parse("café_au_lait").unwrap().as_str(), "café_au_lait");
    }

    #[test]
    fn test_parse_rejects_traversal_and_whitespace() {
        assert_eq!(Slug::parse(".."), Err(SlugError::InvalidChar('.')));
        assert_eq!(Slug::parse("a b"), Err(SlugError::InvalidChar(' ')));
        assert_eq!(Slug::parse("   "), Err(SlugError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(201);
        assert!(matches!(Slug::parse(&long), Err(SlugError::TooLong { .. })));
    }

    #[test]
    fn test_path_leaf_and_uri() {
        let path = SlugPath::parse("/About/team/").unwrap();
        assert_eq!(path.leaf().as_str(), "team");
        assert_eq!(path.uri(), "/about/team/");
        assert!(path.is_nested());
        assert_eq!(path.to_string(), "about/team");
    }

    #[test]
    fn test_path_single_segment() {
        let path = SlugPath::parse("shoes").unwrap();
        assert!(!path.is_nested());
        assert_eq!(path.uri(), "/shoes/");
    }

    #[test]
    fn test_path_empty() {
        assert_eq!(SlugPath::parse("//"), Err(SlugError::Empty));
        assert!(SlugPath::parse("a/../b").is_err());
    }
}
