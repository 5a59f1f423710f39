//! Term comparison strategies for ordering emitted records.
//!
//! The collation decides the primary order of the sorted record stream. The shuffle and
//! the merge stage must agree on it, which is why it is part of the job configuration.
//!
//! Every collation here is a total order in which `Equal` means "identical term". Records
//! for two distinct terms are therefore never merged into one group, even when the terms
//! differ only in case.
//!
//! # Available Collations
//!
//! - **Binary** (`"binary"`): byte-wise comparison of the UTF-8 encoding, the same order
//!   as `str::cmp`. This is the default.
//! - **Unicode Case Preserving** (`"unicode-case-preserving"`): case-folded primary order,
//!   with a character-by-character tie-break so case variants sort next to each other.

use std::cmp::Ordering;

use trindex_common::{Result, error::Error};

/// Trait defining comparison rules for terms.
pub trait Collation: Send + Sync + 'static {
    /// Returns the collation kind for identification and configuration.
    fn kind(&self) -> CollationKind;

    /// Returns the human-readable name of this collation strategy.
    fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// Compares two terms according to this collation's rules.
    ///
    /// Must be a total order, and must return `Equal` only for identical strings.
    fn compare(&self, left: &str, right: &str) -> Ordering;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CollationKind {
    /// Byte order of the UTF-8 encoding.
    Binary,
    /// Unicode collation that is case preserving.
    UnicodeCasePreserving,
}

impl TryFrom<&str> for CollationKind {
    type Error = trindex_common::error::Error;

    fn try_from(name: &str) -> Result<Self> {
        match name {
            "binary" => Ok(CollationKind::Binary),
            "unicode-case-preserving" => Ok(CollationKind::UnicodeCasePreserving),
            _ => Err(Error::invalid_config(
                "collation",
                format!("Unrecognized collation: {name}"),
            )),
        }
    }
}

impl CollationKind {
    /// Get the name of the collation kind as a static string.
    pub const fn name(&self) -> &'static str {
        match self {
            CollationKind::Binary => "binary",
            CollationKind::UnicodeCasePreserving => "unicode-case-preserving",
        }
    }
}

/// Creates a new collation instance based on the provided name.
pub fn create_collation(name: &str) -> Result<Box<dyn Collation>> {
    match CollationKind::try_from(name)? {
        CollationKind::Binary => Ok(Box::new(BinaryCollation)),
        CollationKind::UnicodeCasePreserving => Ok(Box::new(UnicodeCasePreservingCollation)),
    }
}

/// Byte-wise collation; agrees with the derived ordering of [`crate::record::TermKey`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCollation;

impl Collation for BinaryCollation {
    fn kind(&self) -> CollationKind {
        CollationKind::Binary
    }

    #[inline]
    fn compare(&self, left: &str, right: &str) -> Ordering {
        left.cmp(right)
    }
}

/// Unicode case-preserving collation: primary ordering by case-insensitive comparison,
/// ties broken character by character.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnicodeCasePreservingCollation;

impl Collation for UnicodeCasePreservingCollation {
    fn kind(&self) -> CollationKind {
        CollationKind::UnicodeCasePreserving
    }

    fn compare(&self, left: &str, right: &str) -> Ordering {
        compare_strings(left, right, |&l, &r| to_upper(l).cmp(&to_upper(r)))
            .then_with(|| compare_strings(left, right, char::cmp))
    }
}

/// Converts a character into its upper case variant, ignoring special casing characters
/// (https://www.unicode.org/Public/UCD/latest/ucd/SpecialCasing.txt).
///
/// A character that expands to several code points when upper-cased is returned as is.
/// 'ß' maps to 'ẞ' (capital Eszett).
fn to_upper(c: char) -> char {
    if c == 'ß' {
        'ẞ'
    } else if c.is_lowercase() {
        let mut uppercase_char = c.to_uppercase();
        match (uppercase_char.next(), uppercase_char.next()) {
            (Some(ch), None) => ch,
            _ => c,
        }
    } else {
        c
    }
}

/// Compares two strings character by character using `cmp`; a proper prefix sorts first.
fn compare_strings<P>(lhs: &str, rhs: &str, cmp: P) -> Ordering
where
    P: Fn(&char, &char) -> Ordering,
{
    let mut lhs = lhs.chars();
    let mut rhs = rhs.chars();
    loop {
        match (lhs.next(), rhs.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => match cmp(&l, &r) {
                Ordering::Equal => (),
                non_eq => return non_eq,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collation_kind_from_str() {
        assert_eq!(
            CollationKind::try_from("binary").unwrap(),
            CollationKind::Binary
        );
        assert_eq!(
            CollationKind::try_from("unicode-case-preserving").unwrap(),
            CollationKind::UnicodeCasePreserving
        );
        assert!(CollationKind::try_from("unicode-case-insensitive").is_err());
    }

    #[test]
    fn test_binary_collation() {
        let collation = create_collation("binary").unwrap();
        assert_eq!(collation.name(), "binary");
        assert_eq!(collation.compare("Zebra", "apple"), Ordering::Less);
        assert_eq!(collation.compare("apple", "apple"), Ordering::Equal);
        assert_eq!(collation.compare("app", "apple"), Ordering::Less);
    }

    #[test]
    fn test_unicode_case_preserving_collation() {
        let collation = UnicodeCasePreservingCollation;
        assert_eq!(collation.kind(), CollationKind::UnicodeCasePreserving);

        assert_eq!(collation.compare("abc", "abc"), Ordering::Equal);
        assert_eq!(collation.compare("abc", "ABC"), Ordering::Greater);
        assert_eq!(collation.compare("ABC", "abc"), Ordering::Less);
        assert_eq!(collation.compare("café", "CAFÉ"), Ordering::Greater);
        assert_eq!(collation.compare("Zebra", "apple"), Ordering::Greater);

        let mut terms = vec!["Abd", "abc", "aBc"];
        terms.sort_by(|a, b| collation.compare(a, b));
        assert_eq!(terms, vec!["aBc", "abc", "Abd"]);
    }

    #[test]
    fn test_equal_only_for_identical_terms() {
        let collations: Vec<Box<dyn Collation>> = vec![
            Box::new(BinaryCollation),
            Box::new(UnicodeCasePreservingCollation),
        ];
        let terms = ["ß", "ẞ", "straße", "STRASSE", "Straße", "", "a"];
        for collation in &collations {
            for l in terms {
                for r in terms {
                    assert_eq!(
                        collation.compare(l, r) == Ordering::Equal,
                        l == r,
                        "{} {l:?} {r:?}",
                        collation.name()
                    );
                }
            }
        }
    }

    #[test]
    fn test_to_upper() {
        assert_eq!(to_upper('a'), 'A');
        assert_eq!(to_upper('A'), 'A');
        assert_eq!(to_upper('1'), '1');
        assert_eq!(to_upper('ñ'), 'Ñ');
        assert_eq!(to_upper('ß'), 'ẞ');
        assert_eq!(to_upper('ẞ'), 'ẞ');
    }
}
