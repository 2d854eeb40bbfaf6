//! Composite keys for joining catalog rows to image assets
//!
//! Provides [`CompositeKey`], an ordered tuple of normalized attribute
//! segments, and [`KeyBuilder`] which produces the two key shapes in use.

use crate::normalize::{canonical_number, normalize_name, NameFolding};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};

/// Delimiter between key segments in the string form
pub const KEY_DELIMITER: &str = "-";

/// Normalized join key
///
/// Two records describe the same product variant iff their keys are equal.
///
/// # Examples
/// - `["vodka gold", "70", "6"]` → `vodka gold-70-6`
/// - `["vodka gold", "70", "6", "40"]` → `vodka gold-70-6-40`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CompositeKey(Vec<String>);

/// Which attributes a key covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyShape {
    /// name, volume, box quantity
    ThreePart,
    /// name, volume, box quantity, percentage
    FourPart,
}

impl KeyShape {
    /// Number of segments in a key of this shape
    #[inline]
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::ThreePart => 3,
            Self::FourPart => 4,
        }
    }
}

impl CompositeKey {
    /// Get key segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the key has no segments
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shape of this key, if it has one of the known arities
    #[must_use]
    pub fn shape(&self) -> Option<KeyShape> {
        match self.0.len() {
            3 => Some(KeyShape::ThreePart),
            4 => Some(KeyShape::FourPart),
            _ => None,
        }
    }

    /// Drop the percentage segment of a four-part key
    #[must_use]
    pub fn without_percentage(&self) -> Self {
        match self.shape() {
            Some(KeyShape::FourPart) => Self(self.0[..3].to_vec()),
            _ => self.clone(),
        }
    }
}

impl Display for CompositeKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(KEY_DELIMITER))
    }
}

/// Builds composite keys under one name-folding rule
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyBuilder {
    folding: NameFolding,
}

impl KeyBuilder {
    /// Create builder with the given folding rule
    #[inline]
    #[must_use]
    pub const fn new(folding: NameFolding) -> Self {
        Self { folding }
    }

    /// Folding rule in effect
    #[inline]
    #[must_use]
    pub const fn folding(&self) -> NameFolding {
        self.folding
    }

    /// Normalize a raw product name
    #[inline]
    #[must_use]
    pub fn name(&self, raw: &str) -> String {
        normalize_name(raw, self.folding)
    }

    /// `(name, volume, box)` key
    #[must_use]
    pub fn three_part(&self, name: &str, volume: f64, box_quantity: u32) -> CompositeKey {
        CompositeKey(vec![
            self.name(name),
            canonical_number(volume),
            box_quantity.to_string(),
        ])
    }

    /// `(name, volume, box, percentage)` key
    #[must_use]
    pub fn four_part(
        &self,
        name: &str,
        volume: f64,
        box_quantity: u32,
        percentage: f64,
    ) -> CompositeKey {
        let mut key = self.three_part(name, volume, box_quantity);
        key.0.push(canonical_number(percentage));
        key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn three_part_display() {
        let key = KeyBuilder::default().three_part("Vodka  Gold", 70.0, 6);
        assert_eq!(key.to_string(), "vodka gold-70-6");
        assert_eq!(key.shape(), Some(KeyShape::ThreePart));
    }

    #[test]
    fn four_part_display() {
        let key = KeyBuilder::default().four_part("Rum X", 70.0, 6, 37.5);
        assert_eq!(key.to_string(), "rum x-70-6-37.5");
        assert_eq!(key.len(), KeyShape::FourPart.arity());
    }

    #[test]
    fn number_formatting_differences_collapse() {
        let keys = KeyBuilder::default();
        assert_eq!(
            keys.four_part("Gin", 70.0, 6, 40.0),
            keys.four_part("GIN", 70.000, 6, 40.0)
        );
    }

    #[test]
    fn folding_is_applied_to_the_name_segment() {
        let keys = KeyBuilder::new(NameFolding::Possessive);
        assert_eq!(
            keys.three_part("Ouzo's", 70.0, 12),
            keys.three_part("ouzo", 70.0, 12)
        );
        let exact = KeyBuilder::new(NameFolding::Exact);
        assert_ne!(
            exact.three_part("Ouzo's", 70.0, 12),
            exact.three_part("ouzo", 70.0, 12)
        );
    }

    #[test]
    fn without_percentage_truncates_four_part_only() {
        let keys = KeyBuilder::default();
        let four = keys.four_part("Gin", 70.0, 6, 40.0);
        assert_eq!(four.without_percentage(), keys.three_part("Gin", 70.0, 6));
        let three = keys.three_part("Gin", 70.0, 6);
        assert_eq!(three.without_percentage(), three);
    }

    proptest! {
        #[test]
        fn keys_are_deterministic(name in ".*", volume in 0.0f64..5000.0, qty in 0u32..1000) {
            let keys = KeyBuilder::new(NameFolding::Possessive);
            prop_assert_eq!(
                keys.three_part(&name, volume, qty),
                keys.three_part(&name, volume, qty)
            );
        }
    }
}
