//! Text and number canonicalization
//!
//! Every comparison between a catalog row and an image asset goes through
//! these functions. They are pure: the same input always yields the same
//! output, and nothing here touches the filesystem.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static POSSESSIVE_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"['’]s\b").expect("possessive suffix pattern is valid"));

/// How product names are folded before comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameFolding {
    /// Plain normalization only
    #[default]
    Exact,
    /// Also drop a possessive `'s` and a trailing standalone `s` token
    Possessive,
}

/// Errors raised while canonicalizing a numeric field
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NumericParseError {
    /// Nothing to parse
    #[error("value is empty")]
    Empty,

    /// Not a number in either decimal notation
    #[error("'{raw}' is not a number")]
    Invalid { raw: String },

    /// Parsed, but infinite or NaN
    #[error("'{raw}' is not a finite number")]
    NotFinite { raw: String },

    /// Expected a non-negative whole number
    #[error("'{raw}' is not a whole, non-negative count")]
    NotWholeNumber { raw: String },
}

/// Lowercase, keep `[a-z0-9 ]`, collapse whitespace, trim.
#[must_use]
pub fn normalize_text(raw: &str) -> String {
    let kept: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == ' ')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a product name under the given folding rule
///
/// # Examples
/// ```
/// use catalink_model::{normalize_name, NameFolding};
///
/// assert_eq!(
///     normalize_name("Ouzo's", NameFolding::Possessive),
///     normalize_name("ouzo", NameFolding::Possessive),
/// );
/// ```
#[must_use]
pub fn normalize_name(raw: &str, folding: NameFolding) -> String {
    match folding {
        NameFolding::Exact => normalize_text(raw),
        NameFolding::Possessive => {
            let lowered = raw.to_lowercase();
            let without_possessive = POSSESSIVE_SUFFIX.replace_all(&lowered, "");
            let normalized = normalize_text(&without_possessive);

            let mut tokens: Vec<&str> = normalized.split(' ').collect();
            if tokens.len() > 1 && tokens.last() == Some(&"s") {
                tokens.pop();
            }
            tokens.join(" ")
        }
    }
}

/// Parse a number written with either `.` or `,` as decimal separator
///
/// # Errors
/// Returns [`NumericParseError`] for empty input, garbage, or a
/// non-finite result.
pub fn parse_numeric(raw: &str) -> Result<f64, NumericParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NumericParseError::Empty);
    }

    let value: f64 = trimmed
        .replace(',', ".")
        .parse()
        .map_err(|_| NumericParseError::Invalid {
            raw: trimmed.to_string(),
        })?;

    if !value.is_finite() {
        return Err(NumericParseError::NotFinite {
            raw: trimmed.to_string(),
        });
    }
    Ok(value)
}

/// Parse a volume, discarding a trailing unit suffix (`70cl`, `0,7 l`)
///
/// No unit conversion happens: `70cl` and `70` compare equal, `0.7l`
/// does not.
///
/// # Errors
/// Same as [`parse_numeric`], reported against the full input.
pub fn parse_volume(raw: &str) -> Result<f64, NumericParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NumericParseError::Empty);
    }

    let number = trimmed
        .trim_end_matches(char::is_alphabetic)
        .trim_end();
    if number.is_empty() {
        return Err(NumericParseError::Invalid {
            raw: trimmed.to_string(),
        });
    }

    parse_numeric(number).map_err(|err| match err {
        NumericParseError::NotFinite { .. } => NumericParseError::NotFinite {
            raw: trimmed.to_string(),
        },
        _ => NumericParseError::Invalid {
            raw: trimmed.to_string(),
        },
    })
}

/// Parse a box quantity: a whole, non-negative number that fits `u32`
///
/// # Errors
/// [`NumericParseError::NotWholeNumber`] for fractions, negatives and
/// overflow, otherwise as [`parse_numeric`].
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_box_quantity(raw: &str) -> Result<u32, NumericParseError> {
    let value = parse_numeric(raw)?;
    if value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return Err(NumericParseError::NotWholeNumber {
            raw: raw.trim().to_string(),
        });
    }
    Ok(value as u32)
}

/// Shortest decimal form of a finite number (`70.0` → `"70"`)
#[must_use]
pub fn canonical_number(value: f64) -> String {
    if value == 0.0 {
        // also folds -0.0
        return "0".to_string();
    }
    format!("{value}")
}

/// Fixed two-decimal form (`0.7` → `"0.70"`)
#[must_use]
pub fn fixed_two_decimals(value: f64) -> String {
    format!("{value:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn text_is_lowercased_stripped_and_collapsed() {
        assert_eq!(normalize_text("  Vodka   GOLD\t"), "vodka gold");
        assert_eq!(normalize_text("Rum-X (Dark)!"), "rumx dark");
        assert_eq!(normalize_text("Crème Brûlée 12"), "crme brle 12");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn possessive_folding() {
        let ouzo = normalize_name("ouzo", NameFolding::Possessive);
        assert_eq!(normalize_name("Ouzo's", NameFolding::Possessive), ouzo);
        assert_eq!(normalize_name("OUZO’S", NameFolding::Possessive), ouzo);
        assert_eq!(normalize_name("Ouzo s", NameFolding::Possessive), ouzo);
        assert_eq!(
            normalize_name("Grant's Family Reserve", NameFolding::Possessive),
            "grant family reserve"
        );
    }

    #[test]
    fn lone_s_is_kept_when_it_is_the_whole_name() {
        assert_eq!(normalize_name("S", NameFolding::Possessive), "s");
    }

    #[test]
    fn exact_folding_keeps_possessive_letters() {
        assert_eq!(normalize_name("Ouzo's", NameFolding::Exact), "ouzos");
    }

    #[test]
    fn numeric_accepts_both_separators() {
        assert_eq!(parse_numeric("37.5"), Ok(37.5));
        assert_eq!(parse_numeric("37,5"), Ok(37.5));
        assert_eq!(parse_numeric(" 40 "), Ok(40.0));
    }

    #[test]
    fn numeric_rejections() {
        assert_eq!(parse_numeric("  "), Err(NumericParseError::Empty));
        assert!(matches!(
            parse_numeric("forty"),
            Err(NumericParseError::Invalid { .. })
        ));
        assert!(matches!(
            parse_numeric("inf"),
            Err(NumericParseError::NotFinite { .. })
        ));
        assert!(matches!(
            parse_numeric("NaN"),
            Err(NumericParseError::NotFinite { .. })
        ));
    }

    #[test]
    fn volume_drops_unit_suffix() {
        assert_eq!(parse_volume("70cl"), Ok(70.0));
        assert_eq!(parse_volume("0,7 l"), Ok(0.7));
        assert_eq!(parse_volume("750 ml"), Ok(750.0));
        assert_eq!(parse_volume("1.5"), Ok(1.5));
        assert!(matches!(
            parse_volume("cl"),
            Err(NumericParseError::Invalid { raw }) if raw == "cl"
        ));
    }

    #[test]
    fn box_quantity_must_be_whole() {
        assert_eq!(parse_box_quantity("6"), Ok(6));
        assert_eq!(parse_box_quantity("12,0"), Ok(12));
        assert!(matches!(
            parse_box_quantity("6.5"),
            Err(NumericParseError::NotWholeNumber { .. })
        ));
        assert!(matches!(
            parse_box_quantity("-1"),
            Err(NumericParseError::NotWholeNumber { .. })
        ));
    }

    #[test]
    fn canonical_forms() {
        assert_eq!(canonical_number(70.0), "70");
        assert_eq!(canonical_number(37.5), "37.5");
        assert_eq!(canonical_number(-0.0), "0");
        assert_eq!(fixed_two_decimals(0.7), "0.70");
        assert_eq!(fixed_two_decimals(70.0), "70.00");
    }

    proptest! {
        #[test]
        fn normalization_is_deterministic(raw in ".*") {
            prop_assert_eq!(normalize_text(&raw), normalize_text(&raw));
            prop_assert_eq!(
                normalize_name(&raw, NameFolding::Possessive),
                normalize_name(&raw, NameFolding::Possessive)
            );
        }

        #[test]
        fn normalization_is_idempotent(raw in ".*") {
            let once = normalize_text(&raw);
            prop_assert_eq!(normalize_text(&once), once.clone());
        }

        #[test]
        fn normalized_text_uses_only_the_allowed_alphabet(raw in ".*") {
            let normalized = normalize_text(&raw);
            prop_assert!(normalized
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' '));
            prop_assert!(!normalized.starts_with(' '));
            prop_assert!(!normalized.ends_with(' '));
            prop_assert!(!normalized.contains("  "));
        }

        #[test]
        fn canonical_number_round_trips(value in -1.0e9f64..1.0e9) {
            let text = canonical_number(value);
            let parsed = parse_numeric(&text).unwrap();
            prop_assert!(parsed == value || (parsed == 0.0 && value == 0.0));
        }
    }
}
