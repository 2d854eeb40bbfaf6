//! Catalink Model
//!
//! Shared vocabulary for reconciling a product catalog with its image assets.
//!
//! # Core Concepts
//!
//! - [`CatalogTable`] / [`CatalogRow`]: the tabular catalog, column order preserved
//! - [`ImageAsset`]: one image file whose name encodes product attributes
//! - [`CompositeKey`]: normalized `name-volume-box[-percentage]` join key
//! - [`KeyBuilder`]: builds keys under a [`NameFolding`] rule
//! - [`Checksum`]: Blake3 digest of a serialized table
//!
//! # Example
//!
//! ```rust
//! use catalink_model::{AssetGrammar, ImageAsset, KeyBuilder};
//!
//! let asset = ImageAsset::named("Vodka Gold 70-6-40.png");
//! let attrs = asset.parse(AssetGrammar::Strict, &["png".to_string()]).unwrap();
//!
//! let key = KeyBuilder::default().four_part(&attrs.name, attrs.volume, attrs.box_quantity, attrs.percentage);
//! assert_eq!(key.to_string(), "vodka gold-70-6-40");
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod asset;
mod checksum;
mod key;
mod normalize;
mod row;

pub use asset::{AssetAttributes, AssetGrammar, AssetNameError, ImageAsset};
pub use checksum::Checksum;
pub use key::{CompositeKey, KeyBuilder, KeyShape, KEY_DELIMITER};
pub use normalize::{
    canonical_number, fixed_two_decimals, normalize_name, normalize_text, parse_box_quantity,
    parse_numeric, parse_volume, NameFolding, NumericParseError,
};
pub use row::{CatalogRow, CatalogTable, ColumnNames};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn row_and_asset_meet_on_the_same_key() {
        let columns = ColumnNames::default();
        let row = CatalogRow::from_pairs(
            1,
            [("name", "Vodka Gold"), ("volume", "70cl"), ("quantityInBox", "6")],
        );
        let keys = KeyBuilder::default();

        let row_key = keys.three_part(
            row.present(&columns.name).unwrap(),
            parse_volume(row.present(&columns.volume).unwrap()).unwrap(),
            parse_box_quantity(row.present(&columns.quantity_in_box).unwrap()).unwrap(),
        );

        let attrs = ImageAsset::named("Vodka Gold 70-6-40.png")
            .parse(AssetGrammar::Lenient, &["png".to_string()])
            .unwrap();
        let asset_key = keys
            .four_part(&attrs.name, attrs.volume, attrs.box_quantity, attrs.percentage)
            .without_percentage();

        assert_eq!(row_key, asset_key);
    }
}
