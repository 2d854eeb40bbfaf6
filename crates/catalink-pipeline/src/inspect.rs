//! Asset listing diagnostics
//!
//! Reports, for every file, what a grammar decodes from its name or why it
//! was rejected. Used by `catalink inspect-assets` to fix a directory
//! before the strict linker refuses it.

use catalink_model::{AssetAttributes, AssetGrammar, ImageAsset};
use serde::Serialize;

/// Result of decoding one file name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetInspection {
    /// File name as listed
    pub file_name: String,
    /// Decoded attributes, when the name is well-formed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<AssetAttributes>,
    /// Rejection reason otherwise
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AssetInspection {
    /// Check if the file name was accepted
    #[inline]
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.attributes.is_some()
    }
}

/// Decode every asset under `grammar`
#[must_use]
pub fn inspect_assets(
    assets: &[ImageAsset],
    grammar: AssetGrammar,
    extensions: &[String],
) -> Vec<AssetInspection> {
    assets
        .iter()
        .map(|asset| match asset.parse(grammar, extensions) {
            Ok(attributes) => AssetInspection {
                file_name: asset.file_name().to_string(),
                attributes: Some(attributes),
                error: None,
            },
            Err(reason) => AssetInspection {
                file_name: asset.file_name().to_string(),
                attributes: None,
                error: Some(reason.to_string()),
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_accepted_and_rejected_names() {
        let assets = [
            ImageAsset::named("Gin 70-6-40.png"),
            ImageAsset::named("Gin 70-6.40.png"),
        ];
        let report = inspect_assets(&assets, AssetGrammar::Strict, &["png".to_string()]);

        assert!(report[0].is_well_formed());
        assert_eq!(report[0].attributes.as_ref().map(|a| a.box_quantity), Some(6));
        assert!(!report[1].is_well_formed());
        assert!(report[1].error.as_deref().is_some_and(|e| e.contains("does not match")));
    }

    #[test]
    fn lenient_grammar_accepts_what_strict_rejects() {
        let assets = [ImageAsset::named("Gin 70-6.40.png")];
        let report = inspect_assets(&assets, AssetGrammar::Lenient, &["png".to_string()]);
        assert!(report[0].is_well_formed());
    }
}
