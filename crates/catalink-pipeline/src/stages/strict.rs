//! Strict validator and linker
//!
//! The final gate before a catalog is published. Every asset must follow
//! the strict filename grammar, every four-part key must belong to exactly
//! one asset, and every row must link to an asset no other row claims.
//! Any anomaly aborts the run.

use super::{read_attributes, required, FieldError, Stage, StageKind, StageOutcome};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use catalink_model::{
    parse_numeric, AssetGrammar, CatalogTable, ColumnNames, CompositeKey, ImageAsset, KeyBuilder,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Four-part key → asset, one-to-one
#[derive(Debug, Clone, Default)]
pub struct StrictIndex {
    assets: HashMap<CompositeKey, ImageAsset>,
}

impl StrictIndex {
    /// Asset owning a key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &CompositeKey) -> Option<&ImageAsset> {
        self.assets.get(key)
    }

    /// Number of indexed assets
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Check if the index is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Links every row to exactly one asset
#[derive(Debug, Clone)]
pub struct StrictLinker {
    columns: ColumnNames,
    keys: KeyBuilder,
    extensions: Vec<String>,
    require_all_assets_linked: bool,
}

impl StrictLinker {
    /// Create linker from configuration
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            keys: KeyBuilder::new(config.strict.folding),
            extensions: config.strict.extensions.clone(),
            require_all_assets_linked: config.strict.require_all_assets_linked,
        }
    }
}

/// `true` when a declared `imageFile` refers to `file_name`
fn refers_to(declared: &str, file_name: &str) -> bool {
    declared == file_name || declared.rsplit(['/', '\\']).next() == Some(file_name)
}

impl Stage for StrictLinker {
    type Index = StrictIndex;

    fn kind(&self) -> StageKind {
        StageKind::Strict
    }

    fn build_index(&self, assets: &[ImageAsset]) -> Result<StrictIndex, PipelineError> {
        let mut index = StrictIndex::default();

        for asset in assets {
            let attrs = asset
                .parse(AssetGrammar::Strict, &self.extensions)
                .map_err(|reason| PipelineError::MalformedAsset {
                    file: asset.file_name().to_string(),
                    reason,
                })?;
            let key = self.keys.four_part(
                &attrs.name,
                attrs.volume,
                attrs.box_quantity,
                attrs.percentage,
            );

            match index.assets.entry(key) {
                Entry::Occupied(slot) => {
                    return Err(PipelineError::DuplicateAsset {
                        key: slot.key().to_string(),
                        first: slot.get().file_name().to_string(),
                        second: asset.file_name().to_string(),
                    });
                }
                Entry::Vacant(slot) => {
                    slot.insert(asset.clone());
                }
            }
        }

        Ok(index)
    }

    fn apply(
        &self,
        index: &StrictIndex,
        table: &mut CatalogTable,
    ) -> Result<StageOutcome, PipelineError> {
        let mut outcome = StageOutcome::new(self.kind());
        outcome.assets_indexed = index.len();

        let column = self.columns.image_file.clone();
        table.ensure_column(&column);

        // asset file name → claiming row
        let mut claims: HashMap<&str, usize> = HashMap::with_capacity(index.len());

        for row in table.rows_mut() {
            outcome.rows += 1;
            let attrs =
                read_attributes(row, &self.columns).map_err(|e| e.strict(row, &self.columns))?;
            let percentage = required(row, &self.columns.percentage)
                .and_then(|raw| {
                    parse_numeric(raw)
                        .map_err(|e| FieldError::Numeric(self.columns.percentage.clone(), e))
                })
                .map_err(|e| e.strict(row, &self.columns))?;

            let key = self.keys.four_part(
                &attrs.name,
                attrs.volume,
                attrs.box_quantity,
                percentage,
            );
            let Some(asset) = index.get(&key) else {
                return Err(PipelineError::UnlinkedRow {
                    row: row.position(),
                    product: row.identifier(&self.columns),
                    key: key.to_string(),
                });
            };

            if let Some(&first_row) = claims.get(asset.file_name()) {
                return Err(PipelineError::DuplicateClaim {
                    asset: asset.file_name().to_string(),
                    first_row,
                    second_row: row.position(),
                });
            }
            claims.insert(asset.file_name(), row.position());

            match row.present(&column) {
                Some(declared) if refers_to(declared, asset.file_name()) => {
                    outcome.confirmed += 1;
                }
                Some(declared) => {
                    return Err(PipelineError::ImageConflict {
                        row: row.position(),
                        product: row.identifier(&self.columns),
                        declared: declared.to_string(),
                        linked: asset.file_name().to_string(),
                    });
                }
                None => {
                    row.set(&column, asset.file_name());
                    outcome.filled += 1;
                }
            }
        }

        if self.require_all_assets_linked {
            let mut orphans: Vec<&str> = index
                .assets
                .values()
                .map(ImageAsset::file_name)
                .filter(|name| !claims.contains_key(name))
                .collect();
            orphans.sort_unstable();
            if let Some(file) = orphans.first() {
                return Err(PipelineError::OrphanAsset {
                    file: (*file).to_string(),
                });
            }
        }

        tracing::info!(
            stage = %self.kind(),
            rows = outcome.rows,
            linked = outcome.filled + outcome.confirmed,
            assets = outcome.assets_indexed,
            "catalog linked"
        );
        Ok(outcome)
    }
}
