//! Percentage reconciler
//!
//! Fills a missing `percentage` from the matching asset's file name, or
//! confirms that a declared one agrees with it. A row without a matching
//! asset, or with a disagreeing value, aborts the run.

use super::{read_attributes, Stage, StageKind, StageOutcome};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use catalink_model::{
    canonical_number, parse_numeric, AssetGrammar, CatalogTable, ColumnNames, CompositeKey,
    ImageAsset, KeyBuilder,
};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Percentage recorded for one three-part key
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedPercentage {
    /// Percentage decoded from the file name
    pub value: f64,
    /// File it came from
    pub file_name: String,
}

/// `(name, volume, box)` → percentage
#[derive(Debug, Clone, Default)]
pub struct PercentageIndex {
    entries: HashMap<CompositeKey, IndexedPercentage>,
    indexed: usize,
    skipped: usize,
}

impl PercentageIndex {
    /// Look up a three-part key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &CompositeKey) -> Option<&IndexedPercentage> {
        self.entries.get(key)
    }

    /// Number of distinct keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no asset was indexed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fills or confirms the percentage column
#[derive(Debug, Clone)]
pub struct PercentageReconciler {
    columns: ColumnNames,
    keys: KeyBuilder,
    extensions: Vec<String>,
}

impl PercentageReconciler {
    /// Create reconciler from configuration
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            keys: KeyBuilder::new(config.percentage.folding),
            extensions: config.percentage.extensions.clone(),
        }
    }
}

impl Stage for PercentageReconciler {
    type Index = PercentageIndex;

    fn kind(&self) -> StageKind {
        StageKind::Percentage
    }

    fn build_index(&self, assets: &[ImageAsset]) -> Result<PercentageIndex, PipelineError> {
        let mut index = PercentageIndex::default();

        for asset in assets {
            let attrs = match asset.parse(AssetGrammar::Lenient, &self.extensions) {
                Ok(attrs) => attrs,
                Err(reason) => {
                    tracing::debug!(file = asset.file_name(), %reason, "asset skipped");
                    index.skipped += 1;
                    continue;
                }
            };

            let key = self
                .keys
                .three_part(&attrs.name, attrs.volume, attrs.box_quantity);
            match index.entries.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(IndexedPercentage {
                        value: attrs.percentage,
                        file_name: asset.file_name().to_string(),
                    });
                }
                Entry::Occupied(slot) => {
                    // Same variant in another format is fine; a second percentage is not
                    if canonical_number(slot.get().value) != canonical_number(attrs.percentage) {
                        return Err(PipelineError::DuplicateAsset {
                            key: slot.key().to_string(),
                            first: slot.get().file_name.clone(),
                            second: asset.file_name().to_string(),
                        });
                    }
                }
            }
            index.indexed += 1;
        }

        Ok(index)
    }

    fn apply(
        &self,
        index: &PercentageIndex,
        table: &mut CatalogTable,
    ) -> Result<StageOutcome, PipelineError> {
        let mut outcome = StageOutcome::new(self.kind());
        outcome.assets_indexed = index.indexed;
        outcome.assets_skipped = index.skipped;

        let column = self.columns.percentage.clone();
        table.ensure_column(&column);

        for row in table.rows_mut() {
            outcome.rows += 1;
            let attrs =
                read_attributes(row, &self.columns).map_err(|e| e.lenient(row, &self.columns))?;
            let key = self
                .keys
                .three_part(&attrs.name, attrs.volume, attrs.box_quantity);

            let Some(found) = index.get(&key) else {
                return Err(PipelineError::UnmatchedRow {
                    row: row.position(),
                    product: row.identifier(&self.columns),
                    key: key.to_string(),
                });
            };
            let expected = canonical_number(found.value);

            match row.present(&column) {
                None => {
                    row.set(&column, expected);
                    outcome.filled += 1;
                }
                Some(raw) => {
                    let declared = parse_numeric(raw).map_err(|source| {
                        PipelineError::NumericParse {
                            row: row.position(),
                            product: row.identifier(&self.columns),
                            column: column.clone(),
                            source,
                        }
                    })?;
                    if canonical_number(declared) != expected {
                        return Err(PipelineError::PercentageConflict {
                            row: row.position(),
                            product: row.identifier(&self.columns),
                            volume: attrs.volume_raw,
                            declared: raw.to_string(),
                            expected,
                            asset: found.file_name.clone(),
                        });
                    }
                    outcome.confirmed += 1;
                }
            }
        }

        tracing::info!(
            stage = %self.kind(),
            rows = outcome.rows,
            filled = outcome.filled,
            confirmed = outcome.confirmed,
            "percentages reconciled"
        );
        Ok(outcome)
    }
}
