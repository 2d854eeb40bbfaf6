//! Reconciliation stages
//!
//! Each stage runs in two phases:
//! 1. **Index**: turn the asset listing into a lookup structure
//! 2. **Apply**: walk the rows once, filling or checking fields
//!
//! Stages share the [`Stage`] trait so the runner can prepare every index
//! before any row is touched.

use crate::error::PipelineError;
use catalink_model::{
    parse_box_quantity, parse_volume, CatalogRow, CatalogTable, ColumnNames, ImageAsset,
    NumericParseError,
};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

mod image_paths;
mod percentage;
mod strict;

pub use image_paths::{Candidate, CandidateIndex, ImagePathResolver};
pub use percentage::{IndexedPercentage, PercentageIndex, PercentageReconciler};
pub use strict::{StrictIndex, StrictLinker};

/// Identifies a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    /// Fill or confirm `percentage`
    Percentage,
    /// Fill `imageFile` by fuzzy file matching
    ImagePaths,
    /// Exhaustive one-to-one linking
    Strict,
}

impl StageKind {
    /// Every stage in the order they are meant to run
    pub const ALL: [Self; 3] = [Self::Percentage, Self::ImagePaths, Self::Strict];

    /// Stable name
    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::ImagePaths => "image-paths",
            Self::Strict => "strict",
        }
    }
}

impl Display for StageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StageKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "percentage" | "fill-percentage" => Ok(Self::Percentage),
            "image-paths" | "fill-image-paths" => Ok(Self::ImagePaths),
            "strict" | "validate" => Ok(Self::Strict),
            other => Err(format!(
                "unknown stage '{other}' (expected percentage, image-paths or strict)"
            )),
        }
    }
}

/// What a stage did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    /// Stage that produced this outcome
    pub stage: StageKind,
    /// Rows seen
    pub rows: usize,
    /// Rows whose field was filled
    pub filled: usize,
    /// Rows whose existing value was confirmed
    pub confirmed: usize,
    /// Rows left alone
    pub skipped: usize,
    /// Assets that made it into the index
    pub assets_indexed: usize,
    /// Assets ignored by a lenient grammar
    pub assets_skipped: usize,
}

impl StageOutcome {
    /// Empty outcome for a stage
    #[inline]
    #[must_use]
    pub fn new(stage: StageKind) -> Self {
        Self {
            stage,
            rows: 0,
            filled: 0,
            confirmed: 0,
            skipped: 0,
            assets_indexed: 0,
            assets_skipped: 0,
        }
    }
}

/// Two-phase reconciliation stage
pub trait Stage {
    /// Lookup structure built from the asset listing
    type Index;

    /// Which stage this is
    fn kind(&self) -> StageKind;

    /// Index phase
    ///
    /// # Errors
    /// Returns an error when the listing itself is unacceptable
    /// (duplicates, malformed names under strict rules).
    fn build_index(&self, assets: &[ImageAsset]) -> Result<Self::Index, PipelineError>;

    /// Apply phase; mutates `table` in place
    ///
    /// # Errors
    /// Returns the first row that cannot be resolved.
    fn apply(
        &self,
        index: &Self::Index,
        table: &mut CatalogTable,
    ) -> Result<StageOutcome, PipelineError>;

    /// Both phases back to back
    ///
    /// # Errors
    /// Propagates errors from either phase.
    fn run(
        &self,
        assets: &[ImageAsset],
        table: &mut CatalogTable,
    ) -> Result<StageOutcome, PipelineError> {
        let index = self.build_index(assets)?;
        self.apply(&index, table)
    }
}

/// Row attributes every stage keys on
#[derive(Debug, Clone)]
pub(crate) struct RowAttributes {
    pub(crate) name: String,
    pub(crate) volume_raw: String,
    pub(crate) volume: f64,
    pub(crate) box_quantity: u32,
}

/// Why a row's attributes could not be read
#[derive(Debug)]
pub(crate) enum FieldError {
    Missing(String),
    Numeric(String, NumericParseError),
}

impl FieldError {
    /// Error for the lenient stages
    pub(crate) fn lenient(self, row: &CatalogRow, columns: &ColumnNames) -> PipelineError {
        match self {
            Self::Missing(column) => PipelineError::MissingField {
                row: row.position(),
                product: row.identifier(columns),
                column,
            },
            Self::Numeric(column, source) => PipelineError::NumericParse {
                row: row.position(),
                product: row.identifier(columns),
                column,
                source,
            },
        }
    }

    /// Error for the strict linker
    pub(crate) fn strict(self, row: &CatalogRow, columns: &ColumnNames) -> PipelineError {
        match self {
            Self::Missing(column) => PipelineError::MissingField {
                row: row.position(),
                product: row.identifier(columns),
                column,
            },
            Self::Numeric(column, source) => PipelineError::InvalidRowNumeric {
                row: row.position(),
                product: row.identifier(columns),
                column,
                reason: source.to_string(),
            },
        }
    }
}

/// Required cell or `FieldError::Missing`
pub(crate) fn required<'a>(row: &'a CatalogRow, column: &str) -> Result<&'a str, FieldError> {
    row.present(column)
        .ok_or_else(|| FieldError::Missing(column.to_string()))
}

/// Read name, volume and box quantity
pub(crate) fn read_attributes(
    row: &CatalogRow,
    columns: &ColumnNames,
) -> Result<RowAttributes, FieldError> {
    let name = required(row, &columns.name)?;
    let volume_raw = required(row, &columns.volume)?;
    let volume = parse_volume(volume_raw)
        .map_err(|e| FieldError::Numeric(columns.volume.clone(), e))?;
    let box_raw = required(row, &columns.quantity_in_box)?;
    let box_quantity = parse_box_quantity(box_raw)
        .map_err(|e| FieldError::Numeric(columns.quantity_in_box.clone(), e))?;

    Ok(RowAttributes {
        name: name.to_string(),
        volume_raw: volume_raw.to_string(),
        volume,
        box_quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_round_trip() {
        for kind in StageKind::ALL {
            assert_eq!(kind.name().parse::<StageKind>(), Ok(kind));
        }
        assert_eq!("validate".parse::<StageKind>(), Ok(StageKind::Strict));
        assert!("everything".parse::<StageKind>().is_err());
    }

    #[test]
    fn attributes_report_the_failing_column() {
        let columns = ColumnNames::default();
        let row = CatalogRow::from_pairs(
            4,
            [("name", "Gin"), ("volume", "seventy"), ("quantityInBox", "6")],
        );
        let err = read_attributes(&row, &columns).unwrap_err().lenient(&row, &columns);
        assert!(matches!(
            err,
            PipelineError::NumericParse { row: 4, ref column, .. } if column == "volume"
        ));

        let row = CatalogRow::from_pairs(5, [("name", "Gin"), ("volume", "70")]);
        let err = read_attributes(&row, &columns).unwrap_err().strict(&row, &columns);
        assert!(matches!(
            err,
            PipelineError::MissingField { row: 5, ref column, .. } if column == "quantityInBox"
        ));
    }

    #[test]
    fn strict_numeric_errors_carry_the_product() {
        let columns = ColumnNames::default();
        let row = CatalogRow::from_pairs(
            2,
            [
                ("productId", "P-17"),
                ("name", "Gin"),
                ("volume", "70"),
                ("quantityInBox", "6.5"),
            ],
        );
        let err = read_attributes(&row, &columns).unwrap_err().strict(&row, &columns);
        let msg = err.to_string();
        assert!(msg.contains("P-17"), "{msg}");
        assert!(matches!(err, PipelineError::InvalidRowNumeric { .. }));
    }
}
