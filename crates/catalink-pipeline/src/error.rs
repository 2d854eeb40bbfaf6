//! Error types for the reconciliation pipeline
//!
//! Every variant names the offending row or file and the rule it broke.
//! The policy is fail-fast: the first error aborts the run and nothing is
//! written.

use catalink_model::{AssetNameError, NumericParseError};
use std::path::PathBuf;

/// Errors reading or writing a catalog table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// IO error on the table file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV
    #[error("csv error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Table has no header row
    #[error("{path} has no header row")]
    MissingHeader { path: PathBuf },

    /// Two header cells share a name
    #[error("{path} repeats column '{column}'")]
    DuplicateColumn { path: PathBuf, column: String },
}

impl TableError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create CSV error for path
    pub fn csv_error(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            source,
        }
    }
}

/// Errors loading or checking configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A setting is out of range
    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// A path required by the command is not set
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Numeric field failed to parse in a fill stage
    #[error("row {row} ({product}): cannot read {column}: {source}")]
    NumericParse {
        row: usize,
        product: String,
        column: String,
        #[source]
        source: NumericParseError,
    },

    /// Numeric field failed to parse under strict validation
    #[error("row {row} ({product}): invalid {column} for strict linking: {reason}")]
    InvalidRowNumeric {
        row: usize,
        product: String,
        column: String,
        reason: String,
    },

    /// Required cell is blank or its column is missing
    #[error("row {row} ({product}): required field '{column}' is empty")]
    MissingField {
        row: usize,
        product: String,
        column: String,
    },

    /// Percentage reconciler found no asset for a row
    #[error("row {row} ({product}): no asset matches '{key}'")]
    UnmatchedRow {
        row: usize,
        product: String,
        key: String,
    },

    /// Strict linker found no asset for a row
    #[error("row {row} ({product}): cannot link, no asset encodes '{key}'")]
    UnlinkedRow {
        row: usize,
        product: String,
        key: String,
    },

    /// Declared percentage disagrees with the asset
    #[error(
        "row {row} ({product}, volume {volume}): declared percentage {declared} but asset '{asset}' says {expected}"
    )]
    PercentageConflict {
        row: usize,
        product: String,
        volume: String,
        declared: String,
        expected: String,
        asset: String,
    },

    /// Image-path resolver found no candidate file
    #[error("row {row}: no image found for {product} with volume {volume}")]
    ImageNotFound {
        row: usize,
        product: String,
        volume: String,
    },

    /// Two assets encode the same product variant
    #[error("assets '{first}' and '{second}' both encode '{key}'")]
    DuplicateAsset {
        key: String,
        first: String,
        second: String,
    },

    /// Asset filename does not fit the strict grammar
    #[error("malformed asset filename '{file}': {reason}")]
    MalformedAsset {
        file: String,
        #[source]
        reason: AssetNameError,
    },

    /// Two rows resolve to the same asset
    #[error("asset '{asset}' is claimed by row {first_row} and row {second_row}")]
    DuplicateClaim {
        asset: String,
        first_row: usize,
        second_row: usize,
    },

    /// Row already names a different image than the one it links to
    #[error("row {row} ({product}): imageFile '{declared}' conflicts with linked asset '{linked}'")]
    ImageConflict {
        row: usize,
        product: String,
        declared: String,
        linked: String,
    },

    /// Asset left without a row while exhaustive linking is required
    #[error("asset '{file}' is not linked to any row")]
    OrphanAsset { file: String },

    /// Output would not have one row per input row
    #[error("row count changed: {input} rows in, {output} rows out")]
    RowCountMismatch { input: usize, output: usize },

    /// Asset directory could not be listed
    #[error("cannot list assets in {path}: {source}")]
    AssetListing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Table ingress/egress failed
    #[error("table error: {0}")]
    Table(#[from] TableError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// Row number the error refers to, if any
    #[must_use]
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::NumericParse { row, .. }
            | Self::InvalidRowNumeric { row, .. }
            | Self::MissingField { row, .. }
            | Self::UnmatchedRow { row, .. }
            | Self::UnlinkedRow { row, .. }
            | Self::PercentageConflict { row, .. }
            | Self::ImageNotFound { row, .. }
            | Self::ImageConflict { row, .. } => Some(*row),
            Self::DuplicateClaim { second_row, .. } => Some(*second_row),
            _ => None,
        }
    }

    /// Check if the error comes from the asset side rather than a row
    #[inline]
    #[must_use]
    pub fn is_asset_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateAsset { .. }
                | Self::MalformedAsset { .. }
                | Self::OrphanAsset { .. }
                | Self::AssetListing { .. }
        )
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_conflict_display_names_both_values() {
        let err = PipelineError::PercentageConflict {
            row: 3,
            product: "'Vodka Gold'".to_string(),
            volume: "70cl".to_string(),
            declared: "38".to_string(),
            expected: "40".to_string(),
            asset: "Vodka Gold 70-6-40.png".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("row 3"));
        assert!(msg.contains("declared percentage 38"));
        assert!(msg.contains("says 40"));
        assert!(msg.contains("volume 70cl"));
        assert_eq!(err.row(), Some(3));
    }

    #[test]
    fn asset_errors_have_no_row() {
        let err = PipelineError::DuplicateAsset {
            key: "rum x-70-6-37.5".to_string(),
            first: "Rum X 70-6-37.5.png".to_string(),
            second: "Rum X 70-6-37.5.webp".to_string(),
        };
        assert!(err.is_asset_error());
        assert_eq!(err.row(), None);
    }

    #[test]
    fn error_conversions() {
        let table_err = TableError::MissingHeader {
            path: PathBuf::from("catalog.csv"),
        };
        let err: PipelineError = table_err.into();
        assert!(matches!(err, PipelineError::Table(_)));

        let config_err = ConfigError::Missing("input");
        let err: PipelineError = config_err.into();
        assert_eq!(
            err.to_string(),
            "configuration error: missing required setting: input"
        );
    }
}
