//! Catalink Pipeline
//!
//! Batch reconciliation of a product catalog against a directory of image
//! assets whose file names encode the same attributes.
//!
//! # Stages
//!
//! - **Percentage**: fill a missing `percentage` from the matching asset, or
//!   confirm the declared one
//! - **Image paths**: fill a missing `imageFile` by fuzzy file matching
//! - **Strict**: link every row to exactly one well-formed asset
//!
//! # Architecture
//!
//! ```text
//! RowSource ──► CatalogTable ─┐
//!                             ├─► build_index (all stages) ─► apply (in order) ─► RowSink
//! AssetSource ─► [ImageAsset] ┘
//! ```
//!
//! A run is all-or-nothing: the sink is only called once every stage has
//! succeeded, and [`CsvFile`] replaces its target atomically.
//!
//! # Example
//!
//! ```rust
//! use catalink_model::{CatalogRow, CatalogTable};
//! use catalink_pipeline::{NullSink, Pipeline, PipelineConfig, StageKind, StaticAssets, StaticRows};
//!
//! let row = CatalogRow::from_pairs(
//!     1,
//!     [("name", "Vodka Gold"), ("volume", "70cl"), ("quantityInBox", "6"), ("percentage", "")],
//! );
//! let headers = row.fields().keys().cloned().collect();
//! let rows = StaticRows(CatalogTable::new(headers, vec![row]));
//! let assets = StaticAssets::from_names(&["Vodka Gold 70-6-40.png"]);
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let report = pipeline
//!     .run(&[StageKind::Percentage], &rows, &assets, &NullSink::new(b','))
//!     .unwrap();
//! assert_eq!(report.stages[0].filled, 1);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod inspect;
pub mod pipeline;
pub mod source;
pub mod stages;
pub mod table;

pub use config::{PathsConfig, PipelineConfig, ReconcilerConfig, ResolverConfig, StrictConfig};
pub use error::{ConfigError, PipelineError, PipelineResult, TableError};
pub use inspect::{inspect_assets, AssetInspection};
pub use pipeline::{Pipeline, RunReport};
pub use source::{
    AssetSource, CsvFile, DirectoryAssets, NullSink, RowSink, RowSource, StaticAssets, StaticRows,
};
pub use stages::{
    ImagePathResolver, PercentageReconciler, Stage, StageKind, StageOutcome, StrictLinker,
};
pub use table::{encode_table, read_table, write_table};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for running the pipeline
    pub use crate::config::PipelineConfig;
    pub use crate::error::{PipelineError, PipelineResult};
    pub use crate::pipeline::{Pipeline, RunReport};
    pub use crate::source::{AssetSource, CsvFile, DirectoryAssets, RowSink, RowSource};
    pub use crate::stages::{Stage, StageKind, StageOutcome};
    pub use catalink_model::{CatalogRow, CatalogTable, ImageAsset};
}
