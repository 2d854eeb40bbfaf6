//! Pipeline runner
//!
//! Loads rows and assets once, builds the index of every requested stage,
//! then applies the stages in order on one in-memory table. The sink only
//! sees the table after every stage succeeded.

use crate::config::PipelineConfig;
use crate::error::{ConfigError, PipelineError, PipelineResult};
use crate::source::{AssetSource, CsvFile, DirectoryAssets, NullSink, RowSink, RowSource};
use crate::stages::{
    CandidateIndex, ImagePathResolver, PercentageIndex, PercentageReconciler, Stage, StageKind,
    StageOutcome, StrictIndex, StrictLinker,
};
use catalink_model::{CatalogTable, Checksum, ImageAsset};
use serde::Serialize;
use std::fmt::Write as _;

/// Stage with its index already built
enum PreparedStage {
    Percentage(PercentageReconciler, PercentageIndex),
    ImagePaths(ImagePathResolver, CandidateIndex),
    Strict(StrictLinker, StrictIndex),
}

impl PreparedStage {
    fn prepare(
        kind: StageKind,
        config: &PipelineConfig,
        assets: &[ImageAsset],
    ) -> PipelineResult<Self> {
        Ok(match kind {
            StageKind::Percentage => {
                let stage = PercentageReconciler::from_config(config);
                let index = stage.build_index(assets)?;
                Self::Percentage(stage, index)
            }
            StageKind::ImagePaths => {
                let stage = ImagePathResolver::from_config(config);
                let index = stage.build_index(assets)?;
                Self::ImagePaths(stage, index)
            }
            StageKind::Strict => {
                let stage = StrictLinker::from_config(config);
                let index = stage.build_index(assets)?;
                Self::Strict(stage, index)
            }
        })
    }

    fn apply(&self, table: &mut CatalogTable) -> PipelineResult<StageOutcome> {
        match self {
            Self::Percentage(stage, index) => stage.apply(index, table),
            Self::ImagePaths(stage, index) => stage.apply(index, table),
            Self::Strict(stage, index) => stage.apply(index, table),
        }
    }
}

/// Summary of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Outcome per stage, in execution order
    pub stages: Vec<StageOutcome>,
    /// Rows in (and out)
    pub rows: usize,
    /// Where the table went
    pub output: String,
    /// Blake3 of the serialized table
    pub checksum: Checksum,
    /// Whether the output was discarded
    pub dry_run: bool,
}

impl RunReport {
    /// Plain-text rendering for terminals
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for s in &self.stages {
            let _ = writeln!(
                out,
                "{:<12} rows={} filled={} confirmed={} skipped={} assets={} (ignored {})",
                s.stage.name(),
                s.rows,
                s.filled,
                s.confirmed,
                s.skipped,
                s.assets_indexed,
                s.assets_skipped,
            );
        }
        let verb = if self.dry_run { "checked" } else { "wrote" };
        let _ = write!(
            out,
            "{verb} {} rows to {} (blake3 {})",
            self.rows,
            self.output,
            self.checksum.short()
        );
        out
    }
}

/// Runs stages against a configuration
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create pipeline; the configuration is validated here
    ///
    /// # Errors
    /// Returns [`ConfigError`] for settings `validate` rejects.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Apply `stages` to `table` in place
    ///
    /// Every index is built before the first row is touched, so asset-side
    /// errors surface before any row-side error.
    ///
    /// # Errors
    /// Returns the first error any stage reports. `table` may be partially
    /// modified on error and should be discarded.
    pub fn process(
        &self,
        stages: &[StageKind],
        table: &mut CatalogTable,
        assets: &[ImageAsset],
    ) -> PipelineResult<Vec<StageOutcome>> {
        if stages.is_empty() {
            return Err(ConfigError::Invalid {
                key: "stages",
                reason: "at least one stage is required".to_string(),
            }
            .into());
        }

        let prepared = stages
            .iter()
            .map(|kind| PreparedStage::prepare(*kind, &self.config, assets))
            .collect::<PipelineResult<Vec<_>>>()?;

        let input_rows = table.len();
        let mut outcomes = Vec::with_capacity(prepared.len());
        for stage in &prepared {
            outcomes.push(stage.apply(table)?);
        }

        if table.len() != input_rows {
            return Err(PipelineError::RowCountMismatch {
                input: input_rows,
                output: table.len(),
            });
        }
        Ok(outcomes)
    }

    /// Load, process and commit
    ///
    /// # Errors
    /// Returns the first error from loading, any stage, or the sink. The sink
    /// is not called unless every stage succeeded.
    pub fn run<R, A, S>(
        &self,
        stages: &[StageKind],
        rows: &R,
        assets: &A,
        sink: &S,
    ) -> PipelineResult<RunReport>
    where
        R: RowSource + ?Sized,
        A: AssetSource + ?Sized,
        S: RowSink + ?Sized,
    {
        let mut table = rows.load()?;
        let listing = assets.list()?;
        tracing::info!(
            rows = table.len(),
            source = %rows.describe(),
            assets = listing.len(),
            asset_source = %assets.describe(),
            stages = ?stages,
            "starting run"
        );

        let outcomes = self.process(stages, &mut table, &listing)?;
        let checksum = sink.commit(&table)?;

        Ok(RunReport {
            stages: outcomes,
            rows: table.len(),
            output: sink.describe(),
            checksum,
            dry_run: self.config.dry_run,
        })
    }

    /// Run against the files named in the configuration
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] when a required path is unset, and
    /// otherwise whatever [`Pipeline::run`] returns.
    pub fn run_files(&self, stages: &[StageKind]) -> PipelineResult<RunReport> {
        let delimiter = self.config.delimiter_byte()?;
        let rows = CsvFile::new(self.config.input()?, delimiter);
        let assets = DirectoryAssets::new(self.config.assets_dir()?);

        if self.config.dry_run {
            self.run(stages, &rows, &assets, &NullSink::new(delimiter))
        } else {
            let sink = CsvFile::new(self.config.output()?, delimiter);
            self.run(stages, &rows, &assets, &sink)
        }
    }
}
