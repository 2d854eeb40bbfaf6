//! Image-path resolver
//!
//! Fills `imageFile` for rows that lack one. Asset names are not parsed;
//! a candidate matches when its folded stem contains the folded product
//! name and its file name contains `<volume>-<box>-` for one of the volume
//! spellings the catalog might use.

use super::{read_attributes, Stage, StageKind, StageOutcome};
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use catalink_model::{
    canonical_number, fixed_two_decimals, normalize_name, CatalogTable, ColumnNames, ImageAsset,
    NameFolding,
};

/// A file the resolver may link to
#[derive(Debug, Clone)]
pub struct Candidate {
    folded_stem: String,
    lowered: String,
    file_name: String,
    link: String,
}

impl Candidate {
    /// File name as listed
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Value written into `imageFile` when this candidate wins
    #[inline]
    #[must_use]
    pub fn link(&self) -> &str {
        &self.link
    }

    fn contains_variant(&self, variant: &str) -> bool {
        self.lowered.match_indices(variant).any(|(at, _)| {
            // `70-6-` must not match inside `170-6-` or `0.70-6-`
            !self.lowered[..at]
                .chars()
                .next_back()
                .is_some_and(|c| c.is_ascii_digit() || c == '.')
        })
    }
}

/// Candidates in listing order
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    candidates: Vec<Candidate>,
    skipped: usize,
}

impl CandidateIndex {
    /// Candidates in the order they are tried
    #[inline]
    #[must_use]
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Number of candidates
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Check if there are no candidates
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Fills missing `imageFile` values
#[derive(Debug, Clone)]
pub struct ImagePathResolver {
    columns: ColumnNames,
    folding: NameFolding,
    extensions: Vec<String>,
    path_prefix: Option<String>,
}

impl ImagePathResolver {
    /// Create resolver from configuration
    #[must_use]
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            columns: config.columns.clone(),
            folding: config.image_paths.folding,
            extensions: config.image_paths.extensions.clone(),
            path_prefix: config.image_paths.path_prefix.clone(),
        }
    }

    fn link_for(&self, asset: &ImageAsset) -> String {
        match &self.path_prefix {
            Some(prefix) if !prefix.is_empty() => {
                format!("{}/{}", prefix.trim_end_matches('/'), asset.file_name())
            }
            _ => asset.path().display().to_string(),
        }
    }
}

impl Stage for ImagePathResolver {
    type Index = CandidateIndex;

    fn kind(&self) -> StageKind {
        StageKind::ImagePaths
    }

    fn build_index(&self, assets: &[ImageAsset]) -> Result<CandidateIndex, PipelineError> {
        let mut index = CandidateIndex::default();
        for asset in assets {
            if !asset.is_utf8() {
                tracing::debug!(path = %asset.path().display(), "file name is not valid UTF-8");
                index.skipped += 1;
                continue;
            }
            if !asset.has_extension(&self.extensions) {
                tracing::debug!(file = asset.file_name(), "not an accepted image type");
                index.skipped += 1;
                continue;
            }
            index.candidates.push(Candidate {
                folded_stem: normalize_name(asset.stem(), self.folding),
                lowered: asset.file_name().to_lowercase().replace(',', "."),
                file_name: asset.file_name().to_string(),
                link: self.link_for(asset),
            });
        }
        Ok(index)
    }

    fn apply(
        &self,
        index: &CandidateIndex,
        table: &mut CatalogTable,
    ) -> Result<StageOutcome, PipelineError> {
        let mut outcome = StageOutcome::new(self.kind());
        outcome.assets_indexed = index.len();
        outcome.assets_skipped = index.skipped;

        let column = self.columns.image_file.clone();
        table.ensure_column(&column);

        for row in table.rows_mut() {
            outcome.rows += 1;
            if row.present(&column).is_some() {
                outcome.skipped += 1;
                continue;
            }

            let attrs =
                read_attributes(row, &self.columns).map_err(|e| e.lenient(row, &self.columns))?;
            let name = normalize_name(&attrs.name, self.folding);
            if name.is_empty() {
                return Err(PipelineError::MissingField {
                    row: row.position(),
                    product: row.identifier(&self.columns),
                    column: self.columns.name.clone(),
                });
            }

            let variants = [
                format!("{}-{}-", fixed_two_decimals(attrs.volume), attrs.box_quantity),
                format!("{}-{}-", canonical_number(attrs.volume), attrs.box_quantity),
            ];
            let mut matches = index.candidates.iter().filter(|c| {
                c.folded_stem.contains(&name) && variants.iter().any(|v| c.contains_variant(v))
            });

            let Some(chosen) = matches.next() else {
                return Err(PipelineError::ImageNotFound {
                    row: row.position(),
                    product: row.identifier(&self.columns),
                    volume: attrs.volume_raw,
                });
            };
            let others: Vec<&str> = matches.map(Candidate::file_name).collect();
            if !others.is_empty() {
                tracing::warn!(
                    row = row.position(),
                    chosen = chosen.file_name(),
                    ignored = ?others,
                    "several images match, using the first"
                );
            }

            row.set(&column, chosen.link());
            outcome.filled += 1;
        }

        tracing::info!(
            stage = %self.kind(),
            rows = outcome.rows,
            filled = outcome.filled,
            skipped = outcome.skipped,
            "image paths resolved"
        );
        Ok(outcome)
    }
}
