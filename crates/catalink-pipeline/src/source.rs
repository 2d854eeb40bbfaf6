//! Row and asset sources, row sinks
//!
//! Matching logic never touches the filesystem directly; it sees a
//! [`CatalogTable`] and a slice of [`ImageAsset`]s. These traits are the
//! seam between the two, so rows can come from a CSV file today and from an
//! API feed tomorrow.

use crate::error::{PipelineError, PipelineResult, TableError};
use crate::table::{encode_table, read_table};
use catalink_model::{CatalogTable, Checksum, ImageAsset};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Supplies the catalog rows for one run
pub trait RowSource {
    /// Load the full table
    ///
    /// # Errors
    /// Returns an error if the rows cannot be read.
    fn load(&self) -> PipelineResult<CatalogTable>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Supplies the asset listing for one run
#[cfg_attr(test, mockall::automock)]
pub trait AssetSource {
    /// List every asset, sorted by file name
    ///
    /// # Errors
    /// Returns an error if the listing cannot be produced.
    fn list(&self) -> PipelineResult<Vec<ImageAsset>>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Receives the finished table
pub trait RowSink {
    /// Persist the table and return the checksum of what was written
    ///
    /// # Errors
    /// Returns an error if the table cannot be serialized or stored.
    fn commit(&self, table: &CatalogTable) -> PipelineResult<Checksum>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// CSV file on disk, usable as source and sink
#[derive(Debug, Clone)]
pub struct CsvFile {
    path: PathBuf,
    delimiter: u8,
}

impl CsvFile {
    /// Create handle for path with the given delimiter
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self {
            path: path.into(),
            delimiter,
        }
    }

    /// File path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RowSource for CsvFile {
    fn load(&self) -> PipelineResult<CatalogTable> {
        let file = fs::File::open(&self.path).map_err(|e| TableError::io_error(&self.path, e))?;
        Ok(read_table(file, self.delimiter, &self.path)?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl RowSink for CsvFile {
    /// Atomic write: temp file in the target directory, then rename
    fn commit(&self, table: &CatalogTable) -> PipelineResult<Checksum> {
        let bytes = encode_table(table, self.delimiter, &self.path)?;
        let checksum = Checksum::compute(&bytes);

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut staged =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| TableError::io_error(dir, e))?;
        staged
            .write_all(&bytes)
            .and_then(|()| staged.flush())
            .map_err(|e| TableError::io_error(staged.path(), e))?;
        staged
            .persist(&self.path)
            .map_err(|e| TableError::io_error(&self.path, e.error))?;

        tracing::info!(
            path = %self.path.display(),
            rows = table.len(),
            checksum = %checksum.short(),
            "table written"
        );
        Ok(checksum)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Sink for dry runs: serializes and hashes, writes nothing
#[derive(Debug, Clone, Copy)]
pub struct NullSink {
    delimiter: u8,
}

impl NullSink {
    /// Create sink hashing with the given delimiter
    #[inline]
    #[must_use]
    pub const fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl RowSink for NullSink {
    fn commit(&self, table: &CatalogTable) -> PipelineResult<Checksum> {
        let bytes = encode_table(table, self.delimiter, Path::new("<dry-run>"))?;
        Ok(Checksum::compute(&bytes))
    }

    fn describe(&self) -> String {
        "dry run (no output)".to_string()
    }
}

/// Flat directory of image files
///
/// Only regular files are listed; subdirectories and hidden files (leading
/// `.`) are ignored. The listing is sorted by file name. Names that are not
/// valid UTF-8 are listed lossily and left for each stage to reject.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    root: PathBuf,
}

impl DirectoryAssets {
    /// Create source for a directory
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory being listed
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for DirectoryAssets {
    fn list(&self) -> PipelineResult<Vec<ImageAsset>> {
        let listing_error = |source| PipelineError::AssetListing {
            path: self.root.clone(),
            source,
        };

        let mut assets = Vec::new();
        for entry in fs::read_dir(&self.root).map_err(listing_error)? {
            let path = entry.map_err(listing_error)?.path();
            if !fs::metadata(&path).map_err(listing_error)?.is_file() {
                continue;
            }
            let asset = ImageAsset::from_path_lossy(&path);
            if asset.file_name().starts_with('.') {
                continue;
            }
            if !asset.is_utf8() {
                tracing::warn!(path = %path.display(), "asset file name is not valid UTF-8");
            }
            assets.push(asset);
        }

        assets.sort_by(|a, b| a.file_name().cmp(b.file_name()));
        Ok(assets)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// In-memory rows
#[derive(Debug, Clone)]
pub struct StaticRows(pub CatalogTable);

impl RowSource for StaticRows {
    fn load(&self) -> PipelineResult<CatalogTable> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory rows", self.0.len())
    }
}

/// In-memory asset listing
#[derive(Debug, Clone, Default)]
pub struct StaticAssets(Vec<ImageAsset>);

impl StaticAssets {
    /// Create listing from bare file names
    #[must_use]
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(names.iter().map(|n| ImageAsset::named(n.as_ref())).collect())
    }

    /// Create listing; assets are sorted by file name
    #[must_use]
    pub fn new(mut assets: Vec<ImageAsset>) -> Self {
        assets.sort_by(|a, b| a.file_name().cmp(b.file_name()));
        Self(assets)
    }
}

impl AssetSource for StaticAssets {
    fn list(&self) -> PipelineResult<Vec<ImageAsset>> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory assets", self.0.len())
    }
}
