//! Testing utilities for the Catalink workspace
//!
//! Shared fixtures: temporary asset directories and catalog files.

#![allow(missing_docs)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Headers of the catalog most tests use
pub const CATALOG_HEADERS: [&str; 4] = ["name", "volume", "quantityInBox", "percentage"];

/// Temporary workspace holding an asset directory and catalog files
pub struct Workspace {
    root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir(root.path().join("assets")).unwrap();
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.path()
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.root.path().join("assets")
    }

    /// Create empty image files; only names matter to the pipeline
    pub fn with_assets(self, names: &[&str]) -> Self {
        for name in names {
            fs::write(self.assets_dir().join(name), b"").unwrap();
        }
        self
    }

    /// Write a catalog file and return its path
    pub fn write_catalog(&self, file_name: &str, contents: &str) -> PathBuf {
        let path = self.root.path().join(file_name);
        fs::write(&path, contents).unwrap();
        path
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.root.path().join(file_name)
    }

    pub fn read(&self, file_name: &str) -> String {
        fs::read_to_string(self.path(file_name)).unwrap()
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Build CSV text from a header and rows of cells
pub fn catalog_csv(headers: &[&str], rows: &[&[&str]]) -> String {
    let mut out = headers.join(",");
    out.push('\n');
    for row in rows {
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// The single-row catalog used across scenarios
pub fn vodka_gold(percentage: &str) -> String {
    catalog_csv(&CATALOG_HEADERS, &[&["Vodka Gold", "70cl", "6", percentage]])
}
