//! Pipeline configuration
//!
//! All settings a run needs travel in one [`PipelineConfig`] value that is
//! passed to each stage. Nothing is read from process environment, so tests
//! can run several configurations side by side.

use crate::error::ConfigError;
use catalink_model::{ColumnNames, NameFolding};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input and output locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    /// Catalog table to read
    pub input: Option<PathBuf>,
    /// Table to write on success
    pub output: Option<PathBuf>,
    /// Flat directory of image files
    pub assets_dir: Option<PathBuf>,
}

/// Percentage reconciler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconcilerConfig {
    /// Name folding used for keys
    pub folding: NameFolding,
    /// Accepted asset extensions
    pub extensions: Vec<String>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            folding: NameFolding::Exact,
            extensions: vec!["png".to_string(), "webp".to_string()],
        }
    }
}

/// Image-path resolver settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverConfig {
    /// Name folding used for substring matching
    pub folding: NameFolding,
    /// Accepted image extensions
    pub extensions: Vec<String>,
    /// Prefix joined with the file name; defaults to the asset directory
    pub path_prefix: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            folding: NameFolding::Possessive,
            extensions: ["png", "webp", "jpg", "jpeg"]
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            path_prefix: None,
        }
    }
}

/// Strict linker settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrictConfig {
    /// Name folding used for keys
    pub folding: NameFolding,
    /// Accepted asset extensions
    pub extensions: Vec<String>,
    /// Fail when an asset is not claimed by any row
    pub require_all_assets_linked: bool,
}

impl Default for StrictConfig {
    fn default() -> Self {
        Self {
            folding: NameFolding::Exact,
            extensions: vec!["png".to_string(), "webp".to_string()],
            require_all_assets_linked: false,
        }
    }
}

/// Complete configuration for one pipeline invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Input and output locations
    pub paths: PathsConfig,
    /// CSV field delimiter (single byte)
    pub delimiter: char,
    /// Column names
    pub columns: ColumnNames,
    /// Percentage reconciler
    pub percentage: ReconcilerConfig,
    /// Image-path resolver
    pub image_paths: ResolverConfig,
    /// Strict linker
    pub strict: StrictConfig,
    /// Run every check but write nothing
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            delimiter: ',',
            columns: ColumnNames::default(),
            percentage: ReconcilerConfig::default(),
            image_paths: ResolverConfig::default(),
            strict: StrictConfig::default(),
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] on syntax errors or unknown keys.
    pub fn from_toml_str(text: &str, origin: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.into(),
            source,
        })
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// With input table
    #[inline]
    #[must_use]
    pub fn with_input(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.input = Some(path.into());
        self
    }

    /// With output table
    #[inline]
    #[must_use]
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.output = Some(path.into());
        self
    }

    /// With asset directory
    #[inline]
    #[must_use]
    pub fn with_assets_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.paths.assets_dir = Some(path.into());
        self
    }

    /// With dry-run flag
    #[inline]
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Delimiter as the byte the CSV reader expects
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] for a non-ASCII delimiter.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        u8::try_from(self.delimiter)
            .ok()
            .filter(u8::is_ascii)
            .ok_or_else(|| ConfigError::Invalid {
                key: "delimiter",
                reason: format!("'{}' is not a single ASCII character", self.delimiter),
            })
    }

    /// Check settings that serde cannot
    ///
    /// # Errors
    /// Returns the first invalid setting found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.delimiter_byte()?;
        if self.delimiter == '"' || self.delimiter == '\n' || self.delimiter == '\r' {
            return Err(ConfigError::Invalid {
                key: "delimiter",
                reason: "quote and line breaks cannot delimit fields".to_string(),
            });
        }

        for (key, list) in [
            ("percentage.extensions", &self.percentage.extensions),
            ("image_paths.extensions", &self.image_paths.extensions),
            ("strict.extensions", &self.strict.extensions),
        ] {
            if list.is_empty() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "at least one extension is required".to_string(),
                });
            }
            if let Some(bad) = list
                .iter()
                .find(|e| e.is_empty() || e.starts_with('.'))
            {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("'{bad}' must be a bare extension such as png"),
                });
            }
        }

        let c = &self.columns;
        for (key, value) in [
            ("columns.name", &c.name),
            ("columns.volume", &c.volume),
            ("columns.quantity_in_box", &c.quantity_in_box),
            ("columns.percentage", &c.percentage),
            ("columns.image_file", &c.image_file),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "column name cannot be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Input path or a missing-setting error
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] when unset.
    pub fn input(&self) -> Result<&Path, ConfigError> {
        self.paths
            .input
            .as_deref()
            .ok_or(ConfigError::Missing("input"))
    }

    /// Output path or a missing-setting error
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] when unset.
    pub fn output(&self) -> Result<&Path, ConfigError> {
        self.paths
            .output
            .as_deref()
            .ok_or(ConfigError::Missing("output"))
    }

    /// Asset directory or a missing-setting error
    ///
    /// # Errors
    /// Returns [`ConfigError::Missing`] when unset.
    pub fn assets_dir(&self) -> Result<&Path, ConfigError> {
        self.paths
            .assets_dir
            .as_deref()
            .ok_or(ConfigError::Missing("assets_dir"))
    }
}
