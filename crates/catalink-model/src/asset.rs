//! Image assets and the filename grammar that encodes their attributes
//!
//! An asset file such as `Vodka Gold 70-6-40.png` carries the product name,
//! volume, box quantity and percentage in its name. Two grammars exist:
//!
//! - [`AssetGrammar::Lenient`]: `<name> <volume>-<box>[-.]<percentage>.<ext>`,
//!   decimals written with `.` or `,`
//! - [`AssetGrammar::Strict`]: `<name> <volume>-<box>-<percentage>.<ext>`,
//!   decimals written with `.` only

use crate::normalize::{parse_box_quantity, parse_numeric, NumericParseError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};

static LENIENT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<name>.+) (?P<volume>\d+(?:[.,]\d+)?)-(?P<box>\d+)[-.](?P<pct>\d+(?:[.,]\d+)?)\.(?P<ext>[A-Za-z0-9]+)$",
    )
    .expect("lenient asset pattern is valid")
});

static STRICT_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<name>.+) (?P<volume>\d+(?:\.\d+)?)-(?P<box>\d+)-(?P<pct>\d+(?:\.\d+)?)\.(?P<ext>[A-Za-z0-9]+)$",
    )
    .expect("strict asset pattern is valid")
});

/// Which filename grammar to apply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetGrammar {
    /// Fill stages: tolerant delimiters and decimal separators
    Lenient,
    /// Final gate: one delimiter, `.` decimals
    Strict,
}

impl AssetGrammar {
    fn pattern(self) -> &'static Regex {
        match self {
            Self::Lenient => &LENIENT_NAME,
            Self::Strict => &STRICT_NAME,
        }
    }

    fn shape(self) -> &'static str {
        match self {
            Self::Lenient => "<name> <volume>-<box>[-.]<percentage>.<ext>",
            Self::Strict => "<name> <volume>-<box>-<percentage>.<ext>",
        }
    }
}

/// Why a filename was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetNameError {
    /// Filename does not follow the grammar
    #[error("does not match {expected}")]
    PatternMismatch { expected: &'static str },

    /// Extension outside the accepted set
    #[error("extension '{extension}' is not one of [{accepted}]")]
    UnsupportedExtension { extension: String, accepted: String },

    /// A numeric component failed to parse
    #[error("invalid {component}: {source}")]
    Numeric {
        component: &'static str,
        #[source]
        source: NumericParseError,
    },

    /// Path has no usable UTF-8 file name
    #[error("file name is not valid UTF-8")]
    NotUtf8,
}

/// One file in the asset directory
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ImageAsset {
    file_name: String,
    path: PathBuf,
    #[serde(skip)]
    lossy: bool,
}

impl ImageAsset {
    /// Create asset from its path
    ///
    /// # Errors
    /// Returns [`AssetNameError::NotUtf8`] if the file name is missing or not UTF-8.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, AssetNameError> {
        let path = path.into();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(AssetNameError::NotUtf8)?
            .to_string();
        Ok(Self {
            file_name,
            path,
            lossy: false,
        })
    }

    /// Create asset from a path whose file name may not be UTF-8
    ///
    /// Invalid sequences are replaced for display; such an asset never
    /// parses under either grammar.
    #[must_use]
    pub fn from_path_lossy(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (file_name, lossy) = match path.file_name() {
            Some(name) => match name.to_str() {
                Some(valid) => (valid.to_string(), false),
                None => (name.to_string_lossy().into_owned(), true),
            },
            None => (String::new(), true),
        };
        Self {
            file_name,
            path,
            lossy,
        }
    }

    /// Create asset from a bare file name (no directory)
    #[must_use]
    pub fn named(file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        Self {
            path: PathBuf::from(&file_name),
            file_name,
            lossy: false,
        }
    }

    /// Check whether the file name on disk is valid UTF-8
    #[inline]
    #[must_use]
    pub fn is_utf8(&self) -> bool {
        !self.lossy
    }

    /// File name including extension
    #[inline]
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Full path as listed
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lowercase extension, if any
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// File name without extension
    #[must_use]
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }

    /// Check the extension against an accepted set (case-insensitive)
    #[must_use]
    pub fn has_extension(&self, accepted: &[String]) -> bool {
        self.extension()
            .is_some_and(|ext| accepted.iter().any(|a| a.eq_ignore_ascii_case(&ext)))
    }

    /// Decode the attributes encoded in the file name
    ///
    /// # Errors
    /// Returns [`AssetNameError`] when the name is not UTF-8 or fails
    /// `grammar`, when the extension is not accepted, or when a number does
    /// not parse.
    pub fn parse(
        &self,
        grammar: AssetGrammar,
        accepted_extensions: &[String],
    ) -> Result<AssetAttributes, AssetNameError> {
        if self.lossy {
            return Err(AssetNameError::NotUtf8);
        }
        let captures = grammar
            .pattern()
            .captures(&self.file_name)
            .ok_or(AssetNameError::PatternMismatch {
                expected: grammar.shape(),
            })?;

        let extension = captures["ext"].to_ascii_lowercase();
        if !accepted_extensions
            .iter()
            .any(|a| a.eq_ignore_ascii_case(&extension))
        {
            return Err(AssetNameError::UnsupportedExtension {
                extension,
                accepted: accepted_extensions.join(", "),
            });
        }

        let numeric = |component: &'static str| {
            move |source: NumericParseError| AssetNameError::Numeric { component, source }
        };

        Ok(AssetAttributes {
            name: captures["name"].trim().to_string(),
            volume: parse_numeric(&captures["volume"]).map_err(numeric("volume"))?,
            box_quantity: parse_box_quantity(&captures["box"]).map_err(numeric("box quantity"))?,
            percentage: parse_numeric(&captures["pct"]).map_err(numeric("percentage"))?,
            extension,
        })
    }
}

/// Attributes decoded from an asset file name
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetAttributes {
    /// Product name as written in the file name
    pub name: String,
    /// Volume
    pub volume: f64,
    /// Bottles per box
    pub box_quantity: u32,
    /// Alcohol percentage
    pub percentage: f64,
    /// Lowercase extension
    pub extension: String,
}
