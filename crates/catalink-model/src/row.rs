//! Catalog rows and tables
//!
//! A [`CatalogTable`] is the in-memory form of the input spreadsheet. Rows
//! keep every column they were read with, in header order, so that a stage
//! can fill one field and write the rest back untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Column names the pipeline reads and writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnNames {
    /// Product name
    pub name: String,
    /// Volume, numeric or unit-suffixed
    pub volume: String,
    /// Bottles per box
    pub quantity_in_box: String,
    /// Alcohol percentage, optional
    pub percentage: String,
    /// Image reference, optional
    pub image_file: String,
    /// External product identifier, used in messages only
    pub product_id: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            name: "name".to_string(),
            volume: "volume".to_string(),
            quantity_in_box: "quantityInBox".to_string(),
            percentage: "percentage".to_string(),
            image_file: "imageFile".to_string(),
            product_id: "productId".to_string(),
        }
    }
}

/// One catalog row
///
/// Identity is positional: `position` is the 1-based index among data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    position: usize,
    fields: IndexMap<String, String>,
}

impl CatalogRow {
    /// Create row from ordered fields
    #[inline]
    #[must_use]
    pub fn new(position: usize, fields: IndexMap<String, String>) -> Self {
        Self { position, fields }
    }

    /// Build a row from `(column, value)` pairs
    #[must_use]
    pub fn from_pairs<K, V>(position: usize, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            position,
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// 1-based data row number
    #[inline]
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Raw cell value
    #[inline]
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Cell value, treating blank cells and `null` as absent
    #[must_use]
    pub fn present(&self, column: &str) -> Option<&str> {
        self.get(column)
            .map(str::trim)
            .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("null"))
    }

    /// Set a cell; new columns are appended after existing ones
    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.fields.insert(column.to_string(), value.into());
    }

    /// All fields in column order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &IndexMap<String, String> {
        &self.fields
    }

    /// Human-readable identity for messages
    ///
    /// Uses the product id when the row has one, the name otherwise.
    #[must_use]
    pub fn identifier(&self, columns: &ColumnNames) -> String {
        match (
            self.present(&columns.product_id),
            self.present(&columns.name),
        ) {
            (Some(id), Some(name)) => format!("{id} '{name}'"),
            (Some(id), None) => id.to_string(),
            (None, Some(name)) => format!("'{name}'"),
            (None, None) => format!("row {}", self.position),
        }
    }
}

/// Header plus rows
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CatalogTable {
    headers: Vec<String>,
    rows: Vec<CatalogRow>,
}

impl CatalogTable {
    /// Create table from headers and rows
    #[inline]
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<CatalogRow>) -> Self {
        Self { headers, rows }
    }

    /// Column names in output order
    #[inline]
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows in input order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[CatalogRow] {
        &self.rows
    }

    /// Mutable rows
    #[inline]
    pub fn rows_mut(&mut self) -> &mut [CatalogRow] {
        &mut self.rows
    }

    /// Number of data rows
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no data rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check if a column is in the header
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }

    /// Append a column to the header if missing
    ///
    /// Returns `true` if the column was added.
    pub fn ensure_column(&mut self, column: &str) -> bool {
        if self.has_column(column) {
            return false;
        }
        self.headers.push(column.to_string());
        true
    }

    /// Cells of one row in header order; missing cells are empty
    #[must_use]
    pub fn record(&self, row: &CatalogRow) -> Vec<String> {
        self.headers
            .iter()
            .map(|h| row.get(h).unwrap_or_default().to_string())
            .collect()
    }
}
