//! CSV ingress and egress for catalog tables
//!
//! Reading keeps every column in header order. Writing serializes the whole
//! table in memory first so a failed run never leaves a half-written file.

use crate::error::TableError;
use catalink_model::{CatalogRow, CatalogTable};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

/// Read a table with a header row
///
/// `origin` is only used in error messages.
///
/// # Errors
/// - `TableError::MissingHeader` if the input is empty
/// - `TableError::DuplicateColumn` if a header repeats
/// - `TableError::Csv` on malformed records or ragged rows
pub fn read_table<R: Read>(
    reader: R,
    delimiter: u8,
    origin: &Path,
) -> Result<CatalogTable, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| TableError::csv_error(origin, e))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(TableError::MissingHeader {
            path: origin.to_path_buf(),
        });
    }

    let mut seen = HashSet::new();
    if let Some(column) = headers.iter().find(|h| !seen.insert(h.as_str())) {
        return Err(TableError::DuplicateColumn {
            path: origin.to_path_buf(),
            column: column.clone(),
        });
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| TableError::csv_error(origin, e))?;
        let fields: IndexMap<String, String> = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(CatalogRow::new(index + 1, fields));
    }

    Ok(CatalogTable::new(headers, rows))
}

/// Write a table, header first, cells in header order
///
/// # Errors
/// Returns `TableError` if serialization or the underlying writer fails.
pub fn write_table<W: Write>(
    table: &CatalogTable,
    writer: W,
    delimiter: u8,
    origin: &Path,
) -> Result<(), TableError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    writer
        .write_record(table.headers())
        .map_err(|e| TableError::csv_error(origin, e))?;
    for row in table.rows() {
        writer
            .write_record(table.record(row))
            .map_err(|e| TableError::csv_error(origin, e))?;
    }
    writer
        .flush()
        .map_err(|e| TableError::io_error(origin, e))?;
    Ok(())
}

/// Serialize a table into a byte buffer
///
/// # Errors
/// Same as [`write_table`].
pub fn encode_table(
    table: &CatalogTable,
    delimiter: u8,
    origin: &Path,
) -> Result<Vec<u8>, TableError> {
    let mut buffer = Vec::new();
    write_table(table, &mut buffer, delimiter, origin)?;
    Ok(buffer)
}
