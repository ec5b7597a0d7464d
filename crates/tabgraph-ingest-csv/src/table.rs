//! Raw delimited tables: a header row plus string cells, stored column-wise.

use std::path::Path;
use tabgraph_schema::{DataError, Result};

/// A table exactly as read from disk, before any typing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    source: String,
    headers: Vec<String>,
    columns: Vec<Vec<String>>,
    rows: usize,
}

impl RawTable {
    /// Build a table from named columns. All columns must have the same length.
    pub fn from_columns(
        source: impl Into<String>,
        columns: Vec<(String, Vec<String>)>,
    ) -> Result<Self> {
        let source = source.into();
        let rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut table = RawTable {
            source,
            rows,
            ..Default::default()
        };
        for (name, cells) in columns {
            if cells.len() != rows {
                return Err(DataError::shape(
                    format!("column `{name}` of {}", table.source),
                    rows,
                    cells.len(),
                ));
            }
            table.headers.push(name);
            table.columns.push(cells);
        }
        Ok(table)
    }

    /// Where the table came from (a file path, or a caller-chosen label).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn num_rows(&self) -> usize {
        self.rows
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Option<&[String]> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Remove a column from the table and hand its cells back.
    pub fn take_column(&mut self, name: &str) -> Option<Vec<String>> {
        let i = self.headers.iter().position(|h| h == name)?;
        self.headers.remove(i);
        Some(self.columns.remove(i))
    }

    /// Remove every unnamed index column, returning the dropped headers.
    pub fn drop_unnamed_columns(&mut self) -> Vec<String> {
        let mut dropped = Vec::new();
        let mut i = 0;
        while i < self.headers.len() {
            if is_unnamed_column(&self.headers[i]) {
                dropped.push(self.headers.remove(i));
                self.columns.remove(i);
            } else {
                i += 1;
            }
        }
        dropped
    }

    /// `(header, cells)` pairs in header order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter().map(Vec::as_slice))
    }
}

/// True for the blank-header index column that naive table serialization
/// writes in front of the data (`""`, or pandas' `Unnamed: 0`).
pub fn is_unnamed_column(header: &str) -> bool {
    header.trim().is_empty() || header.starts_with("Unnamed:")
}

/// Read a delimited table with a header row.
pub fn read_table(path: &Path, separator: u8) -> Result<RawTable> {
    let source = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(separator)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    for (i, header) in headers.iter().enumerate() {
        if !is_unnamed_column(header) && headers[..i].contains(header) {
            return Err(DataError::parse(
                header.clone(),
                format!("duplicate column header in {source}"),
            ));
        }
    }

    let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    let mut rows = 0;
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, e))?;
        for (column, cell) in columns.iter_mut().zip(record.iter()) {
            column.push(cell.to_string());
        }
        rows += 1;
    }

    Ok(RawTable {
        source,
        headers,
        columns,
        rows,
    })
}

fn csv_error(path: &Path, err: csv::Error) -> DataError {
    if err.is_io_error() {
        if let csv::ErrorKind::Io(io) = err.into_kind() {
            return DataError::io(path, io);
        }
        return DataError::io(
            path,
            std::io::Error::new(std::io::ErrorKind::Other, "csv read failed"),
        );
    }
    DataError::parse("<table>", format!("{}: {err}", path.display()))
}
