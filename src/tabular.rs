//! CSV ingest and export
//!
//! Ingest is deliberately forgiving: exports from field devices are often
//! Latin-1 and carry the odd truncated line. Decoding tries UTF-8 first and
//! falls back to Latin-1; lines the reader rejects, or whose field count does
//! not match the header, are skipped instead of failing the whole upload.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::ValidationError;
use crate::record::{Fields, Record, Value};
use crate::Result;

const UTF8_BOM: &str = "\u{feff}";

/// Parsed table: ordered header plus rows of classified cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build a table from already-classified rows.
    ///
    /// Rows shorter than the header are padded with `Null`, longer rows are
    /// truncated, so every row lines up with `columns`.
    #[must_use]
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Value::Null);
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Column names in file order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Data rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when there are no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of column `index`, top to bottom.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Turn every row into a fresh [`Record`].
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| {
                let data: Fields = columns.iter().cloned().zip(row).collect();
                Record::new(data)
            })
            .collect()
    }
}

/// Decode bytes, UTF-8 first and Latin-1 on failure.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string(),
        Err(e) => {
            debug!(error = %e, "input is not UTF-8, decoding as Latin-1");
            bytes.iter().map(|&b| char::from(b)).collect()
        }
    }
}

/// Make header names usable as record keys.
///
/// Blank names become `Unnamed: <index>`, repeated names get a `.N` suffix.
fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.enumerate()
        .map(|(i, name)| {
            let base = match name.trim() {
                "" => format!("Unnamed: {i}"),
                trimmed => trimmed.to_string(),
            };
            let mut candidate = base.clone();
            let mut suffix = 1;
            while !seen.insert(candidate.clone()) {
                candidate = format!("{base}.{suffix}");
                suffix += 1;
            }
            candidate
        })
        .collect()
}

/// Parse CSV bytes into a [`Table`].
///
/// # Errors
///
/// Returns `Validation(EmptyDataset)` if no data row survives parsing, and a
/// CSV error if the header line itself cannot be read.
pub fn parse_table(bytes: &[u8]) -> Result<Table> {
    let text = decode(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns = normalize_headers(reader.headers()?.iter());
    if columns.is_empty() {
        return Err(ValidationError::EmptyDataset.into());
    }

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for (line, result) in reader.records().enumerate() {
        match result {
            Ok(record) if record.len() == columns.len() => {
                rows.push(record.iter().map(Value::parse).collect());
            }
            Ok(record) => {
                skipped += 1;
                debug!(
                    line = line + 2,
                    expected = columns.len(),
                    found = record.len(),
                    "skipping malformed line"
                );
            }
            Err(e) => {
                skipped += 1;
                debug!(line = line + 2, error = %e, "skipping unreadable line");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, kept = rows.len(), "skipped malformed CSV lines");
    }
    if rows.is_empty() {
        return Err(ValidationError::EmptyDataset.into());
    }

    Ok(Table { columns, rows })
}

/// Column order for an export: `preferred` first, then any other field in
/// first-seen order across `records`.
#[must_use]
pub fn export_columns(preferred: &[String], records: &[Record]) -> Vec<String> {
    let mut columns = preferred.to_vec();
    let mut seen: HashSet<&str> = preferred.iter().map(String::as_str).collect();
    for record in records {
        for key in record.data().keys() {
            if seen.insert(key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Render records as CSV bytes with the given header.
///
/// Absent and null fields become empty cells.
///
/// # Errors
///
/// Returns a CSV or IO error if writing fails.
pub fn write_csv(columns: &[String], records: &[Record]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for record in records {
        writer.write_record(
            columns
                .iter()
                .map(|c| record.get(c).map(ToString::to_string).unwrap_or_default()),
        )?;
    }

    writer.flush()?;
    writer
        .into_inner()
        .map_err(|e| crate::Error::Other(format!("Failed to finish CSV export: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_parse_table_classifies_cells() {
        let table = parse_table(b"temp,site,pressure\n20.5,north,1001\n21,south,\n").unwrap();

        assert_eq!(table.columns(), ["temp", "site", "pressure"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[0][0], Value::Number(20.5));
        assert_eq!(table.rows()[0][1], Value::Text("north".to_string()));
        assert_eq!(table.rows()[1][2], Value::Null);
    }

    #[test]
    fn test_parse_table_skips_malformed_lines() {
        let table = parse_table(b"a,b\n1,2\n3\n4,5,6\n7,8\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows()[1], vec![Value::Number(7.0), Value::Number(8.0)]);
    }

    #[test]
    fn test_parse_table_latin1_fallback() {
        // "ort" column holds "Köln" encoded as Latin-1 (0xF6)
        let bytes = b"ort,temp\nK\xf6ln,12\n";
        let table = parse_table(bytes).unwrap();
        assert_eq!(table.rows()[0][0], Value::Text("Köln".to_string()));
        assert_eq!(table.rows()[0][1], Value::Number(12.0));
    }

    #[test]
    fn test_parse_table_strips_bom() {
        let table = parse_table("\u{feff}x,y\n1,2\n".as_bytes()).unwrap();
        assert_eq!(table.columns(), ["x", "y"]);
    }

    #[test]
    fn test_parse_table_empty_is_rejected() {
        for input in [&b""[..], b"a,b\n", b"a,b\n1\n"] {
            let err = parse_table(input).unwrap_err();
            assert!(matches!(
                err,
                Error::Validation(ValidationError::EmptyDataset)
            ));
        }
    }

    #[test]
    fn test_headers_are_normalized() {
        let table = parse_table(b"a,,a,a\n1,2,3,4\n").unwrap();
        assert_eq!(table.columns(), ["a", "Unnamed: 1", "a.1", "a.2"]);
    }

    #[test]
    fn test_write_csv_and_export_columns() {
        let records = vec![
            Record::new(Fields::from([
                ("temp".to_string(), Value::Number(20.5)),
                ("note".to_string(), Value::from("ok, fine")),
            ])),
            Record::new(Fields::from([("temp".to_string(), Value::Null)])),
        ];

        let columns = export_columns(&["temp".to_string()], &records);
        assert_eq!(columns, ["temp", "note"]);

        let bytes = write_csv(&columns, &records).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "temp,note\n20.5,\"ok, fine\"\n,\n");
    }

    #[test]
    fn test_export_columns_follow_upload_order() {
        let records = parse_table(b"temp,humidity,pressure\n20,40,1012\n")
            .unwrap()
            .into_records();

        let columns = export_columns(&[], &records);
        assert_eq!(columns, ["temp", "humidity", "pressure"]);
    }
}
