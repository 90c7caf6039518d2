//! CSV row reading.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::error::{Result, SyncError};

const BOM: char = '\u{feff}';

/// One data row: trimmed column name -> trimmed value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvRow {
    /// 1-based position among the data rows (header excluded).
    pub row_number: usize,
    fields: HashMap<String, String>,
}

impl CsvRow {
    pub fn new(row_number: usize, fields: HashMap<String, String>) -> Self {
        Self { row_number, fields }
    }

    /// Build a row from `(column, value)` pairs, trimming both.
    pub fn from_pairs<K, V>(row_number: usize, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.as_ref().trim().to_string(), v.as_ref().trim().to_string()))
            .collect();
        Self::new(row_number, fields)
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Issue key in `column`, or `None` when the cell is missing or blank.
    pub fn issue_key(&self, column: &str) -> Option<&str> {
        self.get(column).filter(|value| !value.is_empty())
    }

    /// Raw comma-separated names in `column`. Entries are not trimmed.
    pub fn milestone_list(&self, column: &str) -> Vec<String> {
        match self.get(column) {
            Some(value) if !value.is_empty() => value.split(',').map(ToString::to_string).collect(),
            _ => Vec::new(),
        }
    }
}

/// Read every data row of a CSV file, in file order.
pub fn read_rows(path: &Path) -> Result<Vec<CsvRow>> {
    let file = File::open(path).map_err(|err| {
        SyncError::InvalidInput(format!("cannot open CSV {}: {err}", path.display()))
    })?;
    let rows = from_reader(file)?;
    debug!(path = %path.display(), rows = rows.len(), "CSV loaded");
    Ok(rows)
}

/// Parse CSV data with a header row.
pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CsvRow>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = if idx == 0 {
                name.trim_start_matches(BOM)
            } else {
                name
            };
            name.trim().to_string()
        })
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let fields = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.clone(), value.trim().to_string()))
            .collect();
        rows.push(CsvRow::new(idx + 1, fields));
    }
    Ok(rows)
}
