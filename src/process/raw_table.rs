use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{fs::File, io::BufReader, path::Path};
use tracing::debug;

use crate::error::EtlError;

#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Column names, from the header row of the file.
    pub headers: Vec<String>,
    /// Each data record, one String per header.
    pub rows: Vec<Vec<String>>,
    /// Where the table came from; used in error messages.
    pub source_name: String,
}

impl RawTable {
    /// Index of `column` in the header row.
    pub fn column_index(&self, column: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| {
                anyhow::Error::from(EtlError::MissingColumn {
                    column: column.to_string(),
                    source_name: self.source_name.clone(),
                })
            })
    }

    /// Parse the `column` field of every row as an integer key.
    pub fn integer_keys(&self, column: &str) -> Result<Vec<i64>> {
        let idx = self.column_index(column)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(row, fields)| {
                let raw = fields[idx].trim();
                raw.parse::<i64>().map_err(|_| {
                    anyhow::Error::from(EtlError::InvalidId {
                        source_name: self.source_name.clone(),
                        row,
                        value: raw.to_string(),
                    })
                })
            })
            .collect()
    }
}

/// Read a delimited text file with a header row into memory.
///
/// Records with a different field count than the header are rejected.
#[tracing::instrument(level = "debug", skip(path), fields(path = %path.as_ref().display()))]
pub fn read_delimited<P: AsRef<Path>>(path: P, delimiter: u8) -> Result<RawTable> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .from_reader(BufReader::new(file));

    let headers: Vec<String> = rdr
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result
            .with_context(|| format!("CSV parse error in {} at record {}", path.display(), idx))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    debug!(columns = headers.len(), rows = rows.len(), "read table");

    Ok(RawTable {
        headers,
        rows,
        source_name: path.display().to_string(),
    })
}
