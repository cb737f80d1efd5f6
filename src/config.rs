use std::path::PathBuf;

/// Table the cleaned data lands in. Downstream training code reads it by this name.
pub const DEFAULT_TABLE_NAME: &str = "DisaterResponses";
pub const DEFAULT_KEY_COLUMN: &str = "id";
pub const DEFAULT_PACKED_COLUMN: &str = "categories";
pub const DEFAULT_RELEVANCE_LABEL: &str = "related";

/// Knobs for a single pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Identifier column shared by both input files.
    pub key_column: String,
    /// Column holding the `label-digit;label-digit;...` string.
    pub packed_column: String,
    /// Label whose value 2 marks a row as invalid.
    pub relevance_label: String,
    /// Field delimiter of both input files.
    pub delimiter: u8,
    /// Destination table, replaced on every run.
    pub table_name: String,
    /// Optional Parquet snapshot of the cleaned table.
    pub parquet_out: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            key_column: DEFAULT_KEY_COLUMN.to_string(),
            packed_column: DEFAULT_PACKED_COLUMN.to_string(),
            relevance_label: DEFAULT_RELEVANCE_LABEL.to_string(),
            delimiter: b',',
            table_name: DEFAULT_TABLE_NAME.to_string(),
            parquet_out: None,
        }
    }
}
