use thiserror::Error;

/// Domain failures raised while loading or cleaning the datasets.
///
/// These are wrapped into `anyhow::Error` at the call sites, so callers that
/// care about the kind can `downcast_ref::<EtlError>()`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EtlError {
    #[error("column `{column}` not found in {source_name}")]
    MissingColumn { column: String, source_name: String },

    #[error("record {row} in {source_name}: identifier `{value}` is not an integer")]
    InvalidId {
        source_name: String,
        row: usize,
        value: String,
    },

    #[error("no row carries a packed `{0}` value to derive category labels from")]
    NoCategorySample(String),

    #[error("merged row {row} (id {id}): packed categories have {found} fields, expected {expected}")]
    SchemaMismatch {
        row: usize,
        id: i64,
        expected: usize,
        found: usize,
    },

    #[error("merged row {row} (id {id}): category field `{field}` does not end in a digit")]
    InvalidCategoryValue { row: usize, id: i64, field: String },

    #[error("relevance label `{0}` is not one of the derived category labels")]
    UnknownRelevanceLabel(String),
}
