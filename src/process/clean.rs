use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{Array, ArrayRef, BooleanArray, Int64Array, Int64Builder, StringArray, UInt32Array},
    compute::{filter_record_batch, take},
    datatypes::{DataType, Field, FieldRef, Schema},
    record_batch::RecordBatch,
    row::{RowConverter, SortField},
};
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::error::EtlError;
use crate::process::categories::{decode_packed, CategoryLabels};

/// Relevance values at or above this mark an invalid row.
pub const RELEVANCE_INVALID: i64 = 2;

/// Decode the packed column, drop invalid-relevance rows and exact duplicates.
#[tracing::instrument(level = "info", skip_all, fields(rows = batch.num_rows()))]
pub fn clean_data(batch: &RecordBatch, config: &PipelineConfig) -> Result<RecordBatch> {
    let (expanded, labels) = expand_categories(batch, config)?;
    if labels.position(&config.relevance_label).is_none() {
        return Err(EtlError::UnknownRelevanceLabel(config.relevance_label.clone()).into());
    }
    info!(labels = labels.len(), "decoded category columns");

    let relevant = filter_relevant(&expanded, &config.relevance_label)?;
    let deduped = drop_duplicates(&relevant)?;
    info!(
        invalid = expanded.num_rows() - relevant.num_rows(),
        duplicates = relevant.num_rows() - deduped.num_rows(),
        remaining = deduped.num_rows(),
        "cleaned table"
    );
    Ok(deduped)
}

/// Replace the packed column with one Int64 column per category label.
///
/// Labels are derived from the first non-null packed value. The new columns
/// are appended after the remaining original columns; rows without a packed
/// value get nulls.
pub fn expand_categories(
    batch: &RecordBatch,
    config: &PipelineConfig,
) -> Result<(RecordBatch, CategoryLabels)> {
    let schema = batch.schema();
    let packed_idx = schema.index_of(&config.packed_column).map_err(|_| {
        anyhow::Error::from(EtlError::MissingColumn {
            column: config.packed_column.clone(),
            source_name: "merged table".into(),
        })
    })?;
    let packed = batch
        .column(packed_idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| anyhow!("column `{}` is not a string column", config.packed_column))?;
    let key_idx = schema.index_of(&config.key_column).map_err(|_| {
        anyhow::Error::from(EtlError::MissingColumn {
            column: config.key_column.clone(),
            source_name: "merged table".into(),
        })
    })?;
    let keys = batch
        .column(key_idx)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| anyhow!("key column `{}` is not Int64", config.key_column))?;

    let sample = packed
        .iter()
        .flatten()
        .next()
        .ok_or_else(|| EtlError::NoCategorySample(config.packed_column.clone()))?;
    let labels = CategoryLabels::from_sample(sample.trim());
    debug!(labels = ?labels.labels(), "derived category labels");

    let mut builders: Vec<Int64Builder> = (0..labels.len())
        .map(|_| Int64Builder::with_capacity(packed.len()))
        .collect();
    let mut relabeled = 0usize;
    for (row, value) in packed.iter().enumerate() {
        match value {
            Some(s) => {
                let s = s.trim();
                let values = decode_packed(s, &labels, row, keys.value(row))?;
                if !labels.matches(s) {
                    relabeled += 1;
                }
                for (b, v) in builders.iter_mut().zip(values) {
                    b.append_value(v);
                }
            }
            None => builders.iter_mut().for_each(|b| b.append_null()),
        }
    }
    if relabeled > 0 {
        warn!(
            rows = relabeled,
            "packed categories use labels that differ from the sample row; values kept by position"
        );
    }

    let mut fields: Vec<FieldRef> = Vec::with_capacity(schema.fields().len() - 1 + labels.len());
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(fields.capacity());
    for (i, field) in schema.fields().iter().enumerate() {
        if i != packed_idx {
            fields.push(field.clone());
            columns.push(batch.column(i).clone());
        }
    }
    for (label, mut b) in labels.labels().iter().zip(builders) {
        fields.push(Arc::new(Field::new(label, DataType::Int64, true)));
        columns.push(Arc::new(b.finish()));
    }

    let expanded = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .context("building expanded record batch")?;
    Ok((expanded, labels))
}

/// Keep only rows whose `label` column holds a value below [`RELEVANCE_INVALID`].
/// Null values are not below anything and are dropped.
pub fn filter_relevant(batch: &RecordBatch, label: &str) -> Result<RecordBatch> {
    let idx = batch
        .schema()
        .index_of(label)
        .map_err(|_| EtlError::UnknownRelevanceLabel(label.to_string()))?;
    let values = batch
        .column(idx)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| anyhow!("relevance column `{}` is not Int64", label))?;

    let mask: BooleanArray = values
        .iter()
        .map(|v| Some(matches!(v, Some(x) if x < RELEVANCE_INVALID)))
        .collect();
    filter_record_batch(batch, &mask).context("filtering invalid rows")
}

/// Remove exact full-row duplicates, keeping the first occurrence of each.
/// Nulls compare equal to each other.
pub fn drop_duplicates(batch: &RecordBatch) -> Result<RecordBatch> {
    let converter = RowConverter::new(
        batch
            .schema()
            .fields()
            .iter()
            .map(|f| SortField::new(f.data_type().clone()))
            .collect(),
    )?;
    let rows = converter.convert_columns(batch.columns())?;

    let mut seen = HashSet::with_capacity(rows.num_rows());
    let keep: Vec<u32> = (0..rows.num_rows())
        .filter(|&i| seen.insert(rows.row(i)))
        .map(|i| i as u32)
        .collect();
    if keep.len() == batch.num_rows() {
        return Ok(batch.clone());
    }

    let indices = UInt32Array::from(keep);
    let columns = batch
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &indices, None))
        .collect::<Result<Vec<_>, _>>()?;
    RecordBatch::try_new(batch.schema(), columns).context("building deduplicated record batch")
}
