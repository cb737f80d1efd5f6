use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Int64Array, StringArray},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{collections::BTreeMap, path::Path, sync::Arc};
use tracing::info;

use crate::config::PipelineConfig;
use crate::process::raw_table::{read_delimited, RawTable};
use crate::process::utils::clean_field;

/// One output row of the join: the key plus the matching row index on each side.
type JoinedRow = (i64, Option<usize>, Option<usize>);

/// Read the messages and categories files and full-outer-join them on the key column.
#[tracing::instrument(level = "info", skip_all, fields(
    messages = %messages_path.as_ref().display(),
    categories = %categories_path.as_ref().display()
))]
pub fn load_data<P: AsRef<Path>, Q: AsRef<Path>>(
    messages_path: P,
    categories_path: Q,
    config: &PipelineConfig,
) -> Result<RecordBatch> {
    let messages = read_delimited(&messages_path, config.delimiter)
        .context("loading messages dataset")?;
    let categories = read_delimited(&categories_path, config.delimiter)
        .context("loading categories dataset")?;

    let merged = outer_join(&messages, &categories, &config.key_column)?;
    info!(
        messages = messages.rows.len(),
        categories = categories.rows.len(),
        merged = merged.num_rows(),
        "joined datasets"
    );
    Ok(merged)
}

/// Full outer join of two string tables on an integer `key` column.
///
/// Rows come out ordered by key. Keys present on both sides produce every
/// left/right pairing; keys present on one side keep that side's rows with
/// the other side's columns null. Non-key column names shared by both sides
/// get `_x` / `_y` suffixes.
pub fn outer_join(left: &RawTable, right: &RawTable, key: &str) -> Result<RecordBatch> {
    let left_key = left.column_index(key)?;
    let right_key = right.column_index(key)?;

    let mut groups: BTreeMap<i64, (Vec<usize>, Vec<usize>)> = BTreeMap::new();
    for (row, k) in left.integer_keys(key)?.into_iter().enumerate() {
        groups.entry(k).or_default().0.push(row);
    }
    for (row, k) in right.integer_keys(key)?.into_iter().enumerate() {
        groups.entry(k).or_default().1.push(row);
    }

    let mut joined: Vec<JoinedRow> = Vec::new();
    for (k, (lrows, rrows)) in &groups {
        let lside = side_rows(lrows);
        let rside = side_rows(rrows);
        for l in &lside {
            for r in &rside {
                joined.push((*k, *l, *r));
            }
        }
    }

    let left_cols: Vec<usize> = (0..left.headers.len()).filter(|&c| c != left_key).collect();
    let right_cols: Vec<usize> = (0..right.headers.len()).filter(|&c| c != right_key).collect();

    let mut fields = vec![Field::new(key, DataType::Int64, false)];
    let mut columns: Vec<ArrayRef> = vec![Arc::new(Int64Array::from_iter_values(
        joined.iter().map(|(k, _, _)| *k),
    ))];

    for &c in &left_cols {
        let name = &left.headers[c];
        let shared = right_cols.iter().any(|&rc| &right.headers[rc] == name);
        fields.push(Field::new(suffixed(name, shared, "_x"), DataType::Utf8, true));
        let values: StringArray = joined
            .iter()
            .map(|(_, l, _)| l.and_then(|l| clean_field(&left.rows[l][c])))
            .collect();
        columns.push(Arc::new(values));
    }
    for &c in &right_cols {
        let name = &right.headers[c];
        let shared = left_cols.iter().any(|&lc| &left.headers[lc] == name);
        fields.push(Field::new(suffixed(name, shared, "_y"), DataType::Utf8, true));
        let values: StringArray = joined
            .iter()
            .map(|(_, _, r)| r.and_then(|r| clean_field(&right.rows[r][c])))
            .collect();
        columns.push(Arc::new(values));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .context("building joined record batch")
}

fn side_rows(rows: &[usize]) -> Vec<Option<usize>> {
    if rows.is_empty() {
        vec![None]
    } else {
        rows.iter().copied().map(Some).collect()
    }
}

fn suffixed(name: &str, shared: bool, suffix: &str) -> String {
    if shared {
        format!("{}{}", name, suffix)
    } else {
        name.to_string()
    }
}
