use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::PipelineConfig;
use crate::process::{clean_data, load_data};
use crate::store::{save_data, write_parquet_snapshot};

/// Row counts at each stage of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub merged_rows: usize,
    pub cleaned_rows: usize,
    pub written_rows: usize,
}

/// Load → clean → save, in that order, stopping at the first failure.
pub fn run<P, Q, R>(
    messages_path: P,
    categories_path: Q,
    database_path: R,
    config: &PipelineConfig,
) -> Result<RunSummary>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    info!(
        messages = %messages_path.as_ref().display(),
        categories = %categories_path.as_ref().display(),
        "Loading data..."
    );
    let merged = load_data(&messages_path, &categories_path, config)?;

    info!("Cleaning data...");
    let cleaned = clean_data(&merged, config).context("cleaning merged dataset")?;

    info!(database = %database_path.as_ref().display(), "Saving data...");
    let written = save_data(&cleaned, &database_path, &config.table_name)?;
    info!(table = %config.table_name, "Cleaned data saved to database!");

    // only snapshot runs whose database write went through
    if let Some(out) = &config.parquet_out {
        write_parquet_snapshot(&cleaned, out).context("writing parquet snapshot")?;
    }

    Ok(RunSummary {
        merged_rows: merged.num_rows(),
        cleaned_rows: cleaned.num_rows(),
        written_rows: written,
    })
}
