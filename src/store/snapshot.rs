use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    path::Path,
};
use tracing::info;

/// Write the cleaned table to a single Parquet file, replacing any existing file.
/// Returns the size on disk in bytes.
pub fn write_parquet_snapshot<P: AsRef<Path>>(batch: &RecordBatch, output_path: P) -> Result<u64> {
    let output_path = output_path.as_ref();
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }

    let file = File::create(output_path)
        .with_context(|| format!("creating file {}", output_path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating parquet writer")?;
    writer.write(batch).context("writing batch to parquet")?;
    writer.close().context("closing parquet writer")?;

    let bytes = fs::metadata(output_path)
        .context("getting file metadata")?
        .len();
    info!(path = %output_path.display(), bytes, "wrote parquet snapshot");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::{
        array::{Int64Array, StringArray},
        datatypes::{DataType, Field, Schema},
    };
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn snapshot_reads_back() -> Result<()> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("message", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(StringArray::from(vec![Some("help"), None])),
            ],
        )?;

        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("clean.parquet");
        let bytes = write_parquet_snapshot(&batch, &path)?;
        assert!(bytes > 0);

        let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(&path)?)?.build()?;
        let batches = reader.collect::<Result<Vec<_>, _>>()?;
        assert_eq!(batches.iter().map(|b| b.num_rows()).sum::<usize>(), 2);
        assert_eq!(batches[0].schema().field(1).name(), "message");
        Ok(())
    }
}
