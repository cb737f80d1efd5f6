use anyhow::{anyhow, Context, Result};
use arrow::{
    array::{
        Array, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
        Int8Array, LargeStringArray, StringArray, UInt16Array, UInt32Array, UInt8Array,
    },
    datatypes::{DataType, Schema},
    record_batch::RecordBatch,
    util::display::array_value_to_string,
};
use rusqlite::{params_from_iter, types::Value, Connection};
use std::path::Path;
use tracing::{debug, info};

/// Map an Arrow DataType onto a SQLite column type.
///
/// - Int*, UInt*, Boolean → INTEGER
/// - Float32, Float64     → REAL
/// - everything else      → TEXT
pub fn sqlite_type(dt: &DataType) -> &'static str {
    match dt {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::Boolean => "INTEGER",
        DataType::Float32 | DataType::Float64 => "REAL",
        _ => "TEXT",
    }
}

pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn create_table_sql(table: &str, schema: &Schema) -> String {
    let cols: Vec<String> = schema
        .fields()
        .iter()
        .map(|f| {
            let not_null = if f.is_nullable() { "" } else { " NOT NULL" };
            format!(
                "{} {}{}",
                quote_ident(f.name()),
                sqlite_type(f.data_type()),
                not_null
            )
        })
        .collect();
    format!("CREATE TABLE {} ({});", quote_ident(table), cols.join(", "))
}

fn insert_sql(table: &str, schema: &Schema) -> String {
    let names: Vec<String> = schema.fields().iter().map(|f| quote_ident(f.name())).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        names.join(", "),
        placeholders.join(", ")
    )
}

macro_rules! downcast_value {
    ($array:expr, $ty:ty, $row:expr, $variant:path, $conv:expr) => {{
        let arr = $array
            .as_any()
            .downcast_ref::<$ty>()
            .ok_or_else(|| anyhow!("array does not match its data type {:?}", $array.data_type()))?;
        $variant($conv(arr.value($row)))
    }};
}

/// One cell as a SQLite value; nulls map to NULL.
fn sql_value(array: &dyn Array, row: usize) -> Result<Value> {
    if array.is_null(row) {
        return Ok(Value::Null);
    }
    let value = match array.data_type() {
        DataType::Int8 => downcast_value!(array, Int8Array, row, Value::Integer, i64::from),
        DataType::Int16 => downcast_value!(array, Int16Array, row, Value::Integer, i64::from),
        DataType::Int32 => downcast_value!(array, Int32Array, row, Value::Integer, i64::from),
        DataType::Int64 => downcast_value!(array, Int64Array, row, Value::Integer, i64::from),
        DataType::UInt8 => downcast_value!(array, UInt8Array, row, Value::Integer, i64::from),
        DataType::UInt16 => downcast_value!(array, UInt16Array, row, Value::Integer, i64::from),
        DataType::UInt32 => downcast_value!(array, UInt32Array, row, Value::Integer, i64::from),
        DataType::Boolean => downcast_value!(array, BooleanArray, row, Value::Integer, i64::from),
        DataType::Float32 => downcast_value!(array, Float32Array, row, Value::Real, f64::from),
        DataType::Float64 => downcast_value!(array, Float64Array, row, Value::Real, f64::from),
        DataType::Utf8 => downcast_value!(array, StringArray, row, Value::Text, str::to_string),
        DataType::LargeUtf8 => {
            downcast_value!(array, LargeStringArray, row, Value::Text, str::to_string)
        }
        _ => Value::Text(array_value_to_string(array, row)?),
    };
    Ok(value)
}

/// Write `batch` into `table` of the SQLite database at `db_path`, replacing
/// any existing table of that name. Drop, create and insert run in a single
/// transaction. Returns the number of rows written.
#[tracing::instrument(level = "info", skip(batch, db_path), fields(path = %db_path.as_ref().display(), rows = batch.num_rows()))]
pub fn save_data<P: AsRef<Path>>(batch: &RecordBatch, db_path: P, table: &str) -> Result<usize> {
    let db_path = db_path.as_ref();
    let mut conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let schema = batch.schema();
    let tx = conn.transaction().context("starting write transaction")?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_ident(table)))
        .with_context(|| format!("dropping table {}", table))?;
    tx.execute_batch(&create_table_sql(table, &schema))
        .with_context(|| format!("creating table {}", table))?;
    debug!(columns = schema.fields().len(), "created table");

    {
        let mut stmt = tx
            .prepare(&insert_sql(table, &schema))
            .context("preparing insert statement")?;
        for row in 0..batch.num_rows() {
            let values = batch
                .columns()
                .iter()
                .map(|c| sql_value(c.as_ref(), row))
                .collect::<Result<Vec<Value>>>()?;
            stmt.execute(params_from_iter(values))
                .with_context(|| format!("inserting row {} into {}", row, table))?;
        }
    }
    tx.commit().context("committing write transaction")?;

    info!(table, rows = batch.num_rows(), "table written");
    Ok(batch.num_rows())
}

/// Number of rows currently in `table`.
pub fn count_rows<P: AsRef<Path>>(db_path: P, table: &str) -> Result<i64> {
    let conn = open_existing(db_path.as_ref())?;
    let count = conn
        .query_row(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)), [], |r| r.get(0))
        .with_context(|| format!("counting rows of {}", table))?;
    Ok(count)
}

/// Column names and declared types of `table`, in order.
pub fn table_columns<P: AsRef<Path>>(db_path: P, table: &str) -> Result<Vec<(String, String)>> {
    let conn = open_existing(db_path.as_ref())?;
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let cols = stmt
        .query_map([], |r| Ok((r.get::<_, String>(1)?, r.get::<_, String>(2)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("reading columns of {}", table))?;
    Ok(cols)
}

fn open_existing(db_path: &Path) -> Result<Connection> {
    if !db_path.is_file() {
        anyhow::bail!("database `{}` does not exist", db_path.display());
    }
    Connection::open(db_path)
        .with_context(|| format!("Failed to open database {}", db_path.display()))
}
