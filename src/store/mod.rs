pub mod snapshot;
pub mod sqlite;

pub use snapshot::write_parquet_snapshot;
pub use sqlite::{count_rows, save_data, table_columns};
