// src/process/mod.rs
pub mod categories;
pub mod clean;
pub mod load;
pub mod raw_table;
pub mod utils;

pub use categories::{decode_packed, CategoryLabels};
pub use clean::{clean_data, drop_duplicates, expand_categories, filter_relevant};
pub use load::{load_data, outer_join};
pub use raw_table::{read_delimited, RawTable};
