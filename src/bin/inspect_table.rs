use disaster_etl::config::DEFAULT_TABLE_NAME;
use disaster_etl::store::{count_rows, table_columns};
use std::{env, path::Path, process::exit};

fn main() {
    // Expect a database path and an optional table name.
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 && args.len() != 3 {
        eprintln!("Usage: {} <DATABASE> [TABLE]", args[0]);
        exit(1);
    }
    let table = args.get(2).map(String::as_str).unwrap_or(DEFAULT_TABLE_NAME);
    if let Err(e) = inspect_table(Path::new(&args[1]), table) {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

/// Print the column layout and row count of one table.
fn inspect_table(db_path: &Path, table: &str) -> anyhow::Result<()> {
    let columns = table_columns(db_path, table)?;
    if columns.is_empty() {
        anyhow::bail!("table `{}` not found in {}", table, db_path.display());
    }
    let rows = count_rows(db_path, table)?;

    println!("=== Table: {} ({}) ===", table, db_path.display());
    println!("Total rows:        {}", rows);
    println!("Number of columns: {}", columns.len());
    println!();

    println!("=== Columns ===");
    for (name, ty) in &columns {
        println!("- {:<30} | {}", name, ty);
    }
    Ok(())
}
