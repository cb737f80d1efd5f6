use anyhow::Result;
use disaster_etl::{pipeline, store, PipelineConfig};
use rusqlite::Connection;
use std::{fs, path::Path};
use tempfile::TempDir;

const MESSAGES: &str = "\
id,message,original,genre
1,help,,direct
2,what is going on,,direct
3,\"we need water, food\",nou bezwen dlo,direct
3,\"we need water, food\",nou bezwen dlo,direct
4,no categories for me,,news
";

const CATEGORIES: &str = "\
id,categories
1,related-1;request-0;water-0
2,related-2;request-0;water-0
3,related-1;request-1;water-1
6,related-0;request-0;water-0
";

fn write_inputs(dir: &Path) -> Result<()> {
    fs::write(dir.join("messages.csv"), MESSAGES)?;
    fs::write(dir.join("categories.csv"), CATEGORIES)?;
    Ok(())
}

fn dump(db: &Path, table: &str) -> Result<Vec<(i64, Option<String>, i64, i64, i64)>> {
    let conn = Connection::open(db)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT id, message, related, request, water FROM \"{}\" ORDER BY rowid",
        table
    ))?;
    let rows = stmt
        .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

#[test]
fn end_to_end_cleans_and_stores() -> Result<()> {
    let dir = TempDir::new()?;
    write_inputs(dir.path())?;
    let db = dir.path().join("DisasterResponse.db");
    let config = PipelineConfig::default();

    let summary = pipeline::run(
        dir.path().join("messages.csv"),
        dir.path().join("categories.csv"),
        &db,
        &config,
    )?;

    // ids 1, 2, 3, 3 (x1 category), 4 (no category), 6 (no message)
    assert_eq!(summary.merged_rows, 6);
    assert_eq!(summary.cleaned_rows, 3);
    assert_eq!(summary.written_rows, 3);

    let rows = dump(&db, &config.table_name)?;
    assert_eq!(
        rows,
        vec![
            (1, Some("help".to_string()), 1, 0, 0),
            (3, Some("we need water, food".to_string()), 1, 1, 1),
            (6, None, 0, 0, 0),
        ]
    );
    Ok(())
}

#[test]
fn rerunning_replaces_instead_of_appending() -> Result<()> {
    let dir = TempDir::new()?;
    write_inputs(dir.path())?;
    let db = dir.path().join("out.db");
    let config = PipelineConfig::default();
    let messages = dir.path().join("messages.csv");
    let categories = dir.path().join("categories.csv");

    pipeline::run(&messages, &categories, &db, &config)?;
    let first = dump(&db, &config.table_name)?;
    pipeline::run(&messages, &categories, &db, &config)?;
    let second = dump(&db, &config.table_name)?;

    assert_eq!(first, second);
    assert_eq!(store::count_rows(&db, &config.table_name)?, 3);
    Ok(())
}

#[test]
fn custom_table_and_parquet_snapshot() -> Result<()> {
    let dir = TempDir::new()?;
    write_inputs(dir.path())?;
    let db = dir.path().join("out.db");
    let snapshot = dir.path().join("clean.parquet");
    let config = PipelineConfig {
        table_name: "messages_clean".into(),
        parquet_out: Some(snapshot.clone()),
        ..PipelineConfig::default()
    };

    pipeline::run(
        dir.path().join("messages.csv"),
        dir.path().join("categories.csv"),
        &db,
        &config,
    )?;

    assert!(snapshot.is_file());
    assert_eq!(store::count_rows(&db, "messages_clean")?, 3);
    let columns: Vec<String> = store::table_columns(&db, "messages_clean")?
        .into_iter()
        .map(|(name, _)| name)
        .collect();
    assert_eq!(
        columns,
        vec!["id", "message", "original", "genre", "related", "request", "water"]
    );
    Ok(())
}

#[test]
fn missing_input_file_aborts_before_writing() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(dir.path().join("categories.csv"), CATEGORIES)?;
    let db = dir.path().join("out.db");

    let err = pipeline::run(
        dir.path().join("messages.csv"),
        dir.path().join("categories.csv"),
        &db,
        &PipelineConfig::default(),
    )
    .unwrap_err();

    assert!(format!("{:#}", err).contains("loading messages dataset"));
    assert!(!db.exists());
    Ok(())
}

#[test]
fn message_text_is_stored_as_read() -> Result<()> {
    let dir = TempDir::new()?;
    fs::write(
        dir.path().join("messages.csv"),
        "id,message,original,genre\n1,\"  help me  \",\" \",direct\n",
    )?;
    fs::write(
        dir.path().join("categories.csv"),
        "id,categories\n1,related-1;request-0\n",
    )?;
    let db = dir.path().join("out.db");
    let config = PipelineConfig::default();

    pipeline::run(
        dir.path().join("messages.csv"),
        dir.path().join("categories.csv"),
        &db,
        &config,
    )?;

    let conn = Connection::open(&db)?;
    let (message, original): (Option<String>, Option<String>) = conn.query_row(
        &format!("SELECT message, original FROM \"{}\"", config.table_name),
        [],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    assert_eq!(message.as_deref(), Some("  help me  "));
    assert_eq!(original.as_deref(), Some(" "));
    Ok(())
}

#[test]
fn failed_save_leaves_no_snapshot() -> Result<()> {
    let dir = TempDir::new()?;
    write_inputs(dir.path())?;
    let db = dir.path().join("missing").join("out.db");
    let snapshot = dir.path().join("clean.parquet");
    let config = PipelineConfig {
        parquet_out: Some(snapshot.clone()),
        ..PipelineConfig::default()
    };

    let err = pipeline::run(
        dir.path().join("messages.csv"),
        dir.path().join("categories.csv"),
        &db,
        &config,
    )
    .unwrap_err();

    assert!(format!("{:#}", err).contains("Failed to open database"));
    assert!(!snapshot.exists());
    Ok(())
}
