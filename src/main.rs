use anyhow::Result;
use clap::{error::ErrorKind, Parser};
use disaster_etl::{
    config::{DEFAULT_RELEVANCE_LABEL, DEFAULT_TABLE_NAME},
    pipeline, PipelineConfig,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

const USAGE: &str = "Please provide the filepaths of the messages and categories \
datasets as the first and second argument respectively, as well as the filepath \
of the database to save the cleaned data to as the third argument.\n\n\
Example: disaster_etl disaster_messages.csv disaster_categories.csv DisasterResponse.db";

#[derive(Parser, Debug)]
#[command(name = "disaster_etl")]
#[command(about = "Merge, clean and store the disaster response message datasets")]
#[command(version)]
struct Cli {
    /// Messages CSV, keyed by `id`
    messages: PathBuf,
    /// Categories CSV, keyed by `id`, with a packed `categories` column
    categories: PathBuf,
    /// SQLite database to write the cleaned table into
    database: PathBuf,

    /// Destination table, replaced on every run
    #[arg(long, default_value = DEFAULT_TABLE_NAME)]
    table: String,

    /// Category whose value 2 marks a row as invalid
    #[arg(long, default_value = DEFAULT_RELEVANCE_LABEL)]
    relevance_label: String,

    /// Also write the cleaned table as a Parquet file
    #[arg(long)]
    parquet_out: Option<PathBuf>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    // ─── 2) parse arguments ──────────────────────────────────────────
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(_) => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    let config = PipelineConfig {
        relevance_label: cli.relevance_label,
        table_name: cli.table,
        parquet_out: cli.parquet_out,
        ..PipelineConfig::default()
    };

    // ─── 3) run ──────────────────────────────────────────────────────
    let summary = pipeline::run(&cli.messages, &cli.categories, &cli.database, &config)?;
    info!(
        merged = summary.merged_rows,
        cleaned = summary.cleaned_rows,
        written = summary.written_rows,
        "all done"
    );
    Ok(())
}
