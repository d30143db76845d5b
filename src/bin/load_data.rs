//! Load a videos.json export into PostgreSQL
//!
//! Run with: cargo run --bin load_data -- --schema videos.json

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use vidquery::db::schema::ensure_schema;
use vidquery::db::{init_pool, PoolSettings};
use vidquery::loader::{load_dataset, Dataset};
use vidquery::AppConfig;

#[derive(Parser)]
#[command(name = "load_data")]
#[command(about = "Import videos and their hourly snapshots")]
struct Args {
    /// Path to the JSON export with a top-level `videos` array
    #[arg(default_value = "videos.json")]
    path: PathBuf,

    /// Create the tables first if they do not exist
    #[arg(long)]
    schema: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    vidquery::observability::init_tracing();

    let args = Args::parse();
    let config = AppConfig::from_env().context("loading configuration")?;

    println!("📂 Reading {}", args.path.display());
    let dataset = Dataset::from_path(&args.path)
        .with_context(|| format!("reading {}", args.path.display()))?;
    println!(
        "   {} videos, {} snapshots",
        dataset.videos.len(),
        dataset.snapshot_count()
    );

    println!("📡 Connecting to database...");
    let settings = PoolSettings {
        max_connections: 1,
        statement_timeout: config.db_statement_timeout.max(std::time::Duration::from_secs(60)),
        read_only: false,
    };
    let pool = init_pool(&config.database_url, &settings).await?;

    if args.schema {
        ensure_schema(&pool).await.context("creating tables")?;
        println!("✅ Schema ready");
    }

    let report = load_dataset(&pool, &dataset).await?;
    println!(
        "✅ Videos: {} inserted, {} skipped",
        report.videos_inserted, report.videos_skipped
    );
    println!(
        "✅ Snapshots: {} inserted, {} skipped",
        report.snapshots_inserted, report.snapshots_skipped
    );

    Ok(())
}
