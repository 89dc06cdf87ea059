// VAST City Dashboard - ETL stage
// Raw CSVs under Datasets/ → typed snapshots in the cache directory

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use vast_dashboard::config::{DEFAULT_DATASETS_DIR, DEFAULT_STATUS_LOG_SHARDS};
use vast_dashboard::logging::{self, LogLevel};
use vast_dashboard::{run_etl, DatasetLayout, EtlSettings, NullPolicy};

#[derive(Parser)]
#[command(name = "vast-etl", version, about = "Convert the city CSVs into snapshot files")]
struct Cli {
    /// Root of the raw dataset tree
    #[arg(long, default_value = DEFAULT_DATASETS_DIR)]
    datasets: PathBuf,
    /// Where snapshot files are written
    #[arg(long, default_value = ".")]
    cache_dir: PathBuf,
    /// Number of ParticipantStatusLogs<N>.csv shards
    #[arg(long, default_value_t = DEFAULT_STATUS_LOG_SHARDS)]
    status_log_shards: usize,
    #[arg(long, value_enum, default_value = "drop")]
    null_policy: NullPolicy,
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level)?;

    println!("🗄️  VAST ETL - CSV → snapshot cache");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let layout = DatasetLayout::new(cli.datasets.clone(), cli.cache_dir.clone());
    let settings = EtlSettings {
        status_log_shards: cli.status_log_shards,
        null_policy: cli.null_policy,
    };

    println!("\n📂 Loading {} ...", layout.datasets_dir.display());
    let report = run_etl(&layout, &settings)
        .with_context(|| format!("ETL failed for {}", layout.datasets_dir.display()))?;

    println!("\n💾 Snapshots written:");
    for written in &report.snapshots {
        println!(
            "   ✓ {:<40} {:>10} rows  {}",
            written.meta.name,
            written.meta.row_count,
            written.path.display()
        );
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("🎉 ETL complete (run {})", report.run_id);
    println!(
        "✅ {} snapshots, {} rows",
        report.snapshots.len(),
        report.total_rows()
    );

    Ok(())
}
