// VAST City Dashboard - Web Server
// Loads the snapshot cache once, prerenders every page, then serves them

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use vast_dashboard::config::DEFAULT_DATASETS_DIR;
use vast_dashboard::dashboard::router::build_router;
use vast_dashboard::logging::{self, LogLevel};
use vast_dashboard::{Dashboard, DatasetLayout, GraphSettings, Page};

#[derive(Parser)]
#[command(name = "vast-dashboard", version, about = "Serve the city dashboard from the snapshot cache")]
struct Cli {
    /// Root of the raw dataset tree; only its file listing is read
    #[arg(long, default_value = DEFAULT_DATASETS_DIR)]
    datasets: PathBuf,
    /// Directory holding the ETL snapshots
    #[arg(long, default_value = ".")]
    cache_dir: PathBuf,
    #[arg(long, default_value = "127.0.0.1:8050")]
    bind: SocketAddr,
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "failed to listen for ctrl-c");
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_level)?;

    println!("🌐 VAST City Dashboard - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let layout = DatasetLayout::new(cli.datasets.clone(), cli.cache_dir.clone());
    let dashboard = Dashboard::load(&layout, GraphSettings::default()).with_context(|| {
        format!(
            "could not load snapshots from {}; run vast-etl first",
            layout.cache_dir.display()
        )
    })?;
    println!("✓ Loaded {} snapshots", dashboard.manifest().len());

    let app = build_router(Arc::new(dashboard));

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;

    println!("\n🚀 Server running on http://{}", cli.bind);
    for page in Page::ALL {
        println!("   {:<26} http://{}{}", page.name(), cli.bind, page.path());
    }
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}
