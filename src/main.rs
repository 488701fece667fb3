use anyhow::{Context, Result};
use clap::Parser;
use feedjoin::{run, FeedConfig};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Join the subscriber feeds and write the purchasers of one product to CSV.
#[derive(Parser, Debug)]
struct Args {
    /// YAML config file
    #[arg(long, default_value = "config.yml")]
    config: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .init();

    // ─── 2) config, before touching feeds or the network ─────────────
    let args = Args::parse();
    let config = FeedConfig::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    info!(
        product = %config.product_name,
        feeds = %config.local_feed_path.display(),
        download = config.download_data_feeds,
        cleanup = config.cleanup_feeds,
        "startup"
    );

    // ─── 3) sync, join, write, clean up ──────────────────────────────
    let summary = run(&config).await.context("feed join failed")?;
    info!(
        output = %summary.output.display(),
        rows = summary.rows,
        cleaned = summary.cleaned,
        "all done"
    );
    Ok(())
}
