//! CLI entry point for the harvester tool.

use anyhow::{Context, Result};
use clap::Parser;
use harvester_core::{HarvestConfig, Harvester, PoolConfig, RetryPolicy, SiteLayout};
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");
    info!("Harvester starting");

    let layout = SiteLayout::new(
        &args.collection_selector,
        &args.item_selector,
        &args.artifact_selector,
        &args.title_selector,
    )
    .context("invalid page selector")?;

    let mut pool = PoolConfig::with_workers(usize::from(args.workers));
    if let Some(capacity) = args.queue_capacity {
        pool.queue_capacity = usize::from(capacity);
    }

    let config = HarvestConfig {
        root_url: args.root_url,
        output_dir: args.output_dir,
        pool,
        retry_policy: RetryPolicy::with_max_attempts(u32::from(args.max_attempts)),
        timeout_secs: args.timeout,
        layout,
    };

    // Only a run that cannot start (root page unavailable) exits non-zero;
    // individual item failures are reported in the summary.
    let report = Harvester::new(config)?
        .run()
        .await
        .context("harvest aborted")?;

    info!(
        collections = report.discovery.collections,
        collections_failed = report.discovery.collections_failed,
        discovered = report.discovery.tasks,
        saved = report.downloads.saved(),
        skipped = report.downloads.skipped(),
        failed = report.downloads.failed(),
        retried = report.downloads.retried(),
        "Harvest complete"
    );

    Ok(())
}
