//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;
use url::Url;

use harvester_core::crawl::layout::{
    DEFAULT_ARTIFACT_SELECTOR, DEFAULT_COLLECTION_SELECTOR, DEFAULT_ITEM_SELECTOR,
    DEFAULT_TITLE_SELECTOR,
};
use harvester_core::download::constants::HTTP_TIMEOUT_SECS;
use harvester_core::{DEFAULT_MAX_RETRIES, DEFAULT_WORKERS};

/// Default archive root.
pub const DEFAULT_ROOT_URL: &str = "https://papers.nips.cc";

/// Crawl a paginated document archive and download every linked artifact.
///
/// Harvester walks the root index, each collection page and each item's
/// detail page, saving the artifact it links to as `<title>.<ext>`.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Archive root page
    #[arg(default_value = DEFAULT_ROOT_URL, value_parser = parse_root_url)]
    pub root_url: Url,

    /// Directory to write artifacts into (created if missing)
    #[arg(short, long, default_value = "./artifacts")]
    pub output_dir: PathBuf,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Number of concurrent download workers (1-100)
    #[arg(short = 'w', long, default_value_t = DEFAULT_WORKERS as u8, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub workers: u8,

    /// Maximum attempts per item before giving up (1-10)
    #[arg(short = 'r', long, default_value_t = DEFAULT_MAX_RETRIES as u8, value_parser = clap::value_parser!(u8).range(1..=10))]
    pub max_attempts: u8,

    /// Tasks allowed to wait for a worker before discovery pauses (default: 2 x workers)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..=10000))]
    pub queue_capacity: Option<u16>,

    /// Connect and read timeout for every request, in seconds (1-3600)
    #[arg(short = 't', long, default_value_t = HTTP_TIMEOUT_SECS, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: u64,

    /// CSS selector for collection links on the root page
    #[arg(long, default_value = DEFAULT_COLLECTION_SELECTOR)]
    pub collection_selector: String,

    /// CSS selector for item links on a collection page
    #[arg(long, default_value = DEFAULT_ITEM_SELECTOR)]
    pub item_selector: String,

    /// CSS selector for the artifact link on a detail page
    #[arg(long, default_value = DEFAULT_ARTIFACT_SELECTOR)]
    pub artifact_selector: String,

    /// CSS selector for the title element on a detail page
    #[arg(long, default_value = DEFAULT_TITLE_SELECTOR)]
    pub title_selector: String,
}

fn parse_root_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("invalid root URL {value:?}: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme {other:?}: expected http or https")),
    }
}
