//! Harvester Core Library
//!
//! This library crawls a paginated document archive (root index →
//! collection pages → item detail pages) and downloads the artifact linked
//! from each detail page into a local directory.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`download`] - HTTP page fetches, streaming transfer, filenames, retry policy
//! - [`crawl`] - link discovery, per-item tasks, worker pool and run orchestration

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crawl;
pub mod download;
mod user_agent;

// Re-export commonly used types
pub use crawl::{
    ArtifactTask, DEFAULT_WORKERS, DiscoveryError, DiscoveryStats, Dispatcher, DownloadResult,
    DownloadStats, EngineError, HarvestConfig, HarvestError, HarvestReport, Harvester,
    PoolConfig, SiteLayout, SkipReason, TaskError, TaskRunner, WorkerPool,
};
pub use download::{
    DEFAULT_MAX_RETRIES, FetchError, HttpClient, RetryPolicy, TransferError, sanitize_filename,
};
