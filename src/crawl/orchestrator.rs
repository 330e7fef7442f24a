//! Run lifecycle: start the pool, discover, close the queue, drain.
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::{HarvestConfig, Harvester};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HarvestConfig::new(Url::parse("https://papers.nips.cc")?, "./artifacts");
//! let report = Harvester::new(config)?.run().await?;
//! println!("saved {} artifacts", report.downloads.saved());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, instrument};
use url::Url;

use super::dispatcher::{DiscoveryError, DiscoveryStats, Dispatcher};
use super::engine::{DownloadStats, EngineError, PoolConfig, WorkerPool};
use super::layout::SiteLayout;
use super::task::TaskRunner;
use crate::download::{HttpClient, RetryPolicy, constants::HTTP_TIMEOUT_SECS};

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Pool sizing is out of range.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Discovery could not start (root page unavailable).
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// Everything a run needs.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Archive root page.
    pub root_url: Url,
    /// Directory artifacts are written into.
    pub output_dir: PathBuf,
    /// Worker count and queue size.
    pub pool: PoolConfig,
    /// Per-task attempt cap.
    pub retry_policy: RetryPolicy,
    /// Connect and read timeout for every request.
    pub timeout_secs: u64,
    /// Selectors for the three tiers.
    pub layout: SiteLayout,
}

impl HarvestConfig {
    /// Creates a config with default pool, retry, timeout and layout settings.
    #[must_use]
    pub fn new(root_url: Url, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_url,
            output_dir: output_dir.into(),
            pool: PoolConfig::default(),
            retry_policy: RetryPolicy::default(),
            timeout_secs: HTTP_TIMEOUT_SECS,
            layout: SiteLayout::default(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug)]
pub struct HarvestReport {
    /// Discovery counters.
    pub discovery: DiscoveryStats,
    /// Per-task outcome counters.
    pub downloads: DownloadStats,
}

/// Owns one crawl from root page to drained pool.
#[derive(Debug)]
pub struct Harvester {
    config: HarvestConfig,
    client: HttpClient,
}

impl Harvester {
    /// Creates a harvester, validating the pool settings up front.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Engine`] if the pool config is out of range.
    pub fn new(config: HarvestConfig) -> Result<Self, HarvestError> {
        let client = HttpClient::new_with_timeout(config.timeout_secs);
        Self::with_client(config, client)
    }

    /// Creates a harvester around an existing client.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Engine`] if the pool config is out of range.
    pub fn with_client(config: HarvestConfig, client: HttpClient) -> Result<Self, HarvestError> {
        config.pool.validate()?;
        Ok(Self { config, client })
    }

    /// Runs the crawl until every submitted task is terminal.
    ///
    /// Task failures are counted in the report and never fail the run.
    /// If the root page is unavailable the queue is closed at once, workers
    /// finish whatever they hold, and the error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::Discovery`] when discovery aborts.
    #[instrument(skip(self), fields(root = %self.config.root_url, output_dir = %self.config.output_dir.display()))]
    pub async fn run(&self) -> Result<HarvestReport, HarvestError> {
        let layout = Arc::new(self.config.layout.clone());
        let runner = Arc::new(TaskRunner::new(
            self.client.clone(),
            Arc::clone(&layout),
            self.config.retry_policy,
        ));
        let pool = WorkerPool::spawn(self.config.pool, runner)?;
        let dispatcher = Dispatcher::new(self.client.clone(), layout);

        info!(
            workers = self.config.pool.workers,
            max_attempts = self.config.retry_policy.max_attempts(),
            "starting harvest"
        );

        let sender = pool.sender();
        let discovered = dispatcher
            .discover(&self.config.root_url, &self.config.output_dir, &sender)
            .await;
        drop(sender);

        let downloads = pool.drain().await;

        match discovered {
            Ok(discovery) => {
                info!(
                    collections = discovery.collections,
                    collections_failed = discovery.collections_failed,
                    tasks = discovery.tasks,
                    saved = downloads.saved(),
                    skipped = downloads.skipped(),
                    failed = downloads.failed(),
                    retried = downloads.retried(),
                    "harvest complete"
                );
                Ok(HarvestReport {
                    discovery,
                    downloads,
                })
            }
            Err(e) => {
                error!(error = %e, "harvest aborted");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = HarvestConfig::new(Url::parse("https://papers.nips.cc").unwrap(), "out");
        assert_eq!(config.pool.workers, 50);
        assert_eq!(config.retry_policy.max_attempts(), 3);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_harvester_rejects_invalid_pool() {
        let mut config = HarvestConfig::new(Url::parse("https://papers.nips.cc").unwrap(), "out");
        config.pool = PoolConfig::with_workers(0);
        let result = Harvester::new(config);
        assert!(matches!(
            result,
            Err(HarvestError::Engine(EngineError::InvalidWorkers { value: 0 }))
        ));
    }
}
