//! One unit of work: detail page → artifact link → transfer, with retries.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::layout::SiteLayout;
use crate::download::{
    FetchError, HttpClient, RetryDecision, RetryPolicy, TransferError, artifact_filename,
};

/// A discovered item waiting to be downloaded.
///
/// `seq` is a per-run sequence number used to correlate log lines; it plays
/// no part in identity or deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactTask {
    /// Per-run sequence number (starts at 1).
    pub seq: u64,
    /// Absolute URL of the item's detail page.
    pub detail_url: Url,
    /// Root URL that artifact links are resolved against.
    pub root_url: Url,
    /// Directory the artifact is written into.
    pub output_dir: PathBuf,
}

/// Why a task finished without downloading anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The detail page has no link matching the artifact selector.
    NoArtifactLink,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoArtifactLink => f.write_str("no artifact link"),
        }
    }
}

/// Errors raised by a single task attempt.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The detail page could not be fetched.
    #[error("detail page unavailable: {0}")]
    DetailPage(#[from] FetchError),

    /// The artifact link cannot be turned into an absolute URL.
    #[error("artifact link {href:?} cannot be resolved against {root}: {source}")]
    InvalidArtifactLink {
        /// The raw link as found on the page.
        href: String,
        /// The root URL it was joined with.
        root: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// The artifact transfer failed.
    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),
}

impl TaskError {
    /// Whether running the task again could succeed.
    ///
    /// Only network operations (page fetch, transfer) are retried; a link
    /// that does not parse will not parse on the next attempt either.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::InvalidArtifactLink { .. })
    }
}

/// Terminal outcome of one task.
#[derive(Debug)]
pub enum DownloadResult {
    /// The artifact was written to `path`.
    Saved {
        /// Destination file.
        path: PathBuf,
        /// Attempts used, including the successful one.
        attempts: u32,
    },
    /// The task ended without a download and without an error.
    Skipped {
        /// Why nothing was downloaded.
        reason: SkipReason,
    },
    /// The task was abandoned.
    Failed {
        /// Error from the last attempt.
        error: TaskError,
        /// Attempts made.
        attempts: u32,
        /// True when the attempt cap was reached, false for a non-retryable error.
        attempts_exhausted: bool,
    },
}

impl DownloadResult {
    /// Number of attempts the task used (zero attempts never happens).
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Saved { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
            Self::Skipped { .. } => 1,
        }
    }
}

/// Outcome of one attempt that did not error.
enum Attempt {
    Saved(PathBuf),
    NoArtifactLink,
}

/// Runs [`ArtifactTask`]s; one instance is shared by every worker.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    client: HttpClient,
    layout: Arc<SiteLayout>,
    policy: RetryPolicy,
}

impl TaskRunner {
    /// Creates a runner from a client, the site layout and a retry policy.
    #[must_use]
    pub fn new(client: HttpClient, layout: Arc<SiteLayout>, policy: RetryPolicy) -> Self {
        Self {
            client,
            layout,
            policy,
        }
    }

    /// Returns the retry policy tasks run under.
    /// Runs a task to a terminal outcome.
    ///
    /// Any transient failure restarts the whole task from the detail page,
    /// immediately, until the attempt cap is reached. A missing artifact link
    /// ends the task after the first successful page fetch.
    #[instrument(skip(self, task), fields(task = task.seq, url = %task.detail_url))]
    pub async fn run(&self, task: &ArtifactTask) -> DownloadResult {
        let mut state = self.policy.start();
        info!("task started");

        loop {
            let attempt = state.begin_attempt();
            info!(
                attempt,
                max_attempts = state.max_attempts(),
                "processing detail page"
            );

            match self.attempt(task).await {
                Ok(Attempt::Saved(path)) => {
                    info!(attempt, path = %path.display(), "artifact downloaded");
                    return DownloadResult::Saved {
                        path,
                        attempts: attempt,
                    };
                }
                Ok(Attempt::NoArtifactLink) => {
                    info!(attempt, reason = %SkipReason::NoArtifactLink, "skipping item");
                    return DownloadResult::Skipped {
                        reason: SkipReason::NoArtifactLink,
                    };
                }
                Err(e) if !e.is_transient() => {
                    error!(attempt, error = %e, "task failed, not retrying");
                    return DownloadResult::Failed {
                        error: e,
                        attempts: attempt,
                        attempts_exhausted: false,
                    };
                }
                Err(e) => match state.decide() {
                    RetryDecision::Retry { next_attempt } => {
                        warn!(attempt, next_attempt, error = %e, "attempt failed, retrying");
                    }
                    RetryDecision::GiveUp => {
                        error!(attempts = attempt, error = %e, "giving up after all attempts");
                        return DownloadResult::Failed {
                            error: e,
                            attempts: attempt,
                            attempts_exhausted: true,
                        };
                    }
                },
            }
        }
    }

    async fn attempt(&self, task: &ArtifactTask) -> Result<Attempt, TaskError> {
        let html = self.client.fetch_page(task.detail_url.as_str()).await?;
        let detail = self.layout.detail(&html);

        let Some(href) = detail.artifact_href else {
            return Ok(Attempt::NoArtifactLink);
        };

        let artifact_url =
            task.root_url
                .join(&href)
                .map_err(|source| TaskError::InvalidArtifactLink {
                    href: href.clone(),
                    root: task.root_url.to_string(),
                    source,
                })?;
        debug!(artifact = %artifact_url, "found artifact link");

        let filename = artifact_filename(detail.title.as_deref(), &artifact_url);
        let destination = task.output_dir.join(filename);
        self.client
            .transfer(artifact_url.as_str(), &destination)
            .await?;

        Ok(Attempt::Saved(destination))
    }
}
