//! Two-level link discovery: root page → collection pages → item links.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use url::Url;

use super::layout::SiteLayout;
use super::task::ArtifactTask;
use crate::download::{FetchError, HttpClient};

/// Discovery failures that end the run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The root page could not be fetched; there is nothing to crawl.
    #[error("root page {url} unavailable: {source}")]
    RootPage {
        /// The root URL.
        url: String,
        /// The underlying fetch error.
        #[source]
        source: FetchError,
    },

    /// The task queue closed while discovery was still submitting.
    #[error("task queue closed after {submitted} tasks were submitted")]
    QueueClosed {
        /// Tasks accepted before the queue closed.
        submitted: u64,
    },
}

/// Counters describing one discovery pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryStats {
    /// Collection links found on the root page.
    pub collections: usize,
    /// Collections whose page could not be loaded (skipped).
    pub collections_failed: usize,
    /// Tasks submitted for download.
    pub tasks: u64,
}

/// Walks the archive and feeds one [`ArtifactTask`] per item into a queue.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: HttpClient,
    layout: Arc<SiteLayout>,
}

impl Dispatcher {
    /// Creates a dispatcher using `client` for page fetches.
    #[must_use]
    pub fn new(client: HttpClient, layout: Arc<SiteLayout>) -> Self {
        Self { client, layout }
    }

    /// Discovers every item under `root` and sends a task for each into `sink`.
    ///
    /// Collections are visited one after another. Tasks are sent as soon as
    /// their collection page is parsed, so downloads start before discovery
    /// finishes; a full `sink` pauses discovery until a worker frees a slot.
    ///
    /// Duplicate item links, within or across collections, each produce a task.
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::RootPage`] if the root page cannot be fetched
    ///   (not retried). A collection page that fails is only logged.
    /// - [`DiscoveryError::QueueClosed`] if `sink`'s receiver is gone.
    #[instrument(skip(self, output_dir, sink), fields(root = %root))]
    pub async fn discover(
        &self,
        root: &Url,
        output_dir: &Path,
        sink: &mpsc::Sender<ArtifactTask>,
    ) -> Result<DiscoveryStats, DiscoveryError> {
        let root_html = self
            .client
            .fetch_page(root.as_str())
            .await
            .map_err(|source| DiscoveryError::RootPage {
                url: root.to_string(),
                source,
            })?;

        let collection_urls = resolve_links(root, self.layout.collection_links(&root_html));
        let mut stats = DiscoveryStats {
            collections: collection_urls.len(),
            ..DiscoveryStats::default()
        };
        info!(collections = stats.collections, "found collection links");

        for collection_url in collection_urls {
            info!(collection = %collection_url, "processing collection");

            let html = match self.client.fetch_page(collection_url.as_str()).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(collection = %collection_url, error = %e, "skipping unavailable collection");
                    stats.collections_failed += 1;
                    continue;
                }
            };

            let item_urls = resolve_links(root, self.layout.item_links(&html));
            info!(
                collection = %collection_url,
                items = item_urls.len(),
                "found item links"
            );

            for detail_url in item_urls {
                stats.tasks += 1;
                let task = ArtifactTask {
                    seq: stats.tasks,
                    detail_url,
                    root_url: root.clone(),
                    output_dir: PathBuf::from(output_dir),
                };
                if sink.send(task).await.is_err() {
                    return Err(DiscoveryError::QueueClosed {
                        submitted: stats.tasks - 1,
                    });
                }
            }
        }

        info!(
            collections = stats.collections,
            collections_failed = stats.collections_failed,
            tasks = stats.tasks,
            "discovery complete"
        );
        Ok(stats)
    }
}

/// Joins each href onto `root`, dropping (and logging) the ones that do not parse.
fn resolve_links(root: &Url, hrefs: Vec<String>) -> Vec<Url> {
    hrefs
        .into_iter()
        .filter_map(|href| match root.join(&href) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(href = %href, error = %e, "ignoring unresolvable link");
                None
            }
        })
        .collect()
}
