//! Archive traversal and the concurrent download pipeline.
//!
//! - [`layout`] - CSS selectors for root, collection and detail pages
//! - [`dispatcher`] - discovers collections and items, submits tasks
//! - [`task`] - runs one item to a terminal outcome with bounded retries
//! - [`engine`] - fixed worker pool behind a bounded queue
//! - [`orchestrator`] - ties the pieces together for one run

pub mod dispatcher;
pub mod engine;
pub mod layout;
pub mod orchestrator;
pub mod task;

pub use dispatcher::{DiscoveryError, DiscoveryStats, Dispatcher};
pub use engine::{DEFAULT_WORKERS, DownloadStats, EngineError, PoolConfig, WorkerPool};
pub use layout::{DetailPage, LayoutError, SiteLayout};
pub use orchestrator::{HarvestConfig, HarvestError, HarvestReport, Harvester};
pub use task::{ArtifactTask, DownloadResult, SkipReason, TaskError, TaskRunner};
