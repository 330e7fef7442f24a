//! HTTP fetching and streaming artifact transfer.
//!
//! This module provides the network and filesystem leaves of the crawl:
//! page fetches, artifact transfers through a fixed-size buffer, filename
//! sanitization and the per-task retry policy.
//!
//! # Features
//!
//! - Streaming downloads (memory bounded by the chunk size)
//! - One timeout (60s) applied to connect and read
//! - Parent directories created on demand
//! - Structured error types with full context
//!
//! # Example
//!
//! ```no_run
//! use harvester_core::download::HttpClient;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new();
//! let stats = client
//!     .transfer("https://example.com/paper.pdf", Path::new("./downloads/paper.pdf"))
//!     .await?;
//! println!("Downloaded {} bytes in {} chunks", stats.bytes, stats.chunks);
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod filename;
mod retry;
mod stream;

pub use client::HttpClient;
pub use error::{FetchError, TransferError};
pub use filename::{artifact_filename, sanitize_filename};
pub use retry::{DEFAULT_MAX_RETRIES, RetryDecision, RetryPolicy, RetryState};
pub use stream::{CopyError, CopyStats, copy_in_chunks};

// Note: we do NOT define module-local Result aliases.
// Use `Result<T, TransferError>` explicitly in function signatures.
