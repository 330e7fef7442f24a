//! Constants for the download module (timeouts, chunking).

/// HTTP timeout applied to both connect and read phases of every request.
pub const HTTP_TIMEOUT_SECS: u64 = 60;

/// Buffer size for the chunked artifact copy (8 KiB).
pub const TRANSFER_CHUNK_SIZE: usize = 8 * 1024;

/// Extension used when the artifact URL carries none.
pub const FALLBACK_EXTENSION: &str = ".bin";
