//! Fixed-buffer streaming copy.
//!
//! Artifacts can be arbitrarily large, so the copy never holds more than one
//! buffer of data: each chunk is written out before the next one is read.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Totals for one completed chunked copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CopyStats {
    /// Bytes written to the destination.
    pub bytes: u64,
    /// Number of read/write cycles performed.
    pub chunks: u64,
}

/// Which side of the copy failed.
#[derive(Debug)]
pub enum CopyError {
    /// Reading from the source failed.
    Read(std::io::Error),
    /// Writing to (or flushing) the destination failed.
    Write(std::io::Error),
}

/// Copies `reader` into `writer` through a single buffer of `chunk_size` bytes.
///
/// A `chunk_size` of zero is treated as one byte.
///
/// # Errors
///
/// Returns [`CopyError::Read`] or [`CopyError::Write`] with the underlying
/// IO error of the side that failed.
pub async fn copy_in_chunks<R, W>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
) -> Result<CopyStats, CopyError>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buffer = vec![0u8; chunk_size.max(1)];
    let mut stats = CopyStats::default();

    loop {
        let read = reader.read(&mut buffer).await.map_err(CopyError::Read)?;
        if read == 0 {
            break;
        }
        writer
            .write_all(&buffer[..read])
            .await
            .map_err(CopyError::Write)?;
        stats.bytes += read as u64;
        stats.chunks += 1;
    }

    writer.flush().await.map_err(CopyError::Write)?;
    Ok(stats)
}
