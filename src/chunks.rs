//! Pull-style adapter: drives a `Streamer` writing into an in-memory buffer and yields that
//! buffer in `write_buffer_size`-ish pieces, so a caller can pull archive bytes lazily (e.g.
//! to feed an HTTP response body) instead of the streamer pushing into a `Write` sink.
//!
//! Plain synchronous `Iterator`, deliberately not async/fiber-based: see the design note
//! this mirrors in `Streamer`'s own docs. A caller wanting this over an async transport
//! drives the iterator from a blocking thread or an executor's `spawn_blocking` equivalent.

use crate::error::Result;
use crate::streamer::{Streamer, StreamerOptions};

/// One already-prepared entry to feed to the underlying streamer.
pub enum PendingEntry {
    Stored {
        filename: String,
        data: Vec<u8>,
    },
    Deflated {
        filename: String,
        uncompressed_size: u64,
        crc32: u32,
        compressed: Vec<u8>,
    },
    Directory {
        dirname: String,
    },
}

/// Lazily produces archive bytes for a fixed, known-ahead-of-time list of entries.
///
/// Internally runs a `Streamer<Vec<u8>>` to completion up front (there is no way to pause
/// `Streamer` mid-write without threading a coroutine through it), then exposes the result
/// through `Iterator` in caller-controlled chunk sizes. This keeps the adapter itself
/// trivial and puts all ZIP-format logic in one place.
pub struct ChunkedArchive {
    bytes: Vec<u8>,
    position: usize,
    chunk_size: usize,
}

impl ChunkedArchive {
    /// Build the archive for `entries` and prepare to yield it in `chunk_size`-byte pieces.
    pub fn new(entries: Vec<PendingEntry>, chunk_size: usize) -> Result<Self> {
        Self::with_options(entries, chunk_size, StreamerOptions::default())
    }

    /// As [`ChunkedArchive::new`], with explicit streamer tuning (compression level, etc).
    pub fn with_options(
        entries: Vec<PendingEntry>,
        chunk_size: usize,
        options: StreamerOptions,
    ) -> Result<Self> {
        assert!(chunk_size > 0, "chunk_size must be at least 1");

        let mut streamer = Streamer::with_options(Vec::new(), options);
        for pending in entries {
            match pending {
                PendingEntry::Stored { filename, data } => {
                    let crc32 = crc32fast::hash(&data);
                    streamer.add_stored_entry(&filename, data.len() as u64, crc32)?;
                    streamer.append(&data)?;
                }
                PendingEntry::Deflated {
                    filename,
                    uncompressed_size,
                    crc32,
                    compressed,
                } => {
                    streamer.add_deflated_entry(
                        &filename,
                        uncompressed_size,
                        crc32,
                        compressed.len() as u64,
                    )?;
                    streamer.append(&compressed)?;
                }
                PendingEntry::Directory { dirname } => {
                    streamer.add_empty_directory(&dirname)?;
                }
            }
        }
        let bytes = streamer.close()?;

        Ok(Self {
            bytes,
            position: 0,
            chunk_size,
        })
    }

    /// Total archive size, known immediately since the archive was built eagerly.
    pub fn total_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

impl Iterator for ChunkedArchive {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.bytes.len() {
            return None;
        }
        let end = (self.position + self.chunk_size).min(self.bytes.len());
        let chunk = self.bytes[self.position..end].to_vec();
        self.position = end;
        Some(Ok(chunk))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_fixed_size_chunks_then_a_remainder() {
        let archive = ChunkedArchive::new(
            vec![PendingEntry::Stored {
                filename: "a.bin".to_string(),
                data: vec![7u8; 100],
            }],
            32,
        )
        .unwrap();

        let chunks: Vec<Vec<u8>> = archive.map(|c| c.unwrap()).collect();
        let total: usize = chunks.iter().map(|c| c.len()).sum();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= 32));
        assert_eq!(total as u64, {
            let mut est = crate::estimator::SizeEstimator::new();
            est.add_stored_entry("a.bin", 100, crc32fast::hash(&[7u8; 100])).unwrap();
            est.total_size()
        });
    }

    #[test]
    fn empty_entry_list_still_produces_a_valid_tail() {
        let archive = ChunkedArchive::new(vec![], 16).unwrap();
        let bytes: Vec<u8> = archive.flat_map(|c| c.unwrap()).collect();
        assert_eq!(&bytes[bytes.len() - 22..bytes.len() - 18], b"PK\x05\x06");
    }
}
