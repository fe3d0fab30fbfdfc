//! Body writers for the unknown-sizes path: the streamer compresses (or passes through)
//! caller-supplied bytes itself, since neither the final size nor the CRC is known until
//! the entry is closed.
//!
//! Both writers share the same contract: accept chunks, track CRC and sizes, and on
//! `finish` hand back `{crc32, compressed_size, uncompressed_size}` plus any compressed
//! bytes still sitting in an internal buffer. The streamer owns the actual sink; these
//! types never see it directly, which sidesteps borrowing the sink twice.

use std::io::{self, Write};

use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::crc::Crc32;

/// CRC and sizes for one finished entry body.
#[derive(Debug, Clone, Copy)]
pub struct BodyResult {
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
}

/// Forwards bytes verbatim; `compressed_size == uncompressed_size` always holds.
///
/// Uses a plain byte counter rather than comparing sink positions before and after a
/// write, so it composes with sinks that can't report their own position (sockets, HTTP
/// response bodies) — see DESIGN.md for why this was chosen over the position-comparison
/// variant.
pub struct StoredBodyWriter {
    crc: Crc32,
    bytes: u64,
}

impl StoredBodyWriter {
    pub fn new() -> Self {
        Self {
            crc: Crc32::new(),
            bytes: 0,
        }
    }

    /// Fold `data` into the running CRC and byte count. The caller is responsible for
    /// forwarding `data` to the sink unchanged.
    pub fn write(&mut self, data: &[u8]) {
        self.crc.update(data);
        self.bytes += data.len() as u64;
    }

    pub fn finish(self) -> BodyResult {
        BodyResult {
            crc32: self.crc.value(),
            compressed_size: self.bytes,
            uncompressed_size: self.bytes,
        }
    }
}

impl Default for StoredBodyWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Default bytes of uncompressed input between periodic encoder flushes, to cap DEFLATE's
/// internal window/history memory for very large entries. Overridable per-`Streamer` via
/// `StreamerOptions::with_deflate_flush_interval`.
pub const DEFAULT_DEFLATE_FLUSH_INTERVAL: u64 = 5 * 1024 * 1024;

/// Feeds bytes into a raw-DEFLATE encoder (no zlib/gzip wrapper), tracking CRC over the
/// *uncompressed* input. Compressed output accumulates in an internal buffer that the
/// caller drains after each `write`/`finish` and forwards to the sink itself.
pub struct DeflatedBodyWriter {
    encoder: DeflateEncoder<Vec<u8>>,
    crc: Crc32,
    uncompressed_bytes: u64,
    compressed_bytes: u64,
    since_flush: u64,
    flush_interval: u64,
}

impl DeflatedBodyWriter {
    pub fn new(level: Compression, flush_interval: u64) -> Self {
        Self {
            encoder: DeflateEncoder::new(Vec::new(), level),
            crc: Crc32::new(),
            uncompressed_bytes: 0,
            compressed_bytes: 0,
            since_flush: 0,
            flush_interval,
        }
    }

    /// Compress `data`, returning whatever compressed bytes are now ready to forward.
    pub fn write(&mut self, data: &[u8]) -> io::Result<Vec<u8>> {
        self.crc.update(data);
        self.uncompressed_bytes += data.len() as u64;
        self.encoder.write_all(data)?;
        self.since_flush += data.len() as u64;

        if self.since_flush >= self.flush_interval {
            self.encoder.flush()?;
            self.since_flush = 0;
        }

        let ready = std::mem::take(self.encoder.get_mut());
        self.compressed_bytes += ready.len() as u64;
        Ok(ready)
    }

    /// Drain the encoder's terminator bytes and return the final result plus those bytes.
    pub fn finish(mut self) -> io::Result<(BodyResult, Vec<u8>)> {
        let tail = self.encoder.finish()?;
        self.compressed_bytes += tail.len() as u64;
        Ok((
            BodyResult {
                crc32: self.crc.value(),
                compressed_size: self.compressed_bytes,
                uncompressed_size: self.uncompressed_bytes,
            },
            tail,
        ))
    }
}
