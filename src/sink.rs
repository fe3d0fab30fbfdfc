//! Offset-tracking wrapper around an arbitrary `Write` sink.
//!
//! The streamer never seeks; it only needs to know how many bytes it has written so far,
//! since that count *is* the archive offset of whatever gets written next.

use std::io::{self, Write};

/// Wraps a byte sink and counts bytes written, without requiring the sink to support
/// `Seek`/`tell`.
pub struct OffsetTrackingSink<W: Write> {
    inner: W,
    offset: u64,
}

impl<W: Write> OffsetTrackingSink<W> {
    /// Wrap `inner`, starting the offset counter at zero.
    pub fn new(inner: W) -> Self {
        Self { inner, offset: 0 }
    }

    /// Bytes written so far; the offset the next write will land at.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Unwrap back to the inner sink.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for OffsetTrackingSink<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.inner.write_all(data)?;
        self.offset += data.len() as u64;
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_cumulative_offset() {
        let mut sink = OffsetTrackingSink::new(Vec::new());
        sink.write_all(b"abc").unwrap();
        assert_eq!(sink.offset(), 3);
        sink.write_all(b"defgh").unwrap();
        assert_eq!(sink.offset(), 8);
        assert_eq!(sink.into_inner(), b"abcdefgh");
    }
}
