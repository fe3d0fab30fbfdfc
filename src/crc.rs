//! Streaming CRC32 with an append-combine operation, plus a small write-coalescing buffer.
//!
//! Byte-level accumulation is delegated to `crc32fast`, which picks the fastest available
//! instruction set at runtime. The combine operation (merging `crc(A)` and `crc(B)` into
//! `crc(A ++ B)` without re-reading `A`) has no equivalent there, so it is implemented here
//! using the standard GF(2) matrix composition of the CRC shift register (the same
//! algorithm zlib's `crc32_combine` uses).

use std::io::{self, Write};

const GF2_DIM: usize = 32;

/// A CRC32 accumulator that can be fed chunks incrementally and later combined with
/// another accumulator's result as if the two chunks had been hashed back to back.
#[derive(Clone)]
pub struct Crc32 {
    /// Finalized CRC of everything folded in before `current`.
    base: u32,
    /// Hasher for bytes appended since the last combine.
    current: crc32fast::Hasher,
    /// Number of bytes fed into `current`.
    current_len: u64,
}

impl Crc32 {
    /// Start a fresh accumulator.
    pub fn new() -> Self {
        Self {
            base: 0,
            current: crc32fast::Hasher::new(),
            current_len: 0,
        }
    }

    /// Fold `bytes` into the running checksum.
    pub fn update(&mut self, bytes: &[u8]) {
        self.current.update(bytes);
        self.current_len += bytes.len() as u64;
    }

    /// Current checksum, independent of how many bytes have been folded in.
    pub fn value(&self) -> u32 {
        combine(self.base, self.current.clone().finalize(), self.current_len)
    }

    /// Replace the current value with the CRC of the virtual concatenation `self ++ B`,
    /// given `crc(B)` and `len(B)`. Lets per-chunk CRCs computed on independent threads be
    /// merged serially without re-hashing any bytes.
    pub fn append(&mut self, crc_b: u32, len_b: u64) {
        self.base = combine(self.value(), crc_b, len_b);
        self.current = crc32fast::Hasher::new();
        self.current_len = 0;
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Standalone combine: produce `crc32(A ++ B)` from `crc32(A)`, `crc32(B)`, and `len(B)`.
pub fn combine(crc_a: u32, crc_b: u32, len_b: u64) -> u32 {
    if len_b == 0 {
        return crc_a;
    }

    // `odd` starts as the matrix for "shift the CRC register by one zero bit".
    let mut odd = [0u32; GF2_DIM];
    odd[0] = 0xEDB8_8320;
    let mut row = 1u32;
    for slot in odd.iter_mut().skip(1) {
        *slot = row;
        row <<= 1;
    }

    let mut even = [0u32; GF2_DIM];
    gf2_matrix_square(&mut even, &odd); // even = odd^2 (shift by two zero bits)
    gf2_matrix_square(&mut odd, &even); // odd = even^2 (shift by four zero bits)

    let mut crc1 = crc_a;
    let mut len2 = len_b;
    loop {
        gf2_matrix_square(&mut even, &odd);
        if len2 & 1 != 0 {
            crc1 = gf2_matrix_times(&even, crc1);
        }
        len2 >>= 1;
        if len2 == 0 {
            break;
        }

        gf2_matrix_square(&mut odd, &even);
        if len2 & 1 != 0 {
            crc1 = gf2_matrix_times(&odd, crc1);
        }
        len2 >>= 1;
        if len2 == 0 {
            break;
        }
    }

    crc1 ^ crc_b
}

fn gf2_matrix_times(mat: &[u32; GF2_DIM], mut vec: u32) -> u32 {
    let mut sum = 0u32;
    let mut i = 0;
    while vec != 0 {
        if vec & 1 != 0 {
            sum ^= mat[i];
        }
        vec >>= 1;
        i += 1;
    }
    sum
}

fn gf2_matrix_square(out: &mut [u32; GF2_DIM], mat: &[u32; GF2_DIM]) {
    for (i, row) in mat.iter().enumerate() {
        out[i] = gf2_matrix_times(mat, *row);
    }
}

/// Coalesces small writes into larger ones before forwarding them to an inner sink.
///
/// Writes smaller than the buffer's capacity accumulate; a single write at or above
/// capacity bypasses the buffer entirely (after draining whatever was pending); any
/// residual bytes stay buffered until an explicit `flush`.
pub struct WriteBuffer<W: Write> {
    inner: W,
    buf: Vec<u8>,
    capacity: usize,
}

/// Default buffer capacity: measured as the point beyond which per-write overhead
/// (syscalls, CRC combine bookkeeping) stops mattering relative to the copy cost.
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

impl<W: Write> WriteBuffer<W> {
    /// Wrap `inner` with the default 64 KiB coalescing buffer.
    pub fn new(inner: W) -> Self {
        Self::with_capacity(inner, DEFAULT_BUFFER_CAPACITY)
    }

    /// Wrap `inner` with a caller-chosen buffer capacity.
    pub fn with_capacity(inner: W, capacity: usize) -> Self {
        Self {
            inner,
            buf: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Drain any buffered bytes to the inner sink, then return it.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.drain()?;
        Ok(self.inner)
    }

    fn drain(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            self.inner.write_all(&self.buf)?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl<W: Write> Write for WriteBuffer<W> {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        if data.len() >= self.capacity {
            self.drain()?;
            self.inner.write_all(data)?;
        } else {
            if self.buf.len() + data.len() > self.capacity {
                self.drain()?;
            }
            self.buf.extend_from_slice(data);
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain()?;
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_matches_batch() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let batch = crc32fast::hash(data);

        let mut crc = Crc32::new();
        for chunk in data.chunks(7) {
            crc.update(chunk);
        }
        assert_eq!(crc.value(), batch);
    }

    #[test]
    fn combine_matches_concatenated_hash() {
        let a = b"hello, ";
        let b = b"world!";
        let mut whole = Vec::new();
        whole.extend_from_slice(a);
        whole.extend_from_slice(b);

        let crc_a = crc32fast::hash(a);
        let crc_b = crc32fast::hash(b);
        let expected = crc32fast::hash(&whole);

        assert_eq!(combine(crc_a, crc_b, b.len() as u64), expected);
    }

    #[test]
    fn combine_with_empty_tail_is_identity() {
        let a = b"some bytes";
        let crc_a = crc32fast::hash(a);
        let crc_empty = crc32fast::hash(b"");
        assert_eq!(combine(crc_a, crc_empty, 0), crc_a);
    }

    #[test]
    fn engine_append_then_more_updates() {
        // crc("ab") combined with crc("cd") then extended with "ef" must equal crc("abcdef")
        let mut crc = Crc32::new();
        crc.update(b"ab");
        let crc_cd = crc32fast::hash(b"cd");
        crc.append(crc_cd, 2);
        crc.update(b"ef");

        assert_eq!(crc.value(), crc32fast::hash(b"abcdef"));
    }

    #[test]
    fn write_buffer_coalesces_small_writes() {
        let mut out = Vec::new();
        {
            let mut buf = WriteBuffer::with_capacity(&mut out, 16);
            buf.write_all(b"abc").unwrap();
            buf.write_all(b"def").unwrap();
            buf.flush().unwrap();
        }
        assert_eq!(out, b"abcdef");
    }

    #[test]
    fn write_buffer_bypasses_for_large_writes() {
        let mut out = Vec::new();
        {
            let mut buf = WriteBuffer::with_capacity(&mut out, 4);
            buf.write_all(b"ab").unwrap();
            buf.write_all(b"0123456789").unwrap();
            buf.flush().unwrap();
        }
        assert_eq!(out, b"ab0123456789");
    }
}
