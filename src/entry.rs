//! The `Entry` record: everything needed to later emit a central-directory entry.

use crate::dostime::DosTimestamp;

/// Compression method recorded in local and central-directory headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Method 0: bytes copied verbatim.
    Stored,
    /// Method 8: raw DEFLATE, no zlib/gzip wrapper.
    Deflated,
}

impl StorageMode {
    pub(crate) fn method_id(self) -> u16 {
        match self {
            StorageMode::Stored => 0,
            StorageMode::Deflated => 8,
        }
    }

    pub(crate) fn version_needed(self) -> u16 {
        match self {
            StorageMode::Stored => 20,
            StorageMode::Deflated => 20,
        }
    }
}

/// Per-entry bookkeeping the streamer accumulates as entries are written, and later
/// replays to produce central-directory records.
#[derive(Debug, Clone)]
pub struct Entry {
    pub filename: String,
    pub storage_mode: StorageMode,
    pub crc32: u32,
    pub compressed_size: u64,
    pub uncompressed_size: u64,
    pub mtime: DosTimestamp,
    pub use_data_descriptor: bool,
    pub local_header_offset: u64,
    /// Exact length of this entry's local file header, as written to the sink. Combined
    /// with `local_header_offset`, `compressed_size`, and `bytes_used_for_data_descriptor`,
    /// this lets the streamer assert that the bytes it pushed through the sink for one
    /// entry add up to where the next entry (or the central directory) actually starts.
    pub bytes_used_for_local_header: u64,
    /// Length of the data descriptor following this entry's body, zero when none was
    /// written (the known-sizes path never emits one).
    pub bytes_used_for_data_descriptor: u64,
}

impl Entry {
    /// True iff the filename contains any byte outside the 7-bit ASCII range, which
    /// requires the EFS (UTF-8 filename) general-purpose flag bit to be set.
    pub fn requires_efs_flag(&self) -> bool {
        self.filename.bytes().any(|b| b > 0x7f)
    }

    /// True iff this entry's own sizes exceed what a 32-bit ZIP field can hold, and so its
    /// *local* header needs a Zip64 extra field. Central-directory Zip64-ness additionally
    /// considers the local header offset; see [`Entry::central_requires_zip64`].
    pub fn local_requires_zip64(&self) -> bool {
        self.uncompressed_size > u32::MAX as u64 || self.compressed_size > u32::MAX as u64
    }

    /// True iff the central-directory record for this entry needs a Zip64 extra field:
    /// either of its sizes, or its local header offset, overflow 32 bits.
    pub fn central_requires_zip64(&self) -> bool {
        self.local_requires_zip64() || self.local_header_offset > u32::MAX as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(filename: &str) -> Entry {
        Entry {
            filename: filename.to_string(),
            storage_mode: StorageMode::Stored,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            mtime: DosTimestamp::default(),
            use_data_descriptor: false,
            local_header_offset: 0,
            bytes_used_for_local_header: 0,
            bytes_used_for_data_descriptor: 0,
        }
    }

    #[test]
    fn efs_flag_tracks_non_ascii_bytes() {
        assert!(!sample_entry("plain.txt").requires_efs_flag());
        assert!(sample_entry("Kungälv.txt").requires_efs_flag());
    }

    #[test]
    fn zip64_thresholds() {
        let mut e = sample_entry("big.bin");
        assert!(!e.local_requires_zip64());
        e.uncompressed_size = u32::MAX as u64 + 1;
        assert!(e.local_requires_zip64());
        assert!(e.central_requires_zip64());

        let mut e2 = sample_entry("offset.bin");
        e2.local_header_offset = u32::MAX as u64 + 1;
        assert!(!e2.local_requires_zip64());
        assert!(e2.central_requires_zip64());
    }
}
