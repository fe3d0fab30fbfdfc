//! `SizeEstimator`: predicts the exact final archive size of a set of entries without
//! writing any bytes, for callers that must set a `Content-Length` before streaming starts.
//!
//! It mirrors `Streamer`'s bookkeeping (offsets, Zip64 decisions) but calls the very same
//! `records` encoder functions the streamer uses and only looks at their lengths, so the
//! two can never drift apart on how many bytes a given record takes.

use crate::dostime::DosTimestamp;
use crate::entry::{Entry, StorageMode};
use crate::error::{Error, Result};
use crate::records;

/// Accumulates entries and reports the exact byte size the resulting archive will have.
#[derive(Debug, Default)]
pub struct SizeEstimator {
    entries: Vec<Entry>,
    offset: u64,
}

impl SizeEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate_filename(filename: &str) -> Result<()> {
        if filename.is_empty() {
            return Err(Error::EmptyFilename);
        }
        if filename.len() > 65_535 {
            return Err(Error::FilenameTooLong(filename.len()));
        }
        Ok(())
    }

    fn push_entry(
        &mut self,
        filename: &str,
        mode: StorageMode,
        uncompressed_size: u64,
        crc32: u32,
        compressed_size: u64,
    ) -> Result<()> {
        Self::validate_filename(filename)?;

        let entry = Entry {
            filename: filename.to_string(),
            storage_mode: mode,
            crc32,
            compressed_size,
            uncompressed_size,
            mtime: DosTimestamp::default(),
            use_data_descriptor: false,
            local_header_offset: self.offset,
            bytes_used_for_local_header: 0,
            bytes_used_for_data_descriptor: 0,
        };

        let local_header_len = records::local_file_header(&entry).len() as u64;
        self.offset += local_header_len;
        self.offset += compressed_size;

        self.entries.push(entry);
        Ok(())
    }

    /// Account for a stored entry whose exact size and CRC are already known.
    pub fn add_stored_entry(&mut self, filename: &str, size: u64, crc32: u32) -> Result<()> {
        self.push_entry(filename, StorageMode::Stored, size, crc32, size)
    }

    /// Account for a deflated entry whose compressed size and CRC are already known.
    pub fn add_deflated_entry(
        &mut self,
        filename: &str,
        uncompressed_size: u64,
        crc32: u32,
        compressed_size: u64,
    ) -> Result<()> {
        self.push_entry(filename, StorageMode::Deflated, uncompressed_size, crc32, compressed_size)
    }

    /// Account for a stored, zero-byte directory entry.
    pub fn add_empty_directory(&mut self, dirname: &str) -> Result<()> {
        let mut filename = dirname.to_string();
        if !filename.ends_with('/') {
            filename.push('/');
        }
        self.add_stored_entry(&filename, 0, 0)
    }

    /// The exact final archive size, including the central directory and EOCD record(s).
    pub fn total_size(&self) -> u64 {
        let central_dir_offset = self.offset;
        let central_dir_size: u64 = self
            .entries
            .iter()
            .map(|e| records::central_directory_header(e).len() as u64)
            .sum();

        let mut total = central_dir_offset + central_dir_size;

        if records::archive_requires_zip64(&self.entries, central_dir_size, central_dir_offset) {
            total += records::zip64_eocd(self.entries.len() as u64, central_dir_size, central_dir_offset).len() as u64;
            total += records::zip64_eocd_locator(total).len() as u64;
        }

        total += records::eocd(self.entries.len() as u64, central_dir_size, central_dir_offset).len() as u64;
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_a_real_streamer_for_two_stored_entries() {
        let mut est = SizeEstimator::new();
        est.add_stored_entry("a.txt", 5, crc32fast::hash(b"hello")).unwrap();
        est.add_stored_entry("b.txt", 3, crc32fast::hash(b"bye")).unwrap();

        let mut s = crate::streamer::Streamer::new(Vec::new());
        s.add_stored_entry("a.txt", 5, crc32fast::hash(b"hello")).unwrap();
        s.append(b"hello").unwrap();
        s.add_stored_entry("b.txt", 3, crc32fast::hash(b"bye")).unwrap();
        s.append(b"bye").unwrap();
        let written = s.close().unwrap();

        assert_eq!(est.total_size(), written.len() as u64);
    }

    #[test]
    fn empty_directory_costs_only_a_local_header_and_central_record() {
        let mut est = SizeEstimator::new();
        est.add_empty_directory("photos").unwrap();
        assert!(est.total_size() > 0);
    }
}
