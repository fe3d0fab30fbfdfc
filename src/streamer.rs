//! The streaming state machine: the orchestrator that sequences local headers, entry
//! bodies, optional data descriptors, the central directory, and the EOCD record(s).

use std::io::Write;

use flate2::Compression;

use crate::body::{DeflatedBodyWriter, StoredBodyWriter, DEFAULT_DEFLATE_FLUSH_INTERVAL};
use crate::crc::{WriteBuffer, DEFAULT_BUFFER_CAPACITY};
use crate::dostime::DosTimestamp;
use crate::entry::{Entry, StorageMode};
use crate::error::{Error, Result};
use crate::records;
use crate::sink::OffsetTrackingSink;

/// Tunables for a [`Streamer`]: write-buffer capacity, DEFLATE compression level, and the
/// periodic flush interval for large deflated entries.
#[derive(Debug, Clone)]
pub struct StreamerOptions {
    write_buffer_capacity: usize,
    compression_level: u32,
    deflate_flush_interval: u64,
}

impl Default for StreamerOptions {
    fn default() -> Self {
        Self {
            write_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            compression_level: 6,
            deflate_flush_interval: DEFAULT_DEFLATE_FLUSH_INTERVAL,
        }
    }
}

impl StreamerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write-coalescing buffer's capacity in bytes.
    pub fn with_write_buffer_capacity(mut self, capacity: usize) -> Self {
        assert!(capacity > 0, "write_buffer_capacity must be at least 1");
        self.write_buffer_capacity = capacity;
        self
    }

    /// Set the DEFLATE compression level (0-9), used by the unknown-sizes deflated path.
    pub fn with_compression_level(mut self, level: u32) -> Self {
        assert!(level <= 9, "compression_level must be 0-9");
        self.compression_level = level;
        self
    }

    /// Set how many uncompressed bytes accumulate between periodic encoder flushes on the
    /// unknown-sizes deflated path, bounding DEFLATE's internal buffering for large entries.
    pub fn with_deflate_flush_interval(mut self, interval: u64) -> Self {
        assert!(interval > 0, "deflate_flush_interval must be at least 1");
        self.deflate_flush_interval = interval;
        self
    }
}

enum OpenBody {
    KnownSize {
        entry_index: usize,
        remaining: u64,
    },
    UnknownStored {
        entry_index: usize,
        writer: StoredBodyWriter,
    },
    UnknownDeflated {
        entry_index: usize,
        writer: DeflatedBodyWriter,
    },
}

enum State {
    Idle,
    Open(OpenBody),
    Closed,
}

/// Orchestrates writing one forward-only ZIP archive to `W`.
///
/// Not safe to share across threads while an entry is open: every operation takes `&mut
/// self`, so the borrow checker already prevents concurrent use within one process: this
/// is a convention, not a marker-type restriction.
pub struct Streamer<W: Write> {
    sink: OffsetTrackingSink<WriteBuffer<W>>,
    entries: Vec<Entry>,
    state: State,
    compression_level: Compression,
    deflate_flush_interval: u64,
}

impl<W: Write> Streamer<W> {
    /// Wrap `sink` with default tuning (64 KiB write buffer, DEFLATE level 6).
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, StreamerOptions::default())
    }

    /// Wrap `sink` with caller-chosen tuning.
    pub fn with_options(sink: W, options: StreamerOptions) -> Self {
        Self {
            sink: OffsetTrackingSink::new(WriteBuffer::with_capacity(
                sink,
                options.write_buffer_capacity,
            )),
            entries: Vec::new(),
            state: State::Idle,
            compression_level: Compression::new(options.compression_level),
            deflate_flush_interval: options.deflate_flush_interval,
        }
    }

    /// Number of bytes written to the sink so far; the offset the next record will land at.
    pub fn offset(&self) -> u64 {
        self.sink.offset()
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

    /// Fails if a new entry cannot be started right now: the streamer is closed, an
    /// unknown-size body is still open, or a known-size entry hasn't received its full
    /// declared byte count yet.
    fn guard_new_entry(&self) -> Result<()> {
        match &self.state {
            State::Idle => Ok(()),
            State::Closed => Err(Error::WriteAfterClose),
            State::Open(OpenBody::KnownSize {
                entry_index,
                remaining,
            }) if *remaining > 0 => {
                let entry = &self.entries[*entry_index];
                Err(Error::SizeMismatch {
                    name: entry.filename.clone(),
                    declared: entry.compressed_size,
                    written: entry.compressed_size - *remaining,
                })
            }
            State::Open(_) => Err(Error::DuplicateOpenBody),
        }
    }

    /// Write the local header for a new entry. `crc32`/`uncompressed_size`/`compressed_size`
    /// must already hold whatever is known at this point: the real values for the
    /// known-sizes path (written straight into the header, since the body follows on this
    /// forward-only sink and the header can never be patched later), or zeros for the
    /// unknown-sizes path (where `use_data_descriptor` makes the encoder ignore them and
    /// emit placeholders instead).
    fn open_entry(
        &mut self,
        filename: &str,
        mode: StorageMode,
        use_data_descriptor: bool,
        crc32: u32,
        uncompressed_size: u64,
        compressed_size: u64,
    ) -> Result<usize> {
        self.guard_new_entry()?;
        Self::validate_filename(filename)?;

        let entry_index = self.entries.len();
        let local_header_offset = self.sink.offset();
        let mut entry = Entry {
            filename: filename.to_string(),
            storage_mode: mode,
            crc32,
            compressed_size,
            uncompressed_size,
            mtime: DosTimestamp::now(),
            use_data_descriptor,
            local_header_offset,
            bytes_used_for_local_header: 0,
            bytes_used_for_data_descriptor: 0,
        };

        let header = records::local_file_header(&entry);
        entry.bytes_used_for_local_header = header.len() as u64;
        self.sink.write_all(&header)?;
        self.entries.push(entry);
        Ok(entry_index)
    }

    fn add_known_size_entry(
        &mut self,
        filename: &str,
        mode: StorageMode,
        uncompressed_size: u64,
        crc32: u32,
        compressed_size: u64,
    ) -> Result<()> {
        let entry_index = self.open_entry(
            filename,
            mode,
            false,
            crc32,
            uncompressed_size,
            compressed_size,
        )?;
        self.state = if compressed_size == 0 {
            State::Idle
        } else {
            State::Open(OpenBody::KnownSize {
                entry_index,
                remaining: compressed_size,
            })
        };
        Ok(())
    }

    /// Known-sizes path for a stored entry: writes the local header immediately using
    /// `size`/`crc32`. The caller must then write exactly `size` bytes via [`Streamer::append`].
    pub fn add_stored_entry(&mut self, filename: &str, size: u64, crc32: u32) -> Result<()> {
        self.add_known_size_entry(filename, StorageMode::Stored, size, crc32, size)
    }

    /// Known-sizes path for a deflated entry: the caller supplies already-compressed bytes
    /// (this crate does not compress on this path) and must write exactly `compressed_size`
    /// of them via [`Streamer::append`].
    pub fn add_deflated_entry(
        &mut self,
        filename: &str,
        uncompressed_size: u64,
        crc32: u32,
        compressed_size: u64,
    ) -> Result<()> {
        self.add_known_size_entry(
            filename,
            StorageMode::Deflated,
            uncompressed_size,
            crc32,
            compressed_size,
        )
    }

    /// Append body bytes for the entry opened by `add_stored_entry`/`add_deflated_entry`.
    /// Once exactly the declared size has been written, the streamer returns to `Idle`.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        let (entry_index, new_remaining) = match &mut self.state {
            State::Open(OpenBody::KnownSize {
                entry_index,
                remaining,
            }) => {
                if data.len() as u64 > *remaining {
                    let entry = &self.entries[*entry_index];
                    let written = entry.compressed_size - *remaining + data.len() as u64;
                    return Err(Error::SizeMismatch {
                        name: entry.filename.clone(),
                        declared: entry.compressed_size,
                        written,
                    });
                }
                *remaining -= data.len() as u64;
                (*entry_index, *remaining)
            }
            State::Closed => return Err(Error::WriteAfterClose),
            State::Idle | State::Open(_) => return Err(Error::WriteAfterClose),
        };

        self.sink.write_all(data)?;

        if new_remaining == 0 {
            let entry = &self.entries[entry_index];
            debug_assert_eq!(
                self.sink.offset(),
                entry.local_header_offset + entry.bytes_used_for_local_header + entry.compressed_size,
                "entry {:?}: body bytes written don't add up to its declared size",
                entry.filename
            );
            self.state = State::Idle;
        }
        Ok(())
    }

    /// Unknown-sizes path for a stored entry. Returns a handle the caller drives with
    /// [`EntryBody::write`] and must finish with [`EntryBody::close`].
    pub fn write_stored_file(&mut self, filename: &str) -> Result<EntryBody<'_, W>> {
        let entry_index = self.open_entry(filename, StorageMode::Stored, true, 0, 0, 0)?;
        self.state = State::Open(OpenBody::UnknownStored {
            entry_index,
            writer: StoredBodyWriter::new(),
        });
        Ok(EntryBody { streamer: self })
    }

    /// Unknown-sizes path for a deflated entry. Returns a handle the caller drives with
    /// [`EntryBody::write`] and must finish with [`EntryBody::close`].
    pub fn write_deflated_file(&mut self, filename: &str) -> Result<EntryBody<'_, W>> {
        let entry_index = self.open_entry(filename, StorageMode::Deflated, true, 0, 0, 0)?;
        self.state = State::Open(OpenBody::UnknownDeflated {
            entry_index,
            writer: DeflatedBodyWriter::new(self.compression_level, self.deflate_flush_interval),
        });
        Ok(EntryBody { streamer: self })
    }

    /// Emit a stored, zero-byte entry named `dirname` with a trailing `/` appended if not
    /// already present.
    pub fn add_empty_directory(&mut self, dirname: &str) -> Result<()> {
        let mut filename = dirname.to_string();
        if !filename.ends_with('/') {
            filename.push('/');
        }
        self.add_known_size_entry(&filename, StorageMode::Stored, 0, 0, 0)
    }

    fn finish_open_unknown_entry(&mut self) -> Result<()> {
        let (entry_index, crc32, compressed_size, uncompressed_size, tail) =
            match std::mem::replace(&mut self.state, State::Idle) {
                State::Open(OpenBody::UnknownStored {
                    entry_index,
                    writer,
                }) => {
                    let r = writer.finish();
                    (entry_index, r.crc32, r.compressed_size, r.uncompressed_size, Vec::new())
                }
                State::Open(OpenBody::UnknownDeflated {
                    entry_index,
                    writer,
                }) => {
                    let (r, tail) = writer.finish()?;
                    (entry_index, r.crc32, r.compressed_size, r.uncompressed_size, tail)
                }
                other => {
                    // Nothing unknown-size is open (already finished, or a known-size
                    // entry is open). Restore state and no-op: this path exists so that
                    // EntryBody's Drop can call us unconditionally after `close()` already
                    // did the real work.
                    self.state = other;
                    return Ok(());
                }
            };

        if !tail.is_empty() {
            self.sink.write_all(&tail)?;
        }

        let descriptor = records::data_descriptor(crc32, compressed_size, uncompressed_size);
        self.sink.write_all(&descriptor)?;
        let offset_after_descriptor = self.sink.offset();

        let entry = &mut self.entries[entry_index];
        entry.crc32 = crc32;
        entry.compressed_size = compressed_size;
        entry.uncompressed_size = uncompressed_size;
        entry.bytes_used_for_data_descriptor = descriptor.len() as u64;

        debug_assert_eq!(
            offset_after_descriptor,
            entry.local_header_offset
                + entry.bytes_used_for_local_header
                + entry.compressed_size
                + entry.bytes_used_for_data_descriptor,
            "entry {:?}: body + data descriptor bytes don't add up to the sink's offset",
            entry.filename
        );

        Ok(())
    }

    /// Emit the central directory and EOCD record(s), consuming the streamer and handing
    /// back the underlying sink. No further entries may be added afterward (the streamer
    /// no longer exists to add them to).
    pub fn close(mut self) -> Result<W> {
        self.guard_new_entry()?;

        let central_dir_offset = self.sink.offset();
        for entry in &self.entries {
            let header = records::central_directory_header(entry);
            self.sink.write_all(&header)?;
        }
        let central_dir_size = self.sink.offset() - central_dir_offset;

        if records::archive_requires_zip64(&self.entries, central_dir_size, central_dir_offset) {
            let zip64_eocd_offset = self.sink.offset();
            let zip64 = records::zip64_eocd(
                self.entries.len() as u64,
                central_dir_size,
                central_dir_offset,
            );
            self.sink.write_all(&zip64)?;

            let locator = records::zip64_eocd_locator(zip64_eocd_offset);
            self.sink.write_all(&locator)?;
        }

        let eocd = records::eocd(
            self.entries.len() as u64,
            central_dir_size,
            central_dir_offset,
        );
        self.sink.write_all(&eocd)?;

        let buffered = self.sink.into_inner();
        let inner = buffered.into_inner()?;
        Ok(inner)
    }
}

/// Handle for the unknown-sizes body-writing path. Borrows the streamer mutably for the
/// lifetime of one entry; an explicit handle rather than a callback, per the "no
/// coroutines required" design note.
pub struct EntryBody<'a, W: Write> {
    streamer: &'a mut Streamer<W>,
}

impl<'a, W: Write> EntryBody<'a, W> {
    /// Feed more uncompressed bytes into the open entry.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        match &mut self.streamer.state {
            State::Open(OpenBody::UnknownStored { writer, .. }) => {
                writer.write(data);
                self.streamer.sink.write_all(data)?;
                Ok(())
            }
            State::Open(OpenBody::UnknownDeflated { writer, .. }) => {
                let ready = writer.write(data)?;
                if !ready.is_empty() {
                    self.streamer.sink.write_all(&ready)?;
                }
                Ok(())
            }
            _ => Err(Error::WriteAfterClose),
        }
    }

    /// Finish the entry: drains the encoder, writes the data descriptor, and returns
    /// control to the streamer for the next `add_*`/`write_*_file` call.
    pub fn close(self) -> Result<()> {
        // `self.streamer` is reachable through a plain field access; dropping `self`
        // afterward runs `Drop::drop`, which calls the same finisher again and finds
        // nothing left open (see the `other =>` arm in `finish_open_unknown_entry`).
        self.streamer.finish_open_unknown_entry()
    }
}

impl<'a, W: Write> Drop for EntryBody<'a, W> {
    fn drop(&mut self) {
        let _ = self.streamer.finish_open_unknown_entry();
    }
}
