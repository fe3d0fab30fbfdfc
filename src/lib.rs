//! # streamzip: forward-only streaming ZIP archive writer
//!
//! `streamzip` builds ZIP archives against any [`std::io::Write`] sink, writing each record
//! exactly once as entries are added and never seeking back to patch an earlier header.
//! That forward-only discipline is what lets it target sockets and HTTP response bodies, not
//! just seekable files, and is also why it upgrades to Zip64 per-record rather than deciding
//! once at the end.
//!
//! Reading ZIP archives, encryption, and non-DEFLATE/non-stored compression methods are out
//! of scope: this crate only writes.
//!
//! ## Known sizes up front
//!
//! When the caller already knows an entry's final size and CRC (e.g. it was computed in an
//! earlier pass, or the data is stored rather than compressed), the local header can carry
//! the real values immediately and no data descriptor is needed:
//!
//! ```
//! use streamzip::Streamer;
//!
//! let data = b"Hello, World!";
//! let crc = crc32fast::hash(data);
//!
//! let mut streamer = Streamer::new(Vec::new());
//! streamer.add_stored_entry("hello.txt", data.len() as u64, crc)?;
//! streamer.append(data)?;
//! let archive_bytes = streamer.close()?;
//! # Ok::<(), streamzip::Error>(())
//! ```
//!
//! ## Unknown sizes
//!
//! When the final size isn't known until the body has been fully written (the common case
//! for streamed/generated content), use the unknown-sizes path: the streamer computes CRC
//! and sizes itself and emits a data descriptor after the body.
//!
//! ```
//! use streamzip::Streamer;
//!
//! let mut streamer = Streamer::new(Vec::new());
//! {
//!     let mut body = streamer.write_deflated_file("generated.txt")?;
//!     body.write(b"streamed content, ")?;
//!     body.write(b"written in pieces")?;
//!     body.close()?;
//! }
//! let archive_bytes = streamer.close()?;
//! # Ok::<(), streamzip::Error>(())
//! ```

pub mod body;
pub mod chunks;
pub mod crc;
pub mod dostime;
pub mod entry;
pub mod error;
pub mod estimator;
pub mod records;
pub mod sink;
pub mod streamer;

pub use chunks::{ChunkedArchive, PendingEntry};
pub use entry::StorageMode;
pub use error::{Error, Result};
pub use estimator::SizeEstimator;
pub use streamer::{EntryBody, Streamer, StreamerOptions};
