//! Error types for streamzip

use std::fmt;
use std::io;

/// Result type for streamzip operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building a ZIP archive
#[derive(Debug)]
pub enum Error {
    /// Underlying sink failed
    Io(io::Error),
    /// A declared or observed entry size exceeds what ZIP64 can represent
    OversizeEntry(String),
    /// The caller wrote fewer or more bytes than the declared size for a known-size entry
    SizeMismatch {
        /// entry name
        name: String,
        /// size declared via `add_stored_entry`/`add_deflated_entry`
        declared: u64,
        /// bytes actually written via `append`
        written: u64,
    },
    /// Attempted to start a new entry while another entry's body is still open
    DuplicateOpenBody,
    /// Attempted to write to a body or streamer that has already been closed
    WriteAfterClose,
    /// Filename exceeds the 65,535-byte limit ZIP headers can encode
    FilenameTooLong(usize),
    /// Filename is empty
    EmptyFilename,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::OversizeEntry(name) => {
                write!(f, "entry {name:?} exceeds the maximum representable ZIP64 size")
            }
            Error::SizeMismatch {
                name,
                declared,
                written,
            } => write!(
                f,
                "entry {name:?} declared {declared} bytes but {written} were written"
            ),
            Error::DuplicateOpenBody => {
                write!(f, "an entry is already open; finish it before starting another")
            }
            Error::WriteAfterClose => write!(f, "write attempted after close"),
            Error::FilenameTooLong(len) => {
                write!(f, "filename is {len} bytes, which exceeds the 65,535-byte limit")
            }
            Error::EmptyFilename => write!(f, "filename must not be empty"),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}
