//! Error types for zip-core

use std::io;

/// Result type for zip-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy surfaced distinctly by the engine (see spec §7).
#[derive(Debug)]
pub enum Error {
    /// Bad CLI input / API misuse at the core's boundary
    Usage(String),
    /// Bad CLI input that maps to exit code 10 ("unsupported option") rather than 16
    UnsupportedOption(String),
    /// Underlying read/write/open failure, with the path that was being accessed
    Io {
        source: io::Error,
        path: Option<String>,
    },
    /// Short read at a format boundary (fewer bytes than a record demands)
    Truncated(String),
    /// No EOCD record could be found in the file
    NotAnArchive,
    /// Stored CRC-32 does not match the recomputed value
    BadCrc { name: String },
    /// A record signature did not match what was expected at that offset
    BadSignature { expected: u32, found: u32 },
    /// A TLV extra field was malformed (truncated or inconsistent length)
    BadExtra(String),
    /// EOCD reports more than one disk
    MultiDisk,
    /// Compression method id is not store (0) or deflate (8)
    UnsupportedMethod(u16),
    /// Entry uses traditional ZIP crypto or AE-x; reading payload is refused
    UnsupportedEncryption,
    /// Entry name would escape the extraction root after normalization
    NameUnsafe(String),
    /// Planner determined there was nothing to do (update/freshen with no match)
    NothingToDo,
    /// Extraction target exists and overwrite policy is non-interactive `never`
    FileExists(String),
    /// Host requested cooperative cancellation; archive left untouched
    Cancelled,
    /// An entry was not found by name
    EntryNotFound(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Usage(msg) => write!(f, "usage error: {}", msg),
            Error::UnsupportedOption(flag) => write!(f, "unsupported option: {}", flag),
            Error::Io {
                source,
                path: Some(p),
            } => write!(f, "I/O error on {}: {}", p, source),
            Error::Io { source, path: None } => write!(f, "I/O error: {}", source),
            Error::Truncated(ctx) => write!(f, "truncated archive: {}", ctx),
            Error::NotAnArchive => write!(f, "end of central directory record not found"),
            Error::BadCrc { name } => write!(f, "CRC-32 mismatch for {}", name),
            Error::BadSignature { expected, found } => write!(
                f,
                "bad record signature: expected 0x{:08x}, found 0x{:08x}",
                expected, found
            ),
            Error::BadExtra(msg) => write!(f, "malformed extra field: {}", msg),
            Error::MultiDisk => write!(f, "multi-disk archives are not supported"),
            Error::UnsupportedMethod(m) => write!(f, "unsupported compression method: {}", m),
            Error::UnsupportedEncryption => write!(f, "unsupported encryption"),
            Error::NameUnsafe(name) => write!(f, "unsafe entry name: {}", name),
            Error::NothingToDo => write!(f, "nothing to do"),
            Error::FileExists(name) => write!(f, "file exists (non-interactive): {}", name),
            Error::Cancelled => write!(f, "operation cancelled"),
            Error::EntryNotFound(name) => write!(f, "entry not found: {}", name),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Error::Io { source, path: None }
    }
}

impl Error {
    /// Attaches a path to an I/O error for context; other variants pass through.
    pub fn with_path(self, path: impl Into<String>) -> Self {
        match self {
            Error::Io { source, .. } => Error::Io {
                source,
                path: Some(path.into()),
            },
            other => other,
        }
    }

    /// Maps an error onto the process exit codes required by spec §6.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::FileExists(_) => 2,
            Error::UnsupportedOption(_) => 10,
            Error::NothingToDo => 12,
            Error::Usage(_) => 16,
            _ => 1,
        }
    }
}
