use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open {}: {source}", path.display())]
    Open { path: PathBuf, source: io::Error },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("read at offset {offset} failed after {attempts} attempts: {source}")]
    Read {
        offset: u64,
        attempts: u32,
        source: io::Error,
    },

    #[error("operation cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("worker thread panicked")]
    WorkerPanicked,

    #[error("{0} is not supported")]
    Unsupported(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// True for the two errors produced by a fired [`crate::CancelToken`].
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a record was rejected by the address codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty address")]
    Empty,

    #[error("expected 4 octets in {0:?}")]
    OctetCount(String),

    #[error("unexpected byte {byte:#04x} in {text:?}")]
    InvalidByte { byte: u8, text: String },

    #[error("empty octet in {0:?}")]
    EmptyOctet(String),

    #[error("octet longer than 3 digits in {0:?}")]
    OctetTooLong(String),

    #[error("octet with leading zero in {0:?}")]
    LeadingZero(String),

    #[error("octet above 255 in {0:?}")]
    OutOfRange(String),
}
