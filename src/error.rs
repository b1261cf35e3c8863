use crate::field::Compression;
use thiserror::Error;

/// Anything that can go wrong reading or writing an IDX dataset.
#[derive(Debug, Error)]
pub enum Error {
    /// The descriptor failed a structural check (e.g. an empty bit string, a
    /// bit string longer than 64 characters, or `box` extents that don't
    /// match the bit string's implied resolution).
    #[error("invalid idx file: {0}")]
    InvalidIdxFile(String),

    /// No field with the requested name or index exists on this descriptor.
    #[error("field not found: {0}")]
    FieldNotFound(String),

    /// The requested timestep falls outside `[begin, end]`.
    #[error("time step not found: {0}")]
    TimeStepNotFound(f64),

    /// `level` is outside `[0, max_hz]`.
    #[error("invalid hz level: {0}")]
    InvalidHzLevel(u32),

    /// The caller's grid extent is malformed (e.g. `from` > `to` on some
    /// axis, or a non power-of-two stride).
    #[error("invalid volume")]
    InvalidVolume,

    /// The caller's grid extent does not fit inside `idx.box`.
    #[error("volume too big")]
    VolumeTooBig,

    /// A file expected to exist for a write could not be found. The read
    /// path never returns this: a missing file is treated as all-absent.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// A header table was expected but the file was too short to contain
    /// one.
    #[error("header not found in {0}")]
    HeaderNotFound(String),

    /// A block's header says it is present but its payload could not be
    /// located.
    #[error("block not found at offset {0}")]
    BlockNotFound(u64),

    /// A present block's payload could not be read in full.
    #[error("block read failed: {0}")]
    BlockReadFailed(String),

    /// A block's payload could not be written in full.
    #[error("block write failed: {0}")]
    BlockWriteFailed(String),

    /// The header table could not be flushed back to disk.
    #[error("header write failed: {0}")]
    HeaderWriteFailed(String),

    /// A compressed block failed to decompress to its recorded size.
    #[error("invalid compression")]
    InvalidCompression,

    /// The block's codec tag is recognized but not implemented.
    #[error("compression unsupported: {0:?}")]
    CompressionUnsupported(Compression),

    /// A block's `format` tag was neither `RowMajor` nor `Hz`.
    #[error("invalid format")]
    InvalidFormat,

    /// The text descriptor could not be parsed.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Wraps any I/O failure not otherwise classified above.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A text descriptor field was not valid UTF-8.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

/// This crate's result alias.
pub type Result<T> = std::result::Result<T, Error>;
