//! Error types for WAD archive operations

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WadError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid entry name {0:?}")]
    InvalidName(String),

    #[error("{field} out of range: {value}")]
    ValueOutOfRange { field: &'static str, value: i64 },

    #[error("entry index {index} out of range (archive has {len} entries)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("mismatched bulk arrays: {names} names, {blobs} data blobs")]
    ArityMismatch { names: usize, blobs: usize },

    #[error("not a WAD file: bad magic {0:02x?}")]
    InvalidMagic([u8; 4]),

    #[error("invalid header field {field}: {value}")]
    InvalidHeader { field: &'static str, value: i64 },

    #[error("truncated record: expected {expected} bytes, got {actual}")]
    TruncatedRecord { expected: usize, actual: usize },

    #[error("entry range {offset}+{size} exceeds content extent {extent}")]
    TruncatedData { offset: u64, size: u64, extent: u64 },
}

pub type Result<T> = std::result::Result<T, WadError>;
