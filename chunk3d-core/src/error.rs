/// Decoder error types
use std::io;

use thiserror::Error;

/// Structural problems in the record stream.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("not a recognized model file (first record tag 0x{tag:04X})")]
    NotAModelFile { tag: u16 },

    #[error("corrupt record tag 0x{tag:04X} at offset {offset}")]
    CorruptTag { tag: u16, offset: u64 },

    #[error("record 0x{tag:04X} at offset {offset} declares impossible length {length}")]
    BadLength { tag: u16, offset: u64, length: u32 },

    /// A read would run past the end of the record it belongs to.
    #[error(
        "record 0x{tag:04X} at offset {offset} out of sync: \
         {consumed} of {length} bytes consumed, {requested} more requested"
    )]
    OutOfSync {
        tag: u16,
        offset: u64,
        consumed: u32,
        length: u32,
        requested: u32,
    },

    #[error("entity '{entity}' has {uvs} texture coordinates for {vertices} vertices")]
    UvCountMismatch {
        entity: String,
        uvs: usize,
        vertices: usize,
    },

    #[error("malformed payload in record 0x{tag:04X}: {message}")]
    Payload { tag: u16, message: String },
}

/// Anything that can abort a decode.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecodeError>;
