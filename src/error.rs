//! Error types for the noteblock library

use std::io;

/// Library error type for reading and writing note block songs
#[derive(Debug, thiserror::Error)]
pub enum NbsError {
    /// The input ended before a field or a text payload was complete
    #[error("truncated input while parsing {0}")]
    Truncated(String),

    /// Any other parsing failure
    #[error("parsing error: {0}")]
    ParsingError(String),

    /// Format revision outside 0..=5
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u8),

    /// Text that cannot be represented in Windows-1252
    #[error("encoding error: {0}")]
    EncodingError(String),

    /// Value that does not fit the width of its field on the wire
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// Two notes share the same position in the grid
    #[error("duplicate note at tick {tick} on layer {layer}")]
    DuplicateNote { tick: u32, layer: u32 },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<io::Error> for NbsError {
    fn from(error: io::Error) -> Self {
        Self::IoError(error.to_string())
    }
}
