//! NDR error types

use thiserror::Error;

/// NDR encoding/decoding errors
///
/// The first error raised anywhere in a marshal or unmarshal pass aborts the
/// whole pass; callers never see a partially decoded value.
#[derive(Debug, Error)]
pub enum NdrError {
    /// Read past the end of the input (scalar, alignment padding or element)
    #[error("truncated input: needed {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },

    /// A transmitted size exceeds what is left of the input
    #[error("buffer overflow: declared size {size} exceeds remaining {remaining} bytes")]
    BufferOverflow { size: u64, remaining: usize },

    /// Union discriminant with no matching arm and no default arm
    #[error("unsupported union discriminant: {0}")]
    UnsupportedDiscriminant(u64),

    /// The output sink refused the write
    #[error("write failure: needed {needed} bytes, capacity {capacity}")]
    WriteFailure { needed: usize, capacity: usize },

    /// Invalid string framing
    #[error("invalid string: {0}")]
    InvalidString(String),

    /// Transmitted size disagrees with the length carried by a sibling field
    #[error("array size mismatch: expected {expected}, got {got}")]
    ArraySizeMismatch { expected: u64, got: u64 },

    /// Integer does not fit the wire width of the transfer syntax
    #[error("value {value} does not fit in {width} bytes")]
    ValueOutOfRange { value: i128, width: usize },

    /// Sized array declares far more elements than the data supplies
    #[error("array declares {declared} elements but only {supplied} are present")]
    ExcessivePadding { declared: u64, supplied: usize },

    /// Varying part does not fit in the conformant maximum
    #[error("conformance mismatch: max_count={max_count}, actual_count={actual_count}")]
    ConformanceMismatch { max_count: u64, actual_count: u64 },

    /// UTF-8 decoding error
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// UTF-16 decoding error
    #[error("UTF-16 error: {0}")]
    Utf16(#[from] std::char::DecodeUtf16Error),
}

/// Result type for NDR operations
pub type Result<T> = std::result::Result<T, NdrError>;
