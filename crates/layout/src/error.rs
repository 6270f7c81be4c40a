//! Layout engine errors.

use slotscope_core::Slot;
use slotscope_storage::StorageError;
use thiserror::Error;

/// Errors raised by allocation, resolution and value encoding.
///
/// Addressing errors are detected before any word store access and always
/// indicate a schema or caller bug; none of them is transient.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("invalid type: {0}")]
    InvalidType(String),

    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    #[error("unknown field '{field}' in struct {ty}")]
    UnknownField { ty: String, field: String },

    #[error("path type mismatch at depth {depth}: {found} segment applied to {expected}")]
    PathTypeMismatch {
        depth: usize,
        expected: String,
        found: String,
    },

    #[error("path too short: {ty} cannot be read or written as a whole")]
    PathTooShort { ty: String },

    #[error("path too long: {remaining} segment(s) left after reaching {ty}")]
    PathTooLong { remaining: usize, ty: String },

    #[error("value {value} does not fit in {width} byte(s)")]
    EncodingOverflow { value: String, width: u8 },

    #[error("value type mismatch: expected {expected}, found {found}")]
    ValueTypeMismatch { expected: String, found: String },

    #[error("array length mismatch: expected {expected} elements, found {found}")]
    ArrayLengthMismatch { expected: u64, found: usize },

    #[error("byte range out of word: offset {offset}, width {width}")]
    ByteRange { offset: u8, width: u8 },

    #[error("corrupt encoding at slot {slot}: {reason}")]
    CorruptEncoding { slot: Slot, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, LayoutError>;
