//! Error taxonomy for layout compilation, encoding, decoding and JSON conversion.
//!
//! Every fallible operation in the crate returns [`CodecResult`]. Decode errors
//! carry the absolute byte offset at which the input stopped making sense, so a
//! failing account or instruction can be diagnosed without re-running the decode.

use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::discriminator::{Discriminator, Namespace};

/// Result alias used throughout the codec.
pub type CodecResult<T> = Result<T, CodecError>;

/// Fieldless mirror of [`CodecError`] for matching on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TruncatedInput,
    InvalidTag,
    LayoutMismatch,
    DiscriminatorMismatch,
    UnknownDiscriminator,
    OwnershipMismatch,
    ArgumentShapeError,
    JsonShapeError,
    DuplicateDiscriminator,
    UnknownTypeName,
    DuplicateTypeName,
    CyclicType,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes available than the layout requires.
    #[error("Truncated input at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// An option flag, bool or enum index outside its valid range.
    #[error("Invalid {what} tag {tag} at offset {offset}")]
    InvalidTag {
        offset: usize,
        tag: u64,
        what: &'static str,
    },

    /// Structural inconsistency between bytes and layout not covered above.
    #[error("Layout mismatch at offset {offset}: {message}")]
    LayoutMismatch { offset: usize, message: String },

    #[error("Discriminator mismatch: expected {expected}, got {actual}")]
    DiscriminatorMismatch {
        expected: Discriminator,
        actual: Discriminator,
    },

    /// No instruction or account of the program owns this discriminator.
    #[error("Unknown discriminator {discriminator}")]
    UnknownDiscriminator { discriminator: Discriminator },

    #[error("Account owned by {actual}, expected program {expected}")]
    OwnershipMismatch { expected: Pubkey, actual: Pubkey },

    /// In-memory value does not conform to its descriptor.
    #[error("Argument shape error at `{path}`: {message}")]
    ArgumentShapeError { path: String, message: String },

    /// JSON value does not conform to its descriptor.
    #[error("JSON shape error at `{path}`: {message}")]
    JsonShapeError { path: String, message: String },

    #[error("Duplicate {namespace} discriminator for `{name}`: collides with `{existing}`")]
    DuplicateDiscriminator {
        namespace: Namespace,
        name: String,
        existing: String,
    },

    #[error("Unknown type name `{name}`")]
    UnknownTypeName { name: String },

    /// A program description defines the same type name twice.
    #[error("Type `{name}` is defined more than once")]
    DuplicateTypeName { name: String },

    #[error("Type `{name}` contains itself by value")]
    CyclicType { name: String },
}

impl CodecError {
    pub(crate) fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        CodecError::TruncatedInput {
            offset,
            needed,
            available,
        }
    }

    pub(crate) fn mismatch(offset: usize, message: impl Into<String>) -> Self {
        CodecError::LayoutMismatch {
            offset,
            message: message.into(),
        }
    }

    pub(crate) fn shape(path: &str, message: impl Into<String>) -> Self {
        CodecError::ArgumentShapeError {
            path: display_path(path),
            message: message.into(),
        }
    }

    pub(crate) fn json(path: &str, message: impl Into<String>) -> Self {
        CodecError::JsonShapeError {
            path: display_path(path),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::TruncatedInput { .. } => ErrorKind::TruncatedInput,
            CodecError::InvalidTag { .. } => ErrorKind::InvalidTag,
            CodecError::LayoutMismatch { .. } => ErrorKind::LayoutMismatch,
            CodecError::DiscriminatorMismatch { .. } => ErrorKind::DiscriminatorMismatch,
            CodecError::UnknownDiscriminator { .. } => ErrorKind::UnknownDiscriminator,
            CodecError::OwnershipMismatch { .. } => ErrorKind::OwnershipMismatch,
            CodecError::ArgumentShapeError { .. } => ErrorKind::ArgumentShapeError,
            CodecError::JsonShapeError { .. } => ErrorKind::JsonShapeError,
            CodecError::DuplicateDiscriminator { .. } => ErrorKind::DuplicateDiscriminator,
            CodecError::UnknownTypeName { .. } => ErrorKind::UnknownTypeName,
            CodecError::DuplicateTypeName { .. } => ErrorKind::DuplicateTypeName,
            CodecError::CyclicType { .. } => ErrorKind::CyclicType,
        }
    }

    /// Byte offset of a decode failure, if this error came from decoding.
    pub fn offset(&self) -> Option<usize> {
        match self {
            CodecError::TruncatedInput { offset, .. }
            | CodecError::InvalidTag { offset, .. }
            | CodecError::LayoutMismatch { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// Get a numeric error code for client-side handling.
    pub fn error_code(&self) -> u32 {
        match self.kind() {
            ErrorKind::TruncatedInput => 1000,
            ErrorKind::InvalidTag => 1001,
            ErrorKind::LayoutMismatch => 1002,
            ErrorKind::DiscriminatorMismatch => 1003,
            ErrorKind::UnknownDiscriminator => 1004,
            ErrorKind::OwnershipMismatch => 1005,
            ErrorKind::ArgumentShapeError => 1006,
            ErrorKind::JsonShapeError => 1007,
            ErrorKind::DuplicateDiscriminator => 1008,
            ErrorKind::UnknownTypeName => 1009,
            ErrorKind::CyclicType => 1010,
            ErrorKind::DuplicateTypeName => 1011,
        }
    }

    /// Shift the offset of a decode error, used when a payload was decoded
    /// from a sub-slice that started `base` bytes into the original buffer.
    pub(crate) fn rebase(self, base: usize) -> Self {
        match self {
            CodecError::TruncatedInput {
                offset,
                needed,
                available,
            } => CodecError::TruncatedInput {
                offset: offset + base,
                needed,
                available,
            },
            CodecError::InvalidTag { offset, tag, what } => CodecError::InvalidTag {
                offset: offset + base,
                tag,
                what,
            },
            CodecError::LayoutMismatch { offset, message } => CodecError::LayoutMismatch {
                offset: offset + base,
                message,
            },
            other => other,
        }
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.to_string()
    }
}
