//! Arena-specific error types.

use std::error::Error;
use std::fmt;

use ndstore_core::DescriptorError;

/// Errors that can occur while allocating, indexing or copying chunks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// The allocator refused a chunk buffer.
    AllocationFailed {
        /// Number of bytes requested.
        requested: usize,
    },
    /// A copy between chunks of different element sizes.
    ElementSizeMismatch {
        /// Element size of the destination, in bytes.
        dst: usize,
        /// Element size of the source, in bytes.
        src: usize,
    },
    /// A copy between boxes of different dimension counts.
    DimensionMismatch {
        /// Dimensions of the destination box.
        dst: usize,
        /// Dimensions of the source box.
        src: usize,
    },
    /// A buffer is shorter than its box requires.
    BufferTooSmall {
        /// Bytes the box requires.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
    /// Chunk contents of the wrong length for the descriptor.
    LengthMismatch {
        /// Bytes the descriptor requires.
        expected: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
    /// The chunk's descriptor failed validation.
    Descriptor(DescriptorError),
    /// An [`IndexConfig`](crate::IndexConfig) that cannot build an index.
    InvalidConfig {
        /// Why the configuration was rejected.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailed { requested } => {
                write!(f, "chunk allocation failed: requested {requested} bytes")
            }
            Self::ElementSizeMismatch { dst, src } => {
                write!(
                    f,
                    "element size mismatch: destination {dst} bytes, source {src} bytes"
                )
            }
            Self::DimensionMismatch { dst, src } => {
                write!(
                    f,
                    "dimension mismatch: destination has {dst} axes, source has {src}"
                )
            }
            Self::BufferTooSmall { expected, actual } => {
                write!(f, "buffer too small: need {expected} bytes, got {actual}")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "chunk needs {expected} bytes, got {actual}")
            }
            Self::Descriptor(e) => write!(f, "invalid descriptor: {e}"),
            Self::InvalidConfig { reason } => write!(f, "invalid index config: {reason}"),
        }
    }
}

impl Error for ArenaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Descriptor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DescriptorError> for ArenaError {
    fn from(e: DescriptorError) -> Self {
        Self::Descriptor(e)
    }
}
