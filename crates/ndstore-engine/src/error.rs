//! Errors returned by the storage service.

use std::error::Error;
use std::fmt;

use ndstore_arena::ArenaError;
use ndstore_core::{DescriptorError, Version};

/// Errors returned by [`StorageService`](crate::StorageService) operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreError {
    /// A chunk or output buffer could not be allocated, or exceeds the
    /// configured chunk size limit.
    AllocationFailure {
        /// Number of bytes requested.
        requested: usize,
    },
    /// A request argument is out of range or inconsistent with stored data.
    InvalidArgument {
        /// What was wrong with the request.
        reason: String,
    },
    /// The descriptor failed validation.
    InvalidDescriptor(DescriptorError),
    /// A payload or caller buffer does not match the descriptor's size.
    SizeMismatch {
        /// Bytes the descriptor requires.
        expected: usize,
        /// Bytes supplied.
        actual: usize,
    },
    /// No stored chunk of this name and version overlaps the query.
    ObjectNotFound {
        /// Queried name.
        name: String,
        /// Queried version.
        version: Version,
    },
    /// Stored chunks overlap the query but leave part of it uncovered.
    PartialCoverage {
        /// Elements found.
        covered: u64,
        /// Elements in the query box.
        expected: u64,
    },
}

impl StoreError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocationFailure { requested } => {
                write!(f, "allocation of {requested} bytes failed")
            }
            Self::InvalidArgument { reason } => write!(f, "invalid argument: {reason}"),
            Self::InvalidDescriptor(e) => write!(f, "invalid descriptor: {e}"),
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected} bytes, got {actual}")
            }
            Self::ObjectNotFound { name, version } => {
                write!(f, "no stored data for {name} version {version}")
            }
            Self::PartialCoverage { covered, expected } => {
                write!(
                    f,
                    "stored data covers {covered} of {expected} requested elements"
                )
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDescriptor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DescriptorError> for StoreError {
    fn from(e: DescriptorError) -> Self {
        Self::InvalidDescriptor(e)
    }
}

impl From<ArenaError> for StoreError {
    fn from(e: ArenaError) -> Self {
        match e {
            ArenaError::AllocationFailed { requested } => Self::AllocationFailure { requested },
            ArenaError::BufferTooSmall { expected, actual }
            | ArenaError::LengthMismatch { expected, actual } => {
                Self::SizeMismatch { expected, actual }
            }
            ArenaError::Descriptor(d) => Self::InvalidDescriptor(d),
            e @ (ArenaError::ElementSizeMismatch { .. }
            | ArenaError::DimensionMismatch { .. }
            | ArenaError::InvalidConfig { .. }) => Self::invalid(e.to_string()),
        }
    }
}
