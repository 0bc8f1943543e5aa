//! Validation errors for geometry and object descriptors.

use std::error::Error;
use std::fmt;

/// Errors raised while constructing a [`BoundingBox`](crate::BoundingBox).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GeometryError {
    /// `num_dims` is outside `1..=BBOX_MAX_NDIM`.
    DimensionsOutOfRange {
        /// The rejected dimension count.
        num_dims: usize,
    },
    /// Lower and upper corners have a different number of coordinates.
    CornerLengthMismatch {
        /// Coordinates supplied for the lower corner.
        lb_len: usize,
        /// Coordinates supplied for the upper corner.
        ub_len: usize,
    },
    /// `lb > ub` along one axis.
    InvertedAxis {
        /// The offending axis.
        axis: usize,
        /// Lower bound on that axis.
        lb: u64,
        /// Upper bound on that axis.
        ub: u64,
    },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DimensionsOutOfRange { num_dims } => {
                write!(
                    f,
                    "num_dims {num_dims} outside 1..={}",
                    crate::BBOX_MAX_NDIM
                )
            }
            Self::CornerLengthMismatch { lb_len, ub_len } => {
                write!(f, "lower corner has {lb_len} coordinates, upper has {ub_len}")
            }
            Self::InvertedAxis { axis, lb, ub } => {
                write!(f, "axis {axis}: lower bound {lb} exceeds upper bound {ub}")
            }
        }
    }
}

impl Error for GeometryError {}

/// Errors raised while constructing an
/// [`ObjectDescriptor`](crate::ObjectDescriptor).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DescriptorError {
    /// Object name exceeds [`MAX_NAME_LEN`](crate::MAX_NAME_LEN) bytes.
    NameTooLong {
        /// Length of the rejected name in bytes.
        len: usize,
    },
    /// Element size is zero.
    ZeroElementSize,
    /// `element_size * volume` does not fit in the address space.
    SizeOverflow {
        /// Element size in bytes.
        element_size: usize,
        /// Box volume in elements (saturated).
        volume: u64,
    },
    /// The bounding box is malformed.
    Geometry(GeometryError),
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameTooLong { len } => {
                write!(
                    f,
                    "object name is {len} bytes, limit is {}",
                    crate::MAX_NAME_LEN
                )
            }
            Self::ZeroElementSize => write!(f, "element size must be non-zero"),
            Self::SizeOverflow {
                element_size,
                volume,
            } => {
                write!(
                    f,
                    "object size overflows: {volume} elements of {element_size} bytes"
                )
            }
            Self::Geometry(e) => write!(f, "geometry: {e}"),
        }
    }
}

impl Error for DescriptorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Geometry(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GeometryError> for DescriptorError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}
