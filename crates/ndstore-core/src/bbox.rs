//! Inclusive axis-aligned bounding boxes in up to [`BBOX_MAX_NDIM`] dimensions.
//!
//! A [`BoundingBox`] is inclusive on both ends: the extent along axis `i`
//! is `ub[i] - lb[i] + 1`, so a well-formed box always has volume ≥ 1.
//! Coordinates past `num_dims` are held at zero and ignored by every
//! operation.
//!
//! Binary operations assume both boxes carry the same `num_dims`. This is
//! checked in debug builds only; callers (the index and the copy engine)
//! compare dimension counts before reaching this module.

use std::fmt;
use std::ops::Index;

use smallvec::SmallVec;

use crate::error::GeometryError;

/// Maximum number of dimensions a box (and therefore a stored chunk) may have.
pub const BBOX_MAX_NDIM: usize = 10;

/// Per-axis extents of a box, one entry per active dimension.
pub type Extents = SmallVec<[u64; BBOX_MAX_NDIM]>;

/// A fixed-capacity point in up to [`BBOX_MAX_NDIM`] dimensions.
///
/// Axis 0 is the fastest-varying axis of any buffer laid out over a box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Coord(pub [u64; BBOX_MAX_NDIM]);

impl Coord {
    /// Build a coordinate from up to [`BBOX_MAX_NDIM`] values; unused axes are zero.
    ///
    /// Returns `None` if more than [`BBOX_MAX_NDIM`] values are supplied.
    pub fn from_slice(values: &[u64]) -> Option<Self> {
        if values.len() > BBOX_MAX_NDIM {
            return None;
        }
        let mut c = [0u64; BBOX_MAX_NDIM];
        c[..values.len()].copy_from_slice(values);
        Some(Self(c))
    }

    /// The first `num_dims` components.
    pub fn as_slice(&self, num_dims: usize) -> &[u64] {
        &self.0[..num_dims.min(BBOX_MAX_NDIM)]
    }
}

impl Index<usize> for Coord {
    type Output = u64;

    fn index(&self, axis: usize) -> &u64 {
        &self.0[axis]
    }
}

/// Inclusive axis-aligned integer rectangle.
#[derive(Clone, Copy, Debug)]
pub struct BoundingBox {
    num_dims: usize,
    lb: Coord,
    ub: Coord,
}

impl BoundingBox {
    /// Build a box from its lower and upper corners.
    ///
    /// The number of dimensions is the corner length. Rejects empty or
    /// over-long corners, corners of different lengths, and any axis with
    /// `lb > ub`.
    pub fn new(lb: &[u64], ub: &[u64]) -> Result<Self, GeometryError> {
        if lb.len() != ub.len() {
            return Err(GeometryError::CornerLengthMismatch {
                lb_len: lb.len(),
                ub_len: ub.len(),
            });
        }
        let num_dims = lb.len();
        let lb_c = Coord::from_slice(lb).ok_or(GeometryError::DimensionsOutOfRange { num_dims })?;
        let ub_c = Coord::from_slice(ub).ok_or(GeometryError::DimensionsOutOfRange { num_dims })?;
        Self::from_corners(num_dims, lb_c, ub_c)
    }

    /// Build a box from full-width corners, using only the first `num_dims` axes.
    ///
    /// Axes past `num_dims` are zeroed, so two boxes that agree on their
    /// active axes compare equal regardless of what the caller left in
    /// the tail.
    pub fn from_corners(num_dims: usize, lb: Coord, ub: Coord) -> Result<Self, GeometryError> {
        if num_dims == 0 || num_dims > BBOX_MAX_NDIM {
            return Err(GeometryError::DimensionsOutOfRange { num_dims });
        }
        let mut bb = Self {
            num_dims,
            lb: Coord::default(),
            ub: Coord::default(),
        };
        for axis in 0..num_dims {
            if lb[axis] > ub[axis] {
                return Err(GeometryError::InvertedAxis {
                    axis,
                    lb: lb[axis],
                    ub: ub[axis],
                });
            }
            bb.lb.0[axis] = lb[axis];
            bb.ub.0[axis] = ub[axis];
        }
        Ok(bb)
    }

    /// A single-point box (`lb == ub` on every axis).
    pub fn point(coord: &[u64]) -> Result<Self, GeometryError> {
        Self::new(coord, coord)
    }

    /// Number of active dimensions.
    pub fn num_dims(&self) -> usize {
        self.num_dims
    }

    /// Lower corner, active axes only.
    pub fn lb(&self) -> &[u64] {
        self.lb.as_slice(self.num_dims)
    }

    /// Upper corner, active axes only.
    pub fn ub(&self) -> &[u64] {
        self.ub.as_slice(self.num_dims)
    }

    /// Full-width lower corner.
    pub fn lower(&self) -> &Coord {
        &self.lb
    }

    /// Full-width upper corner.
    pub fn upper(&self) -> &Coord {
        &self.ub
    }

    /// Extent along one axis: `ub[axis] - lb[axis] + 1`.
    ///
    /// A box spanning the entire `u64` range saturates at `u64::MAX`.
    pub fn distance(&self, axis: usize) -> u64 {
        (self.ub[axis] - self.lb[axis]).saturating_add(1)
    }

    /// Extent along every active axis.
    pub fn extents(&self) -> Extents {
        (0..self.num_dims).map(|axis| self.distance(axis)).collect()
    }

    /// Number of integer points in the box, or `None` if the product overflows `u64`.
    pub fn checked_volume(&self) -> Option<u64> {
        (0..self.num_dims).try_fold(1u64, |acc, axis| {
            let points = (self.ub[axis] - self.lb[axis]).checked_add(1)?;
            acc.checked_mul(points)
        })
    }

    /// Number of integer points in the box, saturating at `u64::MAX`.
    ///
    /// Use [`checked_volume`](Self::checked_volume) wherever the result
    /// sizes an allocation.
    pub fn volume(&self) -> u64 {
        self.checked_volume().unwrap_or(u64::MAX)
    }

    /// Whether the two boxes share at least one point.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        debug_assert_eq!(self.num_dims, other.num_dims, "dimension mismatch");
        (0..self.num_dims).all(|axis| self.overlaps_on(other, axis))
    }

    fn overlaps_on(&self, other: &BoundingBox, axis: usize) -> bool {
        let (a_lb, a_ub) = (self.lb[axis], self.ub[axis]);
        let (b_lb, b_ub) = (other.lb[axis], other.ub[axis]);
        (a_lb <= b_lb && b_lb <= a_ub) || (b_lb <= a_lb && a_lb <= b_ub)
    }

    /// The per-axis overlap of two boxes.
    ///
    /// Precondition: `self.intersects(other)`. On disjoint boxes the result
    /// has `lb > ub` on some axis and must not be used to drive a copy; use
    /// [`intersection`](Self::intersection) when disjointness is possible.
    pub fn intersect(&self, other: &BoundingBox) -> BoundingBox {
        debug_assert_eq!(self.num_dims, other.num_dims, "dimension mismatch");
        let mut out = BoundingBox {
            num_dims: self.num_dims,
            lb: Coord::default(),
            ub: Coord::default(),
        };
        for axis in 0..self.num_dims {
            out.lb.0[axis] = self.lb[axis].max(other.lb[axis]);
            out.ub.0[axis] = self.ub[axis].min(other.ub[axis]);
        }
        out
    }

    /// The overlap of two boxes, or `None` if they are disjoint.
    pub fn intersection(&self, other: &BoundingBox) -> Option<BoundingBox> {
        self.intersects(other).then(|| self.intersect(other))
    }

    /// Same dimension count and identical corners on every active axis.
    pub fn equals(&self, other: &BoundingBox) -> bool {
        self.num_dims == other.num_dims && self.lb() == other.lb() && self.ub() == other.ub()
    }

    /// Whether `inner` lies entirely within `self`.
    pub fn contains(&self, inner: &BoundingBox) -> bool {
        self.num_dims == inner.num_dims
            && (0..self.num_dims)
                .all(|axis| self.lb[axis] <= inner.lb[axis] && inner.ub[axis] <= self.ub[axis])
    }

    /// This box expressed in the local frame of `origin` (`lb - origin.lb`).
    ///
    /// Precondition: `origin.contains(self)`.
    pub fn relative_to(&self, origin: &BoundingBox) -> BoundingBox {
        debug_assert!(origin.contains(self), "{self} not inside {origin}");
        let mut out = *self;
        for axis in 0..self.num_dims {
            out.lb.0[axis] = self.lb[axis] - origin.lb[axis];
            out.ub.0[axis] = self.ub[axis] - origin.lb[axis];
        }
        out
    }
}

impl PartialEq for BoundingBox {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl Eq for BoundingBox {}

fn write_coord(f: &mut fmt::Formatter<'_>, c: &[u64]) -> fmt::Result {
    write!(f, "{{")?;
    for (i, v) in c.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{v}")?;
    }
    write!(f, "}}")
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{lb = ")?;
        write_coord(f, self.lb())?;
        write!(f, ", ub = ")?;
        write_coord(f, self.ub())?;
        write!(f, "}}")
    }
}
