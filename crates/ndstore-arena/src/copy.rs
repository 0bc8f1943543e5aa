//! Strided copy of the overlap between two boxes.
//!
//! Each side of a copy is a flat buffer laid over its own box, axis 0
//! fastest. The overlap of the two boxes is located in each buffer through
//! a per-side stride table built from that side's extents; the copy then
//! walks every position of axes `1..num_dims` with an odometer and moves
//! the axis-0 run of the overlap as one contiguous block.
//!
//! ```text
//!   dst box (4 x 4)          src box (4 x 2) at rows 2..=3
//!   . . . .                  s s s s
//!   . . . .                  s s s s
//!   s s s s   <- run 0
//!   s s s s   <- run 1
//! ```

use smallvec::SmallVec;

use ndstore_core::{BoundingBox, BBOX_MAX_NDIM};

use crate::chunk::Chunk;
use crate::error::ArenaError;

type Strides = SmallVec<[usize; BBOX_MAX_NDIM]>;

/// Copy the overlap of `src` into `dst`. Returns the number of elements moved.
///
/// Disjoint chunks move nothing. Chunks of different element sizes or
/// dimension counts are rejected before any byte is written.
pub fn copy(dst: &mut Chunk, src: &Chunk) -> Result<u64, ArenaError> {
    let dst_elem = dst.descriptor().element_size;
    let src_elem = src.descriptor().element_size;
    if dst_elem != src_elem {
        return Err(ArenaError::ElementSizeMismatch {
            dst: dst_elem,
            src: src_elem,
        });
    }
    let dst_box = dst.descriptor().bbox;
    copy_region(
        dst.data_mut(),
        &dst_box,
        src.data(),
        &src.descriptor().bbox,
        src_elem,
    )
}

/// Copy the overlap of two plain buffers, each laid over its own box.
///
/// Both buffers must hold at least `element_size * volume` bytes of their
/// box. Returns the number of elements moved.
pub fn copy_region(
    dst: &mut [u8],
    dst_box: &BoundingBox,
    src: &[u8],
    src_box: &BoundingBox,
    element_size: usize,
) -> Result<u64, ArenaError> {
    let ndim = dst_box.num_dims();
    if ndim != src_box.num_dims() {
        return Err(ArenaError::DimensionMismatch {
            dst: ndim,
            src: src_box.num_dims(),
        });
    }
    check_len(dst.len(), dst_box, element_size)?;
    check_len(src.len(), src_box, element_size)?;

    let Some(overlap) = dst_box.intersection(src_box) else {
        return Ok(0);
    };

    // Every quantity below is bounded by a box volume that was just shown to
    // fit in a buffer, so the usize conversions cannot truncate.
    let dst_strides = strides(dst_box, element_size);
    let src_strides = strides(src_box, element_size);
    let dst_origin = overlap.relative_to(dst_box);
    let src_origin = overlap.relative_to(src_box);
    let extents = overlap.extents();
    let run = extents[0] as usize * element_size;

    let mut pos: SmallVec<[u64; BBOX_MAX_NDIM]> = SmallVec::from_elem(0, ndim);
    loop {
        let d = offset(dst_origin.lb(), &pos, &dst_strides);
        let s = offset(src_origin.lb(), &pos, &src_strides);
        dst[d..d + run].copy_from_slice(&src[s..s + run]);

        // Advance the odometer over axes 1.. with carry.
        let mut axis = 1;
        loop {
            if axis == ndim {
                return Ok(overlap.volume());
            }
            pos[axis] += 1;
            if pos[axis] < extents[axis] {
                break;
            }
            pos[axis] = 0;
            axis += 1;
        }
    }
}

fn check_len(actual: usize, bbox: &BoundingBox, element_size: usize) -> Result<(), ArenaError> {
    let expected = bbox
        .checked_volume()
        .and_then(|v| usize::try_from(v).ok())
        .and_then(|v| v.checked_mul(element_size))
        .unwrap_or(usize::MAX);
    if actual < expected {
        return Err(ArenaError::BufferTooSmall { expected, actual });
    }
    Ok(())
}

/// Byte stride of each axis for a buffer laid over `bbox`.
fn strides(bbox: &BoundingBox, element_size: usize) -> Strides {
    let mut out = Strides::with_capacity(bbox.num_dims());
    let mut stride = element_size;
    for axis in 0..bbox.num_dims() {
        out.push(stride);
        stride = stride.saturating_mul(bbox.distance(axis) as usize);
    }
    out
}

fn offset(origin: &[u64], pos: &[u64], strides: &[usize]) -> usize {
    origin
        .iter()
        .zip(pos)
        .zip(strides)
        .map(|((&o, &p), &s)| (o + p) as usize * s)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndstore_core::{ObjectDescriptor, Version};

    fn bb(lb: &[u64], ub: &[u64]) -> BoundingBox {
        BoundingBox::new(lb, ub).unwrap()
    }

    fn f64_chunk(lb: &[u64], ub: &[u64], value: f64) -> Chunk {
        let d = ObjectDescriptor::new("temp", Version(1), 8, bb(lb, ub)).unwrap();
        let n = d.volume() as usize;
        let bytes: Vec<u8> = std::iter::repeat(value.to_ne_bytes())
            .take(n)
            .flatten()
            .collect();
        Chunk::from_vec(d, bytes).unwrap()
    }

    fn as_f64(bytes: &[u8]) -> Vec<f64> {
        bytes
            .chunks_exact(8)
            .map(|b| f64::from_ne_bytes(b.try_into().unwrap()))
            .collect()
    }

    #[test]
    fn two_chunks_tile_a_query() {
        let mut out = f64_chunk(&[0, 0], &[3, 3], 0.0);
        let a = f64_chunk(&[0, 0], &[3, 1], 1.0);
        let b = f64_chunk(&[0, 2], &[3, 3], 2.0);
        assert_eq!(copy(&mut out, &a).unwrap(), 8);
        assert_eq!(copy(&mut out, &b).unwrap(), 8);
        let vals = as_f64(out.data());
        assert!(vals[..8].iter().all(|&v| v == 1.0));
        assert!(vals[8..].iter().all(|&v| v == 2.0));
    }

    #[test]
    fn partial_overlap_copies_only_intersection() {
        let mut out = f64_chunk(&[2, 2], &[5, 5], 0.0);
        let src = f64_chunk(&[0, 0], &[3, 3], 7.0);
        assert_eq!(copy(&mut out, &src).unwrap(), 4);
        let vals = as_f64(out.data());
        for y in 0..4 {
            for x in 0..4 {
                let expect = if x < 2 && y < 2 { 7.0 } else { 0.0 };
                assert_eq!(vals[y * 4 + x], expect, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn disjoint_boxes_copy_nothing() {
        let mut out = f64_chunk(&[0], &[3], 0.0);
        let src = f64_chunk(&[4], &[7], 1.0);
        assert_eq!(copy(&mut out, &src).unwrap(), 0);
        assert!(as_f64(out.data()).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn element_size_mismatch_rejected() {
        let mut out = f64_chunk(&[0], &[3], 0.0);
        let d = ObjectDescriptor::new("temp", Version(1), 4, bb(&[0], &[3])).unwrap();
        let src = Chunk::alloc(d).unwrap();
        assert_eq!(
            copy(&mut out, &src),
            Err(ArenaError::ElementSizeMismatch { dst: 8, src: 4 })
        );
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let mut out = f64_chunk(&[0], &[3], 0.0);
        let src = f64_chunk(&[0, 0], &[3, 0], 1.0);
        assert_eq!(
            copy(&mut out, &src),
            Err(ArenaError::DimensionMismatch { dst: 1, src: 2 })
        );
    }

    #[test]
    fn short_buffer_rejected() {
        let mut dst = vec![0u8; 31];
        let src = vec![0u8; 32];
        let b = bb(&[0], &[3]);
        assert_eq!(
            copy_region(&mut dst, &b, &src, &b, 8),
            Err(ArenaError::BufferTooSmall {
                expected: 32,
                actual: 31
            })
        );
    }

    #[test]
    fn one_dimensional_copy_is_single_run() {
        let mut dst = vec![0u8; 10];
        let src: Vec<u8> = (0..6).collect();
        let moved = copy_region(&mut dst, &bb(&[10], &[19]), &src, &bb(&[14], &[19]), 1).unwrap();
        assert_eq!(moved, 6);
        assert_eq!(dst, [0, 0, 0, 0, 0, 1, 2, 3, 4, 5]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_box(num_dims: usize) -> impl Strategy<Value = BoundingBox> {
            prop::collection::vec((0u64..6, 0u64..4), num_dims).prop_map(|axes| {
                let lb: Vec<u64> = axes.iter().map(|&(lo, _)| lo).collect();
                let ub: Vec<u64> = axes.iter().map(|&(lo, len)| lo + len).collect();
                BoundingBox::new(&lb, &ub).unwrap()
            })
        }

        /// Byte at a global point: a hash of its coordinates.
        fn tag(point: &[u64]) -> u8 {
            point
                .iter()
                .fold(17u64, |h, &c| h.wrapping_mul(31).wrapping_add(c)) as u8
        }

        fn points(b: &BoundingBox) -> Vec<Vec<u64>> {
            let mut out = vec![Vec::new()];
            for axis in (0..b.num_dims()).rev() {
                out = out
                    .into_iter()
                    .flat_map(|tail| {
                        (b.lb()[axis]..=b.ub()[axis]).map(move |c| {
                            let mut p = vec![c];
                            p.extend(&tail);
                            p
                        })
                    })
                    .collect();
            }
            out
        }

        /// Flat index of `point` in a buffer over `b`, axis 0 fastest.
        fn flat(b: &BoundingBox, point: &[u64]) -> usize {
            let mut idx = 0;
            for axis in (0..b.num_dims()).rev() {
                idx = idx * b.distance(axis) as usize + (point[axis] - b.lb()[axis]) as usize;
            }
            idx
        }

        fn fill(b: &BoundingBox) -> Vec<u8> {
            let mut buf = vec![0u8; b.volume() as usize];
            for p in points(b) {
                buf[flat(b, &p)] = tag(&p);
            }
            buf
        }

        proptest! {
            #[test]
            fn copy_matches_pointwise_reference(
                (dst_box, src_box) in (1usize..=4).prop_flat_map(|n| (arb_box(n), arb_box(n)))
            ) {
                let src = fill(&src_box);
                let mut dst = vec![0xAAu8; dst_box.volume() as usize];
                let moved = copy_region(&mut dst, &dst_box, &src, &src_box, 1).unwrap();

                let expected_moved = dst_box.intersection(&src_box).map_or(0, |o| o.volume());
                prop_assert_eq!(moved, expected_moved);
                for p in points(&dst_box) {
                    let inside = (0..p.len())
                        .all(|a| src_box.lb()[a] <= p[a] && p[a] <= src_box.ub()[a]);
                    let want = if inside { tag(&p) } else { 0xAA };
                    prop_assert_eq!(dst[flat(&dst_box, &p)], want);
                }
            }
        }
    }
}
