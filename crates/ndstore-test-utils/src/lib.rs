//! Test utilities for ndstore development.
//!
//! Geometry helpers for building descriptors and payloads in tests:
//! block decomposition of a global domain across a process grid,
//! buffer fill and decode helpers keyed on global coordinates, and the
//! standard scenarios in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use ndstore_core::{BoundingBox, ObjectDescriptor, Version};

/// Element size used by every helper: one `f64`.
pub const F64_SIZE: usize = std::mem::size_of::<f64>();

/// Build an `f64` descriptor. Panics on invalid geometry.
pub fn f64_descriptor(name: &str, version: u32, lb: &[u64], ub: &[u64]) -> ObjectDescriptor {
    let bbox = BoundingBox::new(lb, ub).expect("valid test box");
    ObjectDescriptor::new(name, Version(version), F64_SIZE, bbox).expect("valid test descriptor")
}

/// The box owned by `rank` when `global` is split evenly over `grid`.
///
/// Ranks are laid out axis 0 fastest: along axis `i` the rank's block
/// index is `(rank / prod(grid[..i])) % grid[i]`.
///
/// # Panics
///
/// Panics if an extent is not divisible by its grid size or if `rank` is
/// outside the grid.
pub fn block_bounds(global: &[u64], grid: &[u64], rank: u64) -> BoundingBox {
    assert_eq!(global.len(), grid.len(), "grid rank mismatch");
    assert!(rank < grid.iter().product::<u64>(), "rank {rank} outside grid");
    let mut lb = Vec::with_capacity(global.len());
    let mut ub = Vec::with_capacity(global.len());
    let mut stride = 1;
    for (&extent, &procs) in global.iter().zip(grid) {
        assert_eq!(extent % procs, 0, "{extent} not divisible by {procs}");
        let block = extent / procs;
        let off = (rank / stride) % procs * block;
        lb.push(off);
        ub.push(off + block - 1);
        stride *= procs;
    }
    BoundingBox::new(&lb, &ub).expect("valid block")
}

/// Every block of the decomposition, in rank order.
pub fn decompose(global: &[u64], grid: &[u64]) -> Vec<BoundingBox> {
    (0..grid.iter().product::<u64>())
        .map(|rank| block_bounds(global, grid, rank))
        .collect()
}

/// Every integer point of `bbox` in buffer order (axis 0 fastest).
pub fn points(bbox: &BoundingBox) -> Vec<Vec<u64>> {
    let mut out = Vec::with_capacity(bbox.volume() as usize);
    let mut p = bbox.lb().to_vec();
    loop {
        out.push(p.clone());
        let mut axis = 0;
        loop {
            if axis == p.len() {
                return out;
            }
            if p[axis] < bbox.ub()[axis] {
                p[axis] += 1;
                break;
            }
            p[axis] = bbox.lb()[axis];
            axis += 1;
        }
    }
}

/// A distinct value for every point of a domain: its row-linear index
/// within `domain`, axis 0 fastest.
pub fn global_index(domain: &BoundingBox, point: &[u64]) -> f64 {
    let mut idx = 0u64;
    for axis in (0..domain.num_dims()).rev() {
        idx = idx * domain.distance(axis) + (point[axis] - domain.lb()[axis]);
    }
    idx as f64
}

/// Payload for `bbox` with every element set to `value`.
pub fn fill_f64(bbox: &BoundingBox, value: f64) -> Vec<u8> {
    fill_with(bbox, |_| value)
}

/// Payload for `bbox` with each element computed from its global point.
pub fn fill_with(bbox: &BoundingBox, f: impl Fn(&[u64]) -> f64) -> Vec<u8> {
    points(bbox)
        .iter()
        .flat_map(|p| f(p.as_slice()).to_ne_bytes())
        .collect()
}

/// Decode a payload of native-endian `f64`s.
pub fn decode_f64(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(F64_SIZE)
        .map(|b| f64::from_ne_bytes(b.try_into().expect("8-byte chunk")))
        .collect()
}
