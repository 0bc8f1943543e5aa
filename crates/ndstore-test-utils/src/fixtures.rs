//! Standard store scenarios.

use ndstore_core::ObjectDescriptor;

use crate::{f64_descriptor, fill_f64};

/// A put request: descriptor plus payload.
#[derive(Clone, Debug)]
pub struct Piece {
    pub descriptor: ObjectDescriptor,
    pub payload: Vec<u8>,
}

impl Piece {
    pub fn constant(name: &str, version: u32, lb: &[u64], ub: &[u64], value: f64) -> Self {
        let descriptor = f64_descriptor(name, version, lb, ub);
        let payload = fill_f64(&descriptor.bbox, value);
        Self {
            descriptor,
            payload,
        }
    }
}

/// Two halves of a 4x4 `f64` array named `temp` at version 1.
///
/// Rows 0-1 (axis 1) hold 1.0, rows 2-3 hold 2.0. Getting the whole
/// array returns 16 doubles, the first 8 equal to 1.0.
pub struct TempScenario {
    pub pieces: [Piece; 2],
    pub query: ObjectDescriptor,
}

impl TempScenario {
    pub fn new() -> Self {
        Self {
            pieces: [
                Piece::constant("temp", 1, &[0, 0], &[3, 1], 1.0),
                Piece::constant("temp", 1, &[0, 2], &[3, 3], 2.0),
            ],
            query: f64_descriptor("temp", 1, &[0, 0], &[3, 3]),
        }
    }

    /// The values a full get must return.
    pub fn expected(&self) -> Vec<f64> {
        let mut out = vec![1.0; 8];
        out.extend([2.0; 8]);
        out
    }
}

impl Default for TempScenario {
    fn default() -> Self {
        Self::new()
    }
}
