//! Strongly-typed identifiers for stored objects.

use std::fmt;

/// Version of a named array.
///
/// Producers publish successive versions (typically one per timestep).
/// The object index hashes chunks into buckets by `version mod size_hash`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version(pub u32);

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Version {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Logical id of the producer that wrote a chunk.
///
/// `-1` ([`OwnerId::UNSET`]) when the producer did not identify itself,
/// which is the case for every chunk arriving through the command surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(pub i32);

impl OwnerId {
    /// Sentinel for "no owner recorded".
    pub const UNSET: OwnerId = OwnerId(-1);

    /// Whether a real producer id was recorded.
    pub fn is_set(&self) -> bool {
        self.0 >= 0
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::UNSET
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for OwnerId {
    fn from(v: i32) -> Self {
        Self(v)
    }
}
