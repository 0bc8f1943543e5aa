//! Object index configuration.

use crate::error::ArenaError;

/// Which buckets a put searches for chunks to supersede.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SupersedeScope {
    /// Only the bucket the new chunk lands in (`version mod size_hash`).
    ///
    /// Versions that share a bucket replace each other's overlapping
    /// regions, which bounds residency to roughly `size_hash` live
    /// versions per name. Versions in other buckets are untouched.
    #[default]
    VersionBucket,
    /// Every bucket. A put replaces all overlapping chunks of the same
    /// name regardless of version, keeping only the latest one resident.
    AllBuckets,
}

/// Configuration for an [`ObjectIndex`](crate::ObjectIndex).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexConfig {
    /// Number of hash buckets. Chunks land in bucket `version mod size_hash`.
    ///
    /// Default: 10. Must be at least 1.
    pub size_hash: usize,

    /// Where a put looks for overlapping chunks to replace.
    ///
    /// Default: [`SupersedeScope::VersionBucket`].
    pub supersede_scope: SupersedeScope,
}

impl IndexConfig {
    /// Default bucket count.
    pub const DEFAULT_SIZE_HASH: usize = 10;

    /// Create a config with `size_hash` buckets and the default scope.
    pub fn new(size_hash: usize) -> Self {
        Self {
            size_hash,
            supersede_scope: SupersedeScope::default(),
        }
    }

    /// Replace the supersede scope.
    pub fn with_scope(mut self, scope: SupersedeScope) -> Self {
        self.supersede_scope = scope;
        self
    }

    /// Check that the configuration can build an index.
    pub fn validate(&self) -> Result<(), ArenaError> {
        if self.size_hash == 0 {
            return Err(ArenaError::InvalidConfig {
                reason: "size_hash must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Bucket a version hashes to.
    pub fn bucket_of(&self, version: ndstore_core::Version) -> usize {
        (version.0 as usize) % self.size_hash
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE_HASH)
    }
}
