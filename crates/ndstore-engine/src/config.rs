//! Storage service configuration and validation.

use std::error::Error;
use std::fmt;

use ndstore_arena::{ArenaError, IndexConfig};

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected during [`StoreConfig::validate()`].
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// Index configuration is invalid.
    Index(ArenaError),
    /// `max_chunk_bytes` is zero, which would reject every put.
    ZeroChunkLimit,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(e) => write!(f, "index: {e}"),
            Self::ZeroChunkLimit => write!(f, "max_chunk_bytes must be at least 1"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Index(e) => Some(e),
            Self::ZeroChunkLimit => None,
        }
    }
}

impl From<ArenaError> for ConfigError {
    fn from(e: ArenaError) -> Self {
        Self::Index(e)
    }
}

// ── StoreConfig ────────────────────────────────────────────────────

/// Configuration for a [`StorageService`](crate::StorageService).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreConfig {
    /// Object index bucket count and supersede scope.
    pub index: IndexConfig,
    /// Largest chunk a single put may store, in bytes. `None` = unlimited.
    ///
    /// Puts above the limit fail with
    /// [`StoreError::AllocationFailure`](crate::StoreError::AllocationFailure).
    pub max_chunk_bytes: Option<usize>,
}

impl StoreConfig {
    /// Default chunk size limit: none.
    pub const DEFAULT_MAX_CHUNK_BYTES: Option<usize> = None;

    /// Config with the given index settings and no chunk size limit.
    pub fn new(index: IndexConfig) -> Self {
        Self {
            index,
            max_chunk_bytes: Self::DEFAULT_MAX_CHUNK_BYTES,
        }
    }

    /// Cap the size of a single stored chunk.
    pub fn with_max_chunk_bytes(mut self, limit: usize) -> Self {
        self.max_chunk_bytes = Some(limit);
        self
    }

    /// Check all structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.index.validate()?;
        if self.max_chunk_bytes == Some(0) {
            return Err(ConfigError::ZeroChunkLimit);
        }
        Ok(())
    }
}
