//! Stored chunks and counted read leases.
//!
//! A [`Chunk`] owns one descriptor and the bytes of the region it covers,
//! laid out with axis 0 fastest and offset 0 at `bbox.lb`. Chunks are
//! shared as `Arc<Chunk>` between the index and in-flight readers; the
//! buffer is never written once the chunk is shared.
//!
//! The reference count tracked here is the number of outstanding
//! [`ChunkGuard`]s, not the `Arc` strong count. The index uses it to decide
//! whether a superseded chunk can be dropped at once or has to wait for
//! its readers.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

use ndstore_core::ObjectDescriptor;

use crate::error::ArenaError;

static CHUNK_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a chunk.
///
/// Two chunks with identical descriptors still have different ids, which
/// is what the index uses to tell a chunk from its replacement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(u64);

impl ChunkId {
    /// Allocate a fresh id. Thread-safe.
    pub fn next() -> Self {
        Self(CHUNK_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of an indexed chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChunkState {
    /// Visible to lookups.
    Live,
    /// Superseded while leased; freed once the last lease is released.
    PendingFree,
}

/// Allocate a zeroed byte buffer, reporting allocator refusal as an error.
pub fn try_alloc_zeroed(len: usize) -> Result<Vec<u8>, ArenaError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| ArenaError::AllocationFailed { requested: len })?;
    buf.resize(len, 0);
    Ok(buf)
}

/// One stored region of an array.
pub struct Chunk {
    id: ChunkId,
    descriptor: ObjectDescriptor,
    data: Box<[u8]>,
    refcnt: AtomicU32,
    pending_free: AtomicBool,
}

impl Chunk {
    /// Allocate a zero-filled chunk sized for `descriptor`.
    pub fn alloc(descriptor: ObjectDescriptor) -> Result<Self, ArenaError> {
        let len = descriptor.data_size()?;
        let data = try_alloc_zeroed(len)?;
        Ok(Self::assemble(descriptor, data))
    }

    /// Allocate a chunk and fill it with `bytes`.
    ///
    /// `bytes` must be exactly `descriptor.data_size()` long.
    pub fn with_data(descriptor: ObjectDescriptor, bytes: &[u8]) -> Result<Self, ArenaError> {
        let len = descriptor.data_size()?;
        if bytes.len() != len {
            return Err(ArenaError::LengthMismatch {
                expected: len,
                actual: bytes.len(),
            });
        }
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| ArenaError::AllocationFailed { requested: len })?;
        data.extend_from_slice(bytes);
        Ok(Self::assemble(descriptor, data))
    }

    /// Adopt an existing buffer without copying.
    ///
    /// `data` must be exactly `descriptor.data_size()` long.
    pub fn from_vec(descriptor: ObjectDescriptor, data: Vec<u8>) -> Result<Self, ArenaError> {
        let len = descriptor.data_size()?;
        if data.len() != len {
            return Err(ArenaError::LengthMismatch {
                expected: len,
                actual: data.len(),
            });
        }
        Ok(Self::assemble(descriptor, data))
    }

    fn assemble(descriptor: ObjectDescriptor, data: Vec<u8>) -> Self {
        Self {
            id: ChunkId::next(),
            descriptor,
            data: data.into_boxed_slice(),
            refcnt: AtomicU32::new(0),
            pending_free: AtomicBool::new(false),
        }
    }

    /// Unique id.
    pub fn id(&self) -> ChunkId {
        self.id
    }

    /// Descriptor this chunk was stored under.
    pub fn descriptor(&self) -> &ObjectDescriptor {
        &self.descriptor
    }

    /// Chunk bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable chunk bytes. Only reachable before the chunk is shared.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Take the buffer back out of an unshared chunk.
    pub fn into_data(self) -> Vec<u8> {
        self.data.into_vec()
    }

    /// Buffer length in bytes.
    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }

    /// Number of outstanding leases.
    pub fn refcount(&self) -> u32 {
        self.refcnt.load(Ordering::Acquire)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ChunkState {
        if self.pending_free.load(Ordering::Acquire) {
            ChunkState::PendingFree
        } else {
            ChunkState::Live
        }
    }

    /// Whether the chunk has been superseded while leased.
    pub fn is_pending_free(&self) -> bool {
        self.state() == ChunkState::PendingFree
    }

    pub(crate) fn acquire(&self) {
        self.refcnt.fetch_add(1, Ordering::AcqRel);
    }

    /// Drop one lease, returning the remaining count. Never underflows.
    pub(crate) fn release_ref(&self) -> u32 {
        let prev = self
            .refcnt
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        debug_assert!(prev.is_ok(), "lease released twice on chunk {}", self.id);
        prev.map_or(0, |n| n - 1)
    }

    pub(crate) fn mark_pending_free(&self) {
        self.pending_free.store(true, Ordering::Release);
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("id", &self.id)
            .field("descriptor", &self.descriptor)
            .field("len_bytes", &self.data.len())
            .field("refcnt", &self.refcount())
            .field("state", &self.state())
            .finish()
    }
}

/// A counted read lease on a shared chunk.
///
/// Created by [`ObjectIndex::lease`](crate::ObjectIndex::lease). While a
/// guard is alive the chunk cannot be freed by a superseding put. Hand the
/// guard back through [`ObjectIndex::release`](crate::ObjectIndex::release)
/// so a pending-free chunk is reclaimed immediately; a guard that is merely
/// dropped gives up its lease and leaves reclamation to
/// [`ObjectIndex::reap_pending`](crate::ObjectIndex::reap_pending).
pub struct ChunkGuard {
    chunk: Arc<Chunk>,
    released: bool,
}

impl ChunkGuard {
    pub(crate) fn new(chunk: Arc<Chunk>) -> Self {
        chunk.acquire();
        Self {
            chunk,
            released: false,
        }
    }

    /// The leased chunk.
    pub fn chunk(&self) -> &Arc<Chunk> {
        &self.chunk
    }

    /// Give up the lease, returning the chunk and its remaining lease count.
    pub fn release(mut self) -> (Arc<Chunk>, u32) {
        self.released = true;
        let remaining = self.chunk.release_ref();
        (Arc::clone(&self.chunk), remaining)
    }
}

impl Deref for ChunkGuard {
    type Target = Chunk;

    fn deref(&self) -> &Chunk {
        &self.chunk
    }
}

impl Drop for ChunkGuard {
    fn drop(&mut self) {
        if !self.released {
            self.chunk.release_ref();
        }
    }
}

impl fmt::Debug for ChunkGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ChunkGuard").field(&self.chunk.id).finish()
    }
}

// Compile-time assertion: chunks cross threads behind `Arc`.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Chunk>();
    assert::<ChunkGuard>();
};
