//! Versioned, hash-bucketed index of stored chunks.
//!
//! Chunks land in bucket `version mod size_hash`, most recent first. A put
//! supersedes the overlapping chunks of the same name it finds in its
//! search scope (see [`SupersedeScope`]); a superseded chunk with
//! outstanding leases is flagged pending-free and stays in its bucket,
//! invisible to lookups, until the last lease is released.
//!
//! The index itself is single-threaded. Callers that share it wrap it in a
//! lock and take leases under that lock.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use ndstore_core::{ObjectDescriptor, Version};

use crate::chunk::{Chunk, ChunkGuard};
use crate::config::{IndexConfig, SupersedeScope};
use crate::error::ArenaError;

/// Chunks answering one query. Most gets are served by a handful.
pub type ChunkSet = SmallVec<[Arc<Chunk>; 4]>;

/// What an [`ObjectIndex::insert`] did to the chunks already present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    /// Chunks replaced by the new one (freed plus deferred).
    pub superseded: usize,
    /// Superseded chunks that were still leased and now wait for release.
    pub deferred: usize,
}

/// Per-name summary returned by [`ObjectIndex::inventory`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameSummary {
    /// Live chunks under this name.
    pub chunks: usize,
    /// Superseded chunks still waiting for readers.
    pub pending: usize,
    /// Bytes held by all of this name's chunks.
    pub bytes: usize,
    /// Highest version with a live chunk, if any.
    pub latest: Option<Version>,
}

/// The versioned object index.
pub struct ObjectIndex {
    config: IndexConfig,
    buckets: Vec<VecDeque<Arc<Chunk>>>,
    num_obj: usize,
    bytes: usize,
}

impl ObjectIndex {
    /// Create an empty index with `config.size_hash` buckets.
    pub fn new(config: IndexConfig) -> Result<Self, ArenaError> {
        config.validate()?;
        let buckets = (0..config.size_hash).map(|_| VecDeque::new()).collect();
        Ok(Self {
            config,
            buckets,
            num_obj: 0,
            bytes: 0,
        })
    }

    /// The configuration this index was built with.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Add a chunk, superseding the overlapping chunks of the same name.
    ///
    /// Every live chunk in the search scope whose name matches and whose
    /// box overlaps the new chunk's box (any version) is replaced: dropped
    /// at once if unleased, otherwise flagged pending-free. The new chunk
    /// goes to the front of bucket `version mod size_hash`.
    ///
    /// Every match is replaced, not only the first, so live chunks of one
    /// version never overlap.
    pub fn insert(&mut self, chunk: Arc<Chunk>) -> InsertOutcome {
        let desc = chunk.descriptor();
        let home = self.config.bucket_of(desc.version);
        let scope = match self.config.supersede_scope {
            SupersedeScope::VersionBucket => home..home + 1,
            SupersedeScope::AllBuckets => 0..self.buckets.len(),
        };

        let mut outcome = InsertOutcome::default();
        for b in scope {
            let mut i = 0;
            while i < self.buckets[b].len() {
                let old = &self.buckets[b][i];
                if old.is_pending_free() || !old.descriptor().name_intersects(desc) {
                    i += 1;
                    continue;
                }
                outcome.superseded += 1;
                if old.refcount() == 0 {
                    debug!(old = %old.descriptor(), new = %desc, "superseding chunk");
                    self.unlink_at(b, i);
                } else {
                    warn!(
                        old = %old.descriptor(),
                        refcnt = old.refcount(),
                        "chunk still leased, eviction delayed"
                    );
                    old.mark_pending_free();
                    outcome.deferred += 1;
                    i += 1;
                }
            }
        }

        self.num_obj += 1;
        self.bytes += chunk.len_bytes();
        self.buckets[home].push_front(chunk);
        outcome
    }

    /// Every live chunk of the query's name and version whose box overlaps
    /// the query box, in bucket order (most recent first).
    pub fn find_all_intersecting(&self, query: &ObjectDescriptor) -> ChunkSet {
        self.bucket_for(query.version)
            .iter()
            .filter(|c| !c.is_pending_free() && c.descriptor().intersects(query))
            .cloned()
            .collect()
    }

    /// First live chunk of the query's name overlapping the query box, any
    /// version, searching every bucket.
    pub fn find_name_match(&self, query: &ObjectDescriptor) -> Option<Arc<Chunk>> {
        self.live()
            .find(|c| c.descriptor().name_intersects(query))
            .cloned()
    }

    /// The overlapping live chunk of the query's name with the highest
    /// version.
    pub fn find_latest(&self, query: &ObjectDescriptor) -> Option<Arc<Chunk>> {
        self.live()
            .filter(|c| c.descriptor().name_intersects(query))
            .max_by_key(|c| c.descriptor().version)
            .cloned()
    }

    /// First live chunk stored under exactly this name.
    pub fn lookup_name(&self, name: &str) -> Option<Arc<Chunk>> {
        self.live().find(|c| c.descriptor().name == name).cloned()
    }

    /// Take a read lease on an indexed chunk.
    pub fn lease(&self, chunk: &Arc<Chunk>) -> ChunkGuard {
        ChunkGuard::new(Arc::clone(chunk))
    }

    /// Return a lease. A pending-free chunk whose last lease this was is
    /// dropped from the index; returns whether that happened.
    pub fn release(&mut self, guard: ChunkGuard) -> bool {
        let (chunk, remaining) = guard.release();
        if remaining == 0 && chunk.is_pending_free() {
            debug!(chunk = %chunk.descriptor(), "last lease released, freeing superseded chunk");
            return self.remove(&chunk).is_some();
        }
        false
    }

    /// Unlink a chunk without regard to its leases.
    ///
    /// The index gives up its reference; outstanding guards keep the
    /// buffer alive until they are dropped.
    pub fn remove(&mut self, chunk: &Arc<Chunk>) -> Option<Arc<Chunk>> {
        let b = self.config.bucket_of(chunk.descriptor().version);
        let pos = self.buckets[b].iter().position(|c| Arc::ptr_eq(c, chunk))?;
        self.unlink_at(b, pos)
    }

    /// Drop a chunk from the index if nobody holds a lease on it.
    pub fn try_evict(&mut self, chunk: &Arc<Chunk>) -> bool {
        if chunk.refcount() != 0 {
            return false;
        }
        self.remove(chunk).is_some()
    }

    /// Drop every pending-free chunk whose leases have all been released.
    ///
    /// Returns the number of chunks freed.
    pub fn reap_pending(&mut self) -> usize {
        let mut freed = 0;
        for b in 0..self.buckets.len() {
            let mut i = 0;
            while i < self.buckets[b].len() {
                let c = &self.buckets[b][i];
                if c.is_pending_free() && c.refcount() == 0 {
                    self.unlink_at(b, i);
                    freed += 1;
                } else {
                    i += 1;
                }
            }
        }
        if freed > 0 {
            debug!(freed, "reaped superseded chunks");
        }
        freed
    }

    /// Drop every chunk, leased or not. Returns the number dropped.
    pub fn destroy(&mut self) -> usize {
        let mut dropped = 0;
        for bucket in &mut self.buckets {
            for chunk in bucket.drain(..) {
                if chunk.refcount() != 0 {
                    warn!(chunk = %chunk.descriptor(), refcnt = chunk.refcount(), "destroying leased chunk");
                }
                dropped += 1;
            }
        }
        self.num_obj = self.num_obj.saturating_sub(dropped);
        if self.num_obj != 0 {
            warn!(num_obj = self.num_obj, "object count out of sync after destroy");
            self.num_obj = 0;
        }
        self.bytes = 0;
        dropped
    }

    /// Number of chunks held, pending-free ones included.
    pub fn len(&self) -> usize {
        self.num_obj
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.num_obj == 0
    }

    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Chunks in bucket `b`, or 0 past the last bucket.
    pub fn bucket_len(&self, b: usize) -> usize {
        self.buckets.get(b).map_or(0, VecDeque::len)
    }

    /// Bytes held by indexed chunk buffers.
    pub fn memory_bytes(&self) -> usize {
        self.bytes
    }

    /// Per-name summary, names in first-seen bucket order.
    pub fn inventory(&self) -> IndexMap<String, NameSummary> {
        let mut out: IndexMap<String, NameSummary> = IndexMap::new();
        for chunk in self.buckets.iter().flatten() {
            let desc = chunk.descriptor();
            let entry = out.entry(desc.name.clone()).or_default();
            entry.bytes += chunk.len_bytes();
            if chunk.is_pending_free() {
                entry.pending += 1;
            } else {
                entry.chunks += 1;
                entry.latest = entry.latest.max(Some(desc.version));
            }
        }
        out
    }

    /// Iterate every chunk, bucket by bucket, most recent first.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Chunk>> {
        self.buckets.iter().flatten()
    }

    fn live(&self) -> impl Iterator<Item = &Arc<Chunk>> {
        self.iter().filter(|c| !c.is_pending_free())
    }

    fn bucket_for(&self, version: Version) -> &VecDeque<Arc<Chunk>> {
        &self.buckets[self.config.bucket_of(version)]
    }

    fn unlink_at(&mut self, b: usize, pos: usize) -> Option<Arc<Chunk>> {
        let chunk = self.buckets[b].remove(pos)?;
        self.num_obj -= 1;
        self.bytes -= chunk.len_bytes();
        Some(chunk)
    }
}

impl std::fmt::Debug for ObjectIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectIndex")
            .field("size_hash", &self.config.size_hash)
            .field("num_obj", &self.num_obj)
            .field("bytes", &self.bytes)
            .finish()
    }
}
