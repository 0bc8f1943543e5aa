//! The storage service: put and get over a shared object index.
//!
//! One mutex guards the [`ObjectIndex`]. A put builds its chunk outside the
//! lock and holds it only to insert. A get takes leases on the matching
//! chunks under the lock, copies out of them without it, and retakes it to
//! hand the leases back, reclaiming any chunk superseded in the meantime.

use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use ndstore_arena::{
    copy_region, try_alloc_zeroed, ArenaError, Chunk, ChunkGuard, NameSummary, ObjectIndex,
};
use ndstore_core::ObjectDescriptor;

use crate::command::{CommandReply, GetCommand, PutCommand};
use crate::config::{ConfigError, StoreConfig};
use crate::error::StoreError;
use crate::metrics::{MetricsRecorder, StoreMetrics};

type Leases = SmallVec<[ChunkGuard; 4]>;

/// In-memory store of versioned array regions.
///
/// `StorageService` is `Send + Sync`; share it behind an `Arc` and call
/// it from any number of threads.
pub struct StorageService {
    config: StoreConfig,
    index: Mutex<ObjectIndex>,
    metrics: MetricsRecorder,
}

impl StorageService {
    /// Create an empty store.
    pub fn new(config: StoreConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let index = ObjectIndex::new(config.index.clone())?;
        Ok(Self {
            config,
            index: Mutex::new(index),
            metrics: MetricsRecorder::default(),
        })
    }

    /// The configuration this store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ── Put ────────────────────────────────────────────────────────

    /// Store `data` as the region `desc` describes.
    ///
    /// `data` must be exactly `desc.element_size * volume` bytes, axis 0
    /// fastest. Overlapping chunks of the same name are superseded.
    pub fn put(&self, desc: &ObjectDescriptor, data: &[u8]) -> Result<(), StoreError> {
        self.admit(desc, data.len())?;
        let chunk = Chunk::with_data(desc.clone(), data)?;
        self.publish(chunk);
        Ok(())
    }

    /// Like [`put`](Self::put) but adopts the payload buffer without copying.
    pub fn put_owned(&self, desc: ObjectDescriptor, data: Vec<u8>) -> Result<(), StoreError> {
        self.admit(&desc, data.len())?;
        let chunk = Chunk::from_vec(desc, data)?;
        self.publish(chunk);
        Ok(())
    }

    /// Validate a put and check it against the chunk size limit.
    fn admit(&self, desc: &ObjectDescriptor, payload_len: usize) -> Result<(), StoreError> {
        self.check_put(desc, payload_len).inspect_err(|e| {
            MetricsRecorder::add(&self.metrics.rejected, 1);
            debug!(desc = %desc, error = %e, "put rejected");
        })
    }

    fn check_put(&self, desc: &ObjectDescriptor, payload_len: usize) -> Result<(), StoreError> {
        desc.validate()?;
        let len = desc.data_size()?;
        if let Some(limit) = self.config.max_chunk_bytes {
            if len > limit {
                return Err(StoreError::AllocationFailure { requested: len });
            }
        }
        if payload_len != len {
            return Err(StoreError::SizeMismatch {
                expected: len,
                actual: payload_len,
            });
        }
        Ok(())
    }

    fn publish(&self, chunk: Chunk) {
        let bytes = chunk.len_bytes();
        let name = chunk.descriptor().name.clone();
        let version = chunk.descriptor().version;
        let outcome = self.lock().insert(Arc::new(chunk));

        let m = &self.metrics;
        MetricsRecorder::add(&m.puts, 1);
        MetricsRecorder::add(&m.bytes_stored, bytes as u64);
        MetricsRecorder::add(&m.superseded, outcome.superseded as u64);
        MetricsRecorder::add(&m.deferred_evictions, outcome.deferred as u64);
        debug!(
            %name,
            %version,
            bytes,
            superseded = outcome.superseded,
            deferred = outcome.deferred,
            "put stored chunk"
        );
    }

    // ── Get ────────────────────────────────────────────────────────

    /// Assemble the region `query` describes from stored chunks.
    ///
    /// Fails with [`StoreError::ObjectNotFound`] if no chunk of the query's
    /// name and version overlaps the box, and with
    /// [`StoreError::PartialCoverage`] if the overlapping chunks leave
    /// part of it uncovered.
    pub fn get(&self, query: &ObjectDescriptor) -> Result<Vec<u8>, StoreError> {
        let len = self.check_query(query)?;
        let leases = self.lease_matches(query)?;
        let mut out = match try_alloc_zeroed(len) {
            Ok(out) => out,
            Err(e) => {
                self.release_all(leases);
                return Err(e.into());
            }
        };
        self.assemble(query, leases, &mut out)?;
        Ok(out)
    }

    /// Assemble `query` into a caller buffer. Returns the bytes written.
    ///
    /// `out` must hold at least `query.data_size()` bytes; only that
    /// prefix is written. On error the prefix may be partly written.
    pub fn get_into(&self, query: &ObjectDescriptor, out: &mut [u8]) -> Result<usize, StoreError> {
        let len = self.check_query(query)?;
        if out.len() < len {
            MetricsRecorder::add(&self.metrics.rejected, 1);
            return Err(StoreError::SizeMismatch {
                expected: len,
                actual: out.len(),
            });
        }
        let leases = self.lease_matches(query)?;
        self.assemble(query, leases, &mut out[..len])?;
        Ok(len)
    }

    fn check_query(&self, query: &ObjectDescriptor) -> Result<usize, StoreError> {
        query
            .validate()
            .and_then(|()| query.data_size())
            .map_err(StoreError::from)
            .inspect_err(|_| MetricsRecorder::add(&self.metrics.rejected, 1))
    }

    /// Lease every live chunk overlapping `query`, failing on a miss.
    fn lease_matches(&self, query: &ObjectDescriptor) -> Result<Leases, StoreError> {
        let index = self.lock();
        let leases: Leases = index
            .find_all_intersecting(query)
            .iter()
            .map(|c| index.lease(c))
            .collect();
        drop(index);
        if leases.is_empty() {
            MetricsRecorder::add(&self.metrics.get_misses, 1);
            debug!(query = %query, "get found no overlapping chunk");
            return Err(StoreError::ObjectNotFound {
                name: query.name.clone(),
                version: query.version,
            });
        }
        Ok(leases)
    }

    fn assemble(
        &self,
        query: &ObjectDescriptor,
        leases: Leases,
        out: &mut [u8],
    ) -> Result<(), StoreError> {
        let copied = copy_leased(&leases, query, out);
        self.release_all(leases);

        let covered = copied?;
        let expected = query.volume();
        if covered != expected {
            MetricsRecorder::add(&self.metrics.partial_coverage, 1);
            debug!(query = %query, covered, expected, "get only partially covered");
            return Err(StoreError::PartialCoverage { covered, expected });
        }
        MetricsRecorder::add(&self.metrics.gets, 1);
        MetricsRecorder::add(&self.metrics.bytes_served, out.len() as u64);
        Ok(())
    }

    fn release_all(&self, leases: Leases) {
        let mut index = self.lock();
        let mut freed = 0;
        for guard in leases {
            if index.release(guard) {
                freed += 1;
            }
        }
        freed += index.reap_pending();
        drop(index);
        MetricsRecorder::add(&self.metrics.reaped, freed as u64);
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Descriptor of the first live chunk stored under `name`.
    pub fn lookup(&self, name: &str) -> Option<ObjectDescriptor> {
        self.lock()
            .lookup_name(name)
            .map(|c| c.descriptor().clone())
    }

    /// Descriptor of the overlapping chunk of `query`'s name with the
    /// highest version, ignoring `query.version`.
    pub fn latest(&self, query: &ObjectDescriptor) -> Option<ObjectDescriptor> {
        self.lock()
            .find_latest(query)
            .map(|c| c.descriptor().clone())
    }

    /// Chunks currently held, pending-free ones included.
    pub fn chunk_count(&self) -> usize {
        self.lock().len()
    }

    /// Bytes currently held by chunk buffers.
    pub fn memory_bytes(&self) -> usize {
        self.lock().memory_bytes()
    }

    /// Per-name summary of stored chunks.
    pub fn inventory(&self) -> IndexMap<String, NameSummary> {
        self.lock().inventory()
    }

    /// Snapshot of cumulative counters plus current residency.
    pub fn metrics(&self) -> StoreMetrics {
        let (chunks, bytes) = {
            let index = self.lock();
            (index.len(), index.memory_bytes())
        };
        self.metrics.snapshot(chunks, bytes)
    }

    // ── Maintenance ────────────────────────────────────────────────

    /// Reclaim superseded chunks whose readers have all finished.
    pub fn reap(&self) -> usize {
        let freed = self.lock().reap_pending();
        MetricsRecorder::add(&self.metrics.reaped, freed as u64);
        freed
    }

    /// Drop every stored chunk. Returns the number dropped.
    ///
    /// Reads in flight keep their chunks alive until they finish. The
    /// store stays usable afterwards.
    pub fn shutdown(&self) -> usize {
        let dropped = self.lock().destroy();
        debug!(dropped, "store shut down");
        dropped
    }

    // ── Command surface ────────────────────────────────────────────

    /// Run a put record and encode the outcome.
    pub fn execute_put(&self, cmd: PutCommand) -> CommandReply {
        let result = cmd
            .descriptor()
            .and_then(|desc| self.put_owned(desc, cmd.payload));
        match result {
            Ok(()) => CommandReply::ok(Vec::new()),
            Err(e) => CommandReply::from(&e),
        }
    }

    /// Run a get record and encode the outcome.
    pub fn execute_get(&self, cmd: &GetCommand) -> CommandReply {
        match cmd.descriptor().and_then(|desc| self.get(&desc)) {
            Ok(data) => CommandReply::ok(data),
            Err(e) => CommandReply::from(&e),
        }
    }

    /// Lock the index, recovering from poisoning.
    ///
    /// Index mutations complete before any call that could panic, so a
    /// poisoned index is still consistent.
    fn lock(&self) -> MutexGuard<'_, ObjectIndex> {
        self.index.lock().unwrap_or_else(|poisoned| {
            warn!("object index lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl std::fmt::Debug for StorageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageService")
            .field("config", &self.config)
            .field("index", &*self.lock())
            .finish()
    }
}

/// Copy every leased chunk's overlap with `query` into `out`.
///
/// Returns the number of elements filled. Live chunks of one version
/// never overlap, so the sum equals the query volume exactly when the
/// query is fully covered.
fn copy_leased(leases: &Leases, query: &ObjectDescriptor, out: &mut [u8]) -> Result<u64, StoreError> {
    let mut covered = 0;
    for guard in leases {
        let stored = guard.descriptor();
        if stored.element_size != query.element_size {
            return Err(ArenaError::ElementSizeMismatch {
                dst: query.element_size,
                src: stored.element_size,
            }
            .into());
        }
        covered += copy_region(
            out,
            &query.bbox,
            guard.data(),
            &stored.bbox,
            query.element_size,
        )?;
    }
    Ok(covered)
}

// Compile-time assertion: the service is shared across threads.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<StorageService>();
};

#[cfg(test)]
mod tests {
    use super::*;
    use ndstore_arena::{IndexConfig, SupersedeScope};
    use ndstore_core::Version;
    use ndstore_test_utils::{decode_f64, f64_descriptor, fill_f64};

    fn store() -> StorageService {
        StorageService::new(StoreConfig::default()).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        assert!(StorageService::new(StoreConfig::new(IndexConfig::new(0))).is_err());
    }

    #[test]
    fn put_then_get_same_box() {
        let s = store();
        let d = f64_descriptor("temp", 1, &[0, 0], &[3, 3]);
        let payload: Vec<u8> = (0..128).collect();
        s.put(&d, &payload).unwrap();
        assert_eq!(s.get(&d).unwrap(), payload);
        assert_eq!(s.chunk_count(), 1);
    }

    #[test]
    fn payload_length_must_match() {
        let s = store();
        let d = f64_descriptor("temp", 1, &[0], &[3]);
        assert_eq!(
            s.put(&d, &[0; 24]),
            Err(StoreError::SizeMismatch {
                expected: 32,
                actual: 24
            })
        );
        assert_eq!(s.chunk_count(), 0);
        assert_eq!(s.metrics().rejected, 1);
    }

    #[test]
    fn chunk_limit_reports_allocation_failure() {
        let s = StorageService::new(StoreConfig::default().with_max_chunk_bytes(16)).unwrap();
        let d = f64_descriptor("temp", 1, &[0], &[3]);
        assert_eq!(
            s.put(&d, &fill_f64(&d.bbox, 0.0)),
            Err(StoreError::AllocationFailure { requested: 32 })
        );
    }

    #[test]
    fn get_of_unknown_name_or_version_is_not_found() {
        let s = store();
        let d = f64_descriptor("temp", 1, &[0], &[3]);
        s.put(&d, &fill_f64(&d.bbox, 1.0)).unwrap();
        for q in [
            f64_descriptor("pres", 1, &[0], &[3]),
            f64_descriptor("temp", 2, &[0], &[3]),
            f64_descriptor("temp", 1, &[4], &[9]),
        ] {
            assert!(matches!(s.get(&q), Err(StoreError::ObjectNotFound { .. })));
        }
        assert_eq!(s.metrics().get_misses, 3);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn miss_on_huge_query_is_not_found_before_allocating() {
        let s = store();
        // 2^25 x 2^22 doubles: 2^50 bytes.
        let q = f64_descriptor("nothing", 1, &[0, 0], &[(1 << 25) - 1, (1 << 22) - 1]);
        assert_eq!(q.data_size().unwrap(), 1 << 50);
        assert!(matches!(s.get(&q), Err(StoreError::ObjectNotFound { .. })));
        assert_eq!(s.metrics().get_misses, 1);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn failed_output_allocation_releases_leases() {
        let s = store();
        let d = f64_descriptor("temp", 1, &[0, 0], &[3, 3]);
        s.put(&d, &fill_f64(&d.bbox, 1.0)).unwrap();
        // 2^60 bytes, beyond any address space.
        let q = f64_descriptor("temp", 1, &[0, 0], &[(1 << 30) - 1, (1 << 27) - 1]);
        assert!(matches!(s.get(&q), Err(StoreError::AllocationFailure { .. })));

        // The stored chunk is unleased again, so superseding it frees it at once.
        s.put(&d, &fill_f64(&d.bbox, 2.0)).unwrap();
        let m = s.metrics();
        assert_eq!(m.superseded, 1);
        assert_eq!(m.deferred_evictions, 0);
        assert_eq!(s.chunk_count(), 1);
    }

    #[test]
    fn element_size_mismatch_is_invalid_argument() {
        let s = store();
        let d = f64_descriptor("temp", 1, &[0], &[3]);
        s.put(&d, &fill_f64(&d.bbox, 1.0)).unwrap();
        let mut q = d.clone();
        q.element_size = 4;
        assert!(matches!(
            s.get(&q),
            Err(StoreError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn get_into_checks_buffer_size() {
        let s = store();
        let d = f64_descriptor("temp", 1, &[0], &[3]);
        s.put(&d, &fill_f64(&d.bbox, 5.0)).unwrap();

        let mut small = [0u8; 16];
        assert_eq!(
            s.get_into(&d, &mut small),
            Err(StoreError::SizeMismatch {
                expected: 32,
                actual: 16
            })
        );

        let mut big = [0u8; 40];
        assert_eq!(s.get_into(&d, &mut big).unwrap(), 32);
        assert_eq!(decode_f64(&big[..32]), [5.0; 4]);
        assert_eq!(&big[32..], &[0u8; 8]);
    }

    #[test]
    fn lookup_and_latest() {
        let s = StorageService::new(StoreConfig::new(
            IndexConfig::default().with_scope(SupersedeScope::VersionBucket),
        ))
        .unwrap();
        for v in [1, 2, 3] {
            let d = f64_descriptor("temp", v, &[0], &[3]);
            s.put(&d, &fill_f64(&d.bbox, v as f64)).unwrap();
        }
        assert_eq!(s.lookup("temp").unwrap().name, "temp");
        assert!(s.lookup("pres").is_none());
        let q = f64_descriptor("temp", 0, &[2], &[2]);
        assert_eq!(s.latest(&q).unwrap().version, Version(3));
    }

    #[test]
    fn shutdown_empties_store() {
        let s = store();
        let d = f64_descriptor("temp", 1, &[0], &[3]);
        s.put(&d, &fill_f64(&d.bbox, 1.0)).unwrap();
        assert_eq!(s.shutdown(), 1);
        assert_eq!(s.chunk_count(), 0);
        assert_eq!(s.memory_bytes(), 0);
        assert!(matches!(s.get(&d), Err(StoreError::ObjectNotFound { .. })));
    }

    #[test]
    fn metrics_track_traffic() {
        let s = store();
        let d = f64_descriptor("temp", 1, &[0], &[3]);
        s.put(&d, &fill_f64(&d.bbox, 1.0)).unwrap();
        s.put(&d, &fill_f64(&d.bbox, 2.0)).unwrap();
        s.get(&d).unwrap();
        let m = s.metrics();
        assert_eq!(m.puts, 2);
        assert_eq!(m.superseded, 1);
        assert_eq!(m.gets, 1);
        assert_eq!(m.bytes_stored, 64);
        assert_eq!(m.bytes_served, 32);
        assert_eq!(m.resident_chunks, 1);
        assert_eq!(m.resident_bytes, 32);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use ndstore_test_utils::{fill_with, global_index};
        use proptest::prelude::*;

        /// Cut points splitting `0..64` into contiguous segments.
        fn arb_cuts() -> impl Strategy<Value = Vec<u64>> {
            prop::collection::btree_set(1u64..64, 0..8)
                .prop_map(|set| set.into_iter().collect())
        }

        fn segments(cuts: &[u64]) -> Vec<(u64, u64)> {
            let mut bounds = vec![0];
            bounds.extend_from_slice(cuts);
            bounds.push(64);
            bounds.windows(2).map(|w| (w[0], w[1] - 1)).collect()
        }

        proptest! {
            #[test]
            fn tiled_puts_answer_any_range(
                cuts in arb_cuts(),
                lo in 0u64..64,
                len in 0u64..64,
                skip in any::<prop::sample::Index>(),
            ) {
                let s = store();
                let domain = f64_descriptor("x", 1, &[0], &[63]).bbox;
                let segs = segments(&cuts);
                let skipped = skip.index(segs.len());
                for (i, &(a, b)) in segs.iter().enumerate() {
                    if i == skipped {
                        continue;
                    }
                    let d = f64_descriptor("x", 1, &[a], &[b]);
                    s.put(&d, &fill_with(&d.bbox, |p| global_index(&domain, p))).unwrap();
                }

                let hi = (lo + len).min(63);
                let q = f64_descriptor("x", 1, &[lo], &[hi]);
                let (gap_lo, gap_hi) = segs[skipped];
                let touches_gap = lo <= gap_hi && gap_lo <= hi;
                match s.get(&q) {
                    Ok(data) => {
                        prop_assert!(!touches_gap);
                        let want: Vec<f64> = (lo..=hi).map(|x| x as f64).collect();
                        prop_assert_eq!(decode_f64(&data), want);
                    }
                    Err(StoreError::PartialCoverage { covered, expected }) => {
                        prop_assert!(touches_gap);
                        prop_assert!(covered < expected);
                    }
                    Err(StoreError::ObjectNotFound { .. }) => {
                        prop_assert!(gap_lo <= lo && hi <= gap_hi);
                    }
                    Err(e) => prop_assert!(false, "unexpected error {}", e),
                }
            }
        }
    }
}
