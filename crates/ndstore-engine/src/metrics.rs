//! Cumulative counters for the storage service.
//!
//! [`StoreMetrics`] is a point-in-time snapshot returned by
//! [`StorageService::metrics`](crate::StorageService::metrics). Counters
//! are cumulative since the service was created; the two resident
//! fields are read from the index when the snapshot is taken.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of storage service activity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    /// Puts that stored a chunk.
    pub puts: u64,
    /// Gets that returned a fully covered buffer.
    pub gets: u64,
    /// Gets that found no overlapping chunk.
    pub get_misses: u64,
    /// Gets that found chunks but not enough to cover the query.
    pub partial_coverage: u64,
    /// Requests rejected before touching the index (bad arguments, sizes).
    pub rejected: u64,
    /// Chunks replaced by a later overlapping put.
    pub superseded: u64,
    /// Superseded chunks whose free waited on an outstanding read.
    pub deferred_evictions: u64,
    /// Pending-free chunks reclaimed after their last read finished.
    pub reaped: u64,
    /// Payload bytes accepted by puts.
    pub bytes_stored: u64,
    /// Bytes returned by successful gets.
    pub bytes_served: u64,
    /// Chunks currently held by the index, pending-free ones included.
    pub resident_chunks: usize,
    /// Bytes currently held by chunk buffers.
    pub resident_bytes: usize,
}

#[derive(Default)]
pub(crate) struct MetricsRecorder {
    pub(crate) puts: AtomicU64,
    pub(crate) gets: AtomicU64,
    pub(crate) get_misses: AtomicU64,
    pub(crate) partial_coverage: AtomicU64,
    pub(crate) rejected: AtomicU64,
    pub(crate) superseded: AtomicU64,
    pub(crate) deferred_evictions: AtomicU64,
    pub(crate) reaped: AtomicU64,
    pub(crate) bytes_stored: AtomicU64,
    pub(crate) bytes_served: AtomicU64,
}

impl MetricsRecorder {
    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, resident_chunks: usize, resident_bytes: usize) -> StoreMetrics {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        StoreMetrics {
            puts: get(&self.puts),
            gets: get(&self.gets),
            get_misses: get(&self.get_misses),
            partial_coverage: get(&self.partial_coverage),
            rejected: get(&self.rejected),
            superseded: get(&self.superseded),
            deferred_evictions: get(&self.deferred_evictions),
            reaped: get(&self.reaped),
            bytes_stored: get(&self.bytes_stored),
            bytes_served: get(&self.bytes_served),
            resident_chunks,
            resident_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StoreMetrics::default();
        assert_eq!(m.puts, 0);
        assert_eq!(m.gets, 0);
        assert_eq!(m.get_misses, 0);
        assert_eq!(m.partial_coverage, 0);
        assert_eq!(m.rejected, 0);
        assert_eq!(m.superseded, 0);
        assert_eq!(m.deferred_evictions, 0);
        assert_eq!(m.reaped, 0);
        assert_eq!(m.bytes_stored, 0);
        assert_eq!(m.bytes_served, 0);
        assert_eq!(m.resident_chunks, 0);
        assert_eq!(m.resident_bytes, 0);
    }

    #[test]
    fn recorder_snapshot_reflects_counters() {
        let r = MetricsRecorder::default();
        MetricsRecorder::add(&r.puts, 2);
        MetricsRecorder::add(&r.bytes_stored, 128);
        let m = r.snapshot(2, 128);
        assert_eq!(m.puts, 2);
        assert_eq!(m.bytes_stored, 128);
        assert_eq!(m.resident_chunks, 2);
        assert_eq!(m.gets, 0);
    }
}
