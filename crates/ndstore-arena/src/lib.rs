//! Chunk storage for ndstore.
//!
//! Holds the bytes of stored array regions and answers which of them
//! cover a query. The pieces, bottom up:
//!
//! ```text
//! ObjectIndex (size_hash buckets, bucket = version mod size_hash)
//! └── VecDeque<Arc<Chunk>> per bucket, most recent first
//!     └── Chunk: ObjectDescriptor + Box<[u8]> + lease count + pending-free flag
//!
//! ChunkGuard   counted read lease, handed back through ObjectIndex::release
//! copy         strided copy of the overlap between two boxes
//! ```
//!
//! # Chunk lifecycle
//!
//! A chunk is created, inserted, and later either superseded by an
//! overlapping put of the same name or dropped by
//! [`ObjectIndex::destroy`]. A superseded chunk nobody is reading is
//! dropped at once; one with outstanding leases turns pending-free,
//! disappears from lookups, and is dropped when its last lease returns.
//!
//! The index is not internally synchronised. `ndstore-engine` keeps it
//! behind one mutex; chunk buffers are immutable once shared, so copies
//! out of leased chunks run without the lock.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod chunk;
pub mod config;
pub mod copy;
pub mod error;
pub mod index;

// Public re-exports for the primary API surface.
pub use chunk::{try_alloc_zeroed, Chunk, ChunkGuard, ChunkId, ChunkState};
pub use config::{IndexConfig, SupersedeScope};
pub use copy::{copy, copy_region};
pub use error::ArenaError;
pub use index::{ChunkSet, InsertOutcome, NameSummary, ObjectIndex};
