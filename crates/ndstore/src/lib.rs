//! ndstore: an in-memory staging store for regions of N-dimensional arrays.
//!
//! Producers put rectangular regions ("chunks") of named, versioned
//! arrays; consumers get arbitrary boxes back, assembled from whichever
//! stored chunks overlap them. This is the top-level facade crate that
//! re-exports the public API from all ndstore sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use ndstore::prelude::*;
//!
//! let store = StorageService::new(StoreConfig::default()).unwrap();
//!
//! // Two halves of a 4x4 array of f64, axis 0 fastest.
//! let top = BoundingBox::new(&[0, 0], &[3, 1]).unwrap();
//! let bottom = BoundingBox::new(&[0, 2], &[3, 3]).unwrap();
//! for (bbox, value) in [(top, 1.0f64), (bottom, 2.0)] {
//!     let desc = ObjectDescriptor::new("temp", Version(1), 8, bbox).unwrap();
//!     let payload: Vec<u8> = (0..8).flat_map(|_| value.to_ne_bytes()).collect();
//!     store.put(&desc, &payload).unwrap();
//! }
//!
//! let whole = BoundingBox::new(&[0, 0], &[3, 3]).unwrap();
//! let query = ObjectDescriptor::new("temp", Version(1), 8, whole).unwrap();
//! let bytes = store.get(&query).unwrap();
//! assert_eq!(bytes.len(), 16 * 8);
//!
//! // Leaving a gap makes the get fail instead of returning holes.
//! let taller = BoundingBox::new(&[0, 0], &[3, 4]).unwrap();
//! let query = ObjectDescriptor::new("temp", Version(1), 8, taller).unwrap();
//! assert!(matches!(store.get(&query), Err(StoreError::PartialCoverage { .. })));
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `ndstore-core` | Bounding boxes, descriptors, ids |
//! | [`arena`] | `ndstore-arena` | Chunks, the object index, the copy engine |
//! | [`engine`] | `ndstore-engine` | Storage service, commands, status codes |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Bounding boxes, object descriptors and ids (`ndstore-core`).
pub use ndstore_core as types;

/// Chunk storage, the versioned object index and strided copies
/// (`ndstore-arena`).
///
/// Use it directly to embed the index without the service's locking.
pub use ndstore_arena as arena;

/// The storage service and its command surface (`ndstore-engine`).
pub use ndstore_engine as engine;

/// Common imports for typical ndstore usage.
///
/// ```rust
/// use ndstore::prelude::*;
/// ```
pub mod prelude {
    // Geometry and identity
    pub use ndstore_core::{BoundingBox, ObjectDescriptor, OwnerId, StorageOrder, Version};

    // Index settings
    pub use ndstore_arena::{IndexConfig, SupersedeScope};

    // Service
    pub use ndstore_engine::{
        CommandReply, GetCommand, NdStatus, PutCommand, StorageService, StoreConfig, StoreError,
        StoreMetrics,
    };
}
