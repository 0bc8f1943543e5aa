//! Core types for the ndstore array staging store.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! geometry and identity of stored array regions: coordinates, inclusive
//! bounding boxes and their algebra, object descriptors, strongly-typed
//! identifiers, and the error types raised while validating them.
//!
//! # Conventions
//!
//! Axis 0 is the fastest-varying (contiguous) axis. A row-major native
//! array must have its axis order reversed when building a box: the box
//! for a C array `c[2][4]` is `lb = {0, 0}`, `ub = {3, 1}`.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod bbox;
pub mod descriptor;
pub mod error;
pub mod id;

pub use bbox::{BoundingBox, Coord, BBOX_MAX_NDIM};
pub use descriptor::{ObjectDescriptor, StorageOrder, MAX_NAME_LEN};
pub use error::{DescriptorError, GeometryError};
pub use id::{OwnerId, Version};
