//! Object descriptors: the identity and geometry of one stored chunk.
//!
//! An [`ObjectDescriptor`] names a region of a versioned array. The same
//! type describes both stored chunks and get queries; the relations below
//! decide which stored chunks answer a query and which ones a new put
//! supersedes.
//!
//! | Relation | Name | Version | Owner | Boxes |
//! |----------|------|---------|-------|-------|
//! | [`equals`](ObjectDescriptor::equals) | – | – | equal | identical |
//! | [`equals_ignoring_owner`](ObjectDescriptor::equals_ignoring_owner) | equal | – | – | identical |
//! | [`intersects`](ObjectDescriptor::intersects) | equal | equal | – | overlap |
//! | [`name_intersects`](ObjectDescriptor::name_intersects) | equal | – | – | overlap |

use std::fmt;

use crate::bbox::BoundingBox;
use crate::error::DescriptorError;
use crate::id::{OwnerId, Version};

/// Longest object name accepted, in bytes.
pub const MAX_NAME_LEN: usize = 153;

/// Memory layout tag carried by a chunk.
///
/// The store never converts between layouts; the tag travels with the data
/// so consumers can interpret it. Chunks arriving through the command
/// surface are always [`ColumnMajor`](StorageOrder::ColumnMajor).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum StorageOrder {
    /// Last axis varies fastest.
    RowMajor,
    /// Axis 0 varies fastest.
    #[default]
    ColumnMajor,
}

/// Identity and geometry of a chunk or a query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectDescriptor {
    /// Array name, at most [`MAX_NAME_LEN`] bytes.
    pub name: String,
    /// Layout tag.
    pub storage_order: StorageOrder,
    /// Producer id, [`OwnerId::UNSET`] if unknown.
    pub owner: OwnerId,
    /// Array version.
    pub version: Version,
    /// Region of the global array covered.
    pub bbox: BoundingBox,
    /// Size of one element in bytes.
    pub element_size: usize,
}

impl ObjectDescriptor {
    /// Build a validated descriptor with unset owner and column-major order.
    ///
    /// Rejects names longer than [`MAX_NAME_LEN`] bytes, a zero element
    /// size, and geometries whose byte size would overflow `usize`.
    pub fn new(
        name: impl Into<String>,
        version: Version,
        element_size: usize,
        bbox: BoundingBox,
    ) -> Result<Self, DescriptorError> {
        let desc = Self {
            name: name.into(),
            storage_order: StorageOrder::default(),
            owner: OwnerId::UNSET,
            version,
            bbox,
            element_size,
        };
        desc.validate()?;
        Ok(desc)
    }

    /// Set the producer id.
    pub fn with_owner(mut self, owner: impl Into<OwnerId>) -> Self {
        self.owner = owner.into();
        self
    }

    /// Set the layout tag.
    pub fn with_storage_order(mut self, order: StorageOrder) -> Self {
        self.storage_order = order;
        self
    }

    /// The same region under a different version.
    pub fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// Check the invariants [`new`](Self::new) establishes.
    ///
    /// Descriptors are plain data with public fields, so consumers that
    /// assemble one by hand call this before handing it to the store.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.name.len() > MAX_NAME_LEN {
            return Err(DescriptorError::NameTooLong {
                len: self.name.len(),
            });
        }
        if self.element_size == 0 {
            return Err(DescriptorError::ZeroElementSize);
        }
        self.data_size().map(|_| ())
    }

    /// Number of elements covered.
    pub fn volume(&self) -> u64 {
        self.bbox.volume()
    }

    /// Size in bytes of a buffer holding this region: `element_size * volume`.
    pub fn data_size(&self) -> Result<usize, DescriptorError> {
        let overflow = || DescriptorError::SizeOverflow {
            element_size: self.element_size,
            volume: self.bbox.volume(),
        };
        let volume = self.bbox.checked_volume().ok_or_else(overflow)?;
        let volume = usize::try_from(volume).map_err(|_| overflow())?;
        volume.checked_mul(self.element_size).ok_or_else(overflow)
    }

    /// Same owner and identical boxes.
    pub fn equals(&self, other: &ObjectDescriptor) -> bool {
        self.owner == other.owner && self.bbox.equals(&other.bbox)
    }

    /// Same name and identical boxes; owner and version are ignored.
    pub fn equals_ignoring_owner(&self, other: &ObjectDescriptor) -> bool {
        self.name == other.name && self.bbox.equals(&other.bbox)
    }

    /// Same name, same version, and overlapping boxes.
    pub fn intersects(&self, other: &ObjectDescriptor) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.same_rank(other)
            && self.bbox.intersects(&other.bbox)
    }

    /// Same name and overlapping boxes; version is ignored.
    pub fn name_intersects(&self, other: &ObjectDescriptor) -> bool {
        self.name == other.name && self.same_rank(other) && self.bbox.intersects(&other.bbox)
    }

    fn same_rank(&self, other: &ObjectDescriptor) -> bool {
        self.bbox.num_dims() == other.bbox.num_dims()
    }
}

impl fmt::Display for ObjectDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@v{} {} (owner {}, {} B/elem, {:?})",
            self.name, self.version, self.bbox, self.owner, self.element_size, self.storage_order
        )
    }
}
