//! Request and reply records for the command surface.
//!
//! Transports deliver requests as flat records: a name, a version, signed
//! element size and dimension count, and two full-width corner arrays.
//! [`PutCommand::descriptor`] and [`GetCommand::descriptor`] validate a
//! record and turn it into an [`ObjectDescriptor`]. Chunks arriving this
//! way carry an unset owner and column-major order.

use ndstore_core::{
    BoundingBox, Coord, GeometryError, ObjectDescriptor, OwnerId, StorageOrder, Version,
    BBOX_MAX_NDIM,
};

use crate::error::StoreError;
use crate::status::NdStatus;

/// Store a region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PutCommand {
    /// Array name.
    pub name: String,
    /// Array version.
    pub version: u32,
    /// Bytes per element.
    pub element_size: i32,
    /// Active dimensions, `1..=10`.
    pub num_dims: i32,
    /// Lower corner; entries past `num_dims` are ignored.
    pub lb: [u64; BBOX_MAX_NDIM],
    /// Upper corner; entries past `num_dims` are ignored.
    pub ub: [u64; BBOX_MAX_NDIM],
    /// Region contents, axis 0 fastest.
    pub payload: Vec<u8>,
}

/// Retrieve a region.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GetCommand {
    /// Array name.
    pub name: String,
    /// Array version.
    pub version: u32,
    /// Bytes per element.
    pub element_size: i32,
    /// Active dimensions, `1..=10`.
    pub num_dims: i32,
    /// Lower corner; entries past `num_dims` are ignored.
    pub lb: [u64; BBOX_MAX_NDIM],
    /// Upper corner; entries past `num_dims` are ignored.
    pub ub: [u64; BBOX_MAX_NDIM],
}

/// Reply to either command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandReply {
    /// Outcome.
    pub status: NdStatus,
    /// Region contents for a successful get; empty otherwise.
    pub data: Vec<u8>,
    /// Length of `data` in bytes.
    pub size: usize,
}

impl CommandReply {
    /// A successful reply carrying `data`.
    pub fn ok(data: Vec<u8>) -> Self {
        Self {
            status: NdStatus::Ok,
            size: data.len(),
            data,
        }
    }

    /// An empty reply with the given status.
    pub fn status(status: NdStatus) -> Self {
        Self {
            status,
            data: Vec::new(),
            size: 0,
        }
    }
}

impl From<&StoreError> for CommandReply {
    fn from(e: &StoreError) -> Self {
        Self::status(NdStatus::from(e))
    }
}

fn build_descriptor(
    name: &str,
    version: u32,
    element_size: i32,
    num_dims: i32,
    lb: &[u64; BBOX_MAX_NDIM],
    ub: &[u64; BBOX_MAX_NDIM],
) -> Result<ObjectDescriptor, StoreError> {
    let num_dims = usize::try_from(num_dims)
        .ok()
        .filter(|n| (1..=BBOX_MAX_NDIM).contains(n))
        .ok_or_else(|| StoreError::invalid(format!("num_dims {num_dims} outside 1..=10")))?;
    let element_size = usize::try_from(element_size)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| StoreError::invalid(format!("element_size {element_size} not positive")))?;
    let bbox = BoundingBox::from_corners(num_dims, Coord(*lb), Coord(*ub))
        .map_err(|e: GeometryError| StoreError::InvalidDescriptor(e.into()))?;
    let desc = ObjectDescriptor::new(name, Version(version), element_size, bbox)?;
    Ok(desc
        .with_owner(OwnerId::UNSET)
        .with_storage_order(StorageOrder::ColumnMajor))
}

fn corners(desc: &ObjectDescriptor) -> ([u64; BBOX_MAX_NDIM], [u64; BBOX_MAX_NDIM]) {
    (desc.bbox.lower().0, desc.bbox.upper().0)
}

/// The record's signed element size; sizes past `i32::MAX` have no encoding.
fn wire_element_size(desc: &ObjectDescriptor) -> Result<i32, StoreError> {
    i32::try_from(desc.element_size).map_err(|_| {
        StoreError::invalid(format!(
            "element_size {} does not fit a command record",
            desc.element_size
        ))
    })
}

impl PutCommand {
    /// Encode a descriptor and payload as a command record.
    ///
    /// Fails with [`StoreError::InvalidArgument`] if the element size does
    /// not fit the record's `i32` field.
    pub fn new(desc: &ObjectDescriptor, payload: Vec<u8>) -> Result<Self, StoreError> {
        let (lb, ub) = corners(desc);
        Ok(Self {
            name: desc.name.clone(),
            version: desc.version.0,
            element_size: wire_element_size(desc)?,
            num_dims: desc.bbox.num_dims() as i32,
            lb,
            ub,
            payload,
        })
    }

    /// Validate the record and build its descriptor.
    pub fn descriptor(&self) -> Result<ObjectDescriptor, StoreError> {
        build_descriptor(
            &self.name,
            self.version,
            self.element_size,
            self.num_dims,
            &self.lb,
            &self.ub,
        )
    }
}

impl GetCommand {
    /// Encode a query descriptor as a command record.
    ///
    /// Fails like [`PutCommand::new`] on an oversized element.
    pub fn new(desc: &ObjectDescriptor) -> Result<Self, StoreError> {
        let (lb, ub) = corners(desc);
        Ok(Self {
            name: desc.name.clone(),
            version: desc.version.0,
            element_size: wire_element_size(desc)?,
            num_dims: desc.bbox.num_dims() as i32,
            lb,
            ub,
        })
    }

    /// Validate the record and build its descriptor.
    pub fn descriptor(&self) -> Result<ObjectDescriptor, StoreError> {
        build_descriptor(
            &self.name,
            self.version,
            self.element_size,
            self.num_dims,
            &self.lb,
            &self.ub,
        )
    }
}
