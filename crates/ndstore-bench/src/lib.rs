//! Benchmark profiles for the ndstore array staging store.
//!
//! - [`reference_profile`]: 256x256 `f64` domain split over a 4x4 grid
//! - [`stress_profile`]: 64x64x64 `f64` domain split over a 4x4x4 grid
//! - [`load_store`]: a service populated with every block of a profile

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use ndstore_core::{BoundingBox, ObjectDescriptor};
use ndstore_engine::{StorageService, StoreConfig};
use ndstore_test_utils::{decompose, f64_descriptor, fill_with, global_index};

/// A block-decomposed global domain.
#[derive(Clone, Debug)]
pub struct Profile {
    /// Array name every block is stored under.
    pub name: &'static str,
    /// Version every block is stored under.
    pub version: u32,
    /// Global extents.
    pub global: Vec<u64>,
    /// Blocks per axis.
    pub grid: Vec<u64>,
}

impl Profile {
    /// Box covering the whole domain.
    pub fn domain(&self) -> BoundingBox {
        let ub: Vec<u64> = self.global.iter().map(|&e| e - 1).collect();
        BoundingBox::new(&vec![0; ub.len()], &ub).expect("non-empty domain")
    }

    /// Descriptor for a query over `bbox`.
    pub fn query(&self, bbox: &BoundingBox) -> ObjectDescriptor {
        f64_descriptor(self.name, self.version, bbox.lb(), bbox.ub())
    }

    /// Every block with its payload, in rank order.
    pub fn blocks(&self) -> Vec<(ObjectDescriptor, Vec<u8>)> {
        let domain = self.domain();
        decompose(&self.global, &self.grid)
            .into_iter()
            .map(|b| (self.query(&b), fill_with(&b, |p| global_index(&domain, p))))
            .collect()
    }
}

/// 256x256 doubles over a 4x4 grid: 16 chunks of 32 KiB.
pub fn reference_profile() -> Profile {
    Profile {
        name: "reference",
        version: 1,
        global: vec![256, 256],
        grid: vec![4, 4],
    }
}

/// 64x64x64 doubles over a 4x4x4 grid: 64 chunks of 32 KiB.
pub fn stress_profile() -> Profile {
    Profile {
        name: "stress",
        version: 1,
        global: vec![64, 64, 64],
        grid: vec![4, 4, 4],
    }
}

/// A default-configured store holding every block of `profile`.
pub fn load_store(profile: &Profile) -> StorageService {
    let store = StorageService::new(StoreConfig::default()).expect("default config is valid");
    for (desc, payload) in profile.blocks() {
        store.put_owned(desc, payload).expect("profile block fits");
    }
    store
}
