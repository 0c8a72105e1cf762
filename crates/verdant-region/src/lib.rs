//! Biome claims over world space and point-in-biome resolution.
//!
//! Region geometry is owned by a [`SpatialRegionService`]; the
//! [`ClaimManager`] attaches a biome to regions and answers which biome
//! governs a point, preferring the smallest claim where several overlap.

mod bounds;
mod claim;
mod error;
mod manager;
mod resolver;
mod service;

pub use bounds::{BlockPos, Cuboid};
pub use claim::{BiomeClaim, epoch_seconds};
pub use error::ClaimError;
pub use manager::{ClaimBiomeSource, ClaimManager, DEFAULT_PREFIX};
pub use resolver::RegionResolver;
pub use service::{
    InMemoryRegionIndex, MAX_BUCKETED_SECTORS, RegionHandle, SECTOR_SHIFT, SpatialRegionService,
};
