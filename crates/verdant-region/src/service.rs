//! The spatial region service seam and an in-memory implementation.
//!
//! Regions are bucketed by horizontal sector so a point query only inspects
//! the regions overlapping the point's sector. Every read returns a snapshot
//! of what existed at call time.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::trace;

use crate::bounds::{BlockPos, Cuboid};
use crate::error::ClaimError;

/// Sector edge length is `1 << SECTOR_SHIFT` blocks.
pub const SECTOR_SHIFT: u32 = 6;

/// Regions spanning more sectors than this are kept in a per-world overflow
/// list scanned on every query instead of being bucketed.
pub const MAX_BUCKETED_SECTORS: i64 = 1024;

/// A region as the spatial service knows it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RegionHandle {
    pub id: String,
    pub world: String,
    pub bounds: Cuboid,
}

/// Cuboid regions keyed by `(world, id)`.
///
/// Implementations own their synchronization; every method takes `&self`.
pub trait SpatialRegionService {
    /// Create a cuboid region.
    ///
    /// # Errors
    ///
    /// [`ClaimError::DuplicateRegion`] if `id` already exists in `world`.
    fn create_cuboid_region(
        &self,
        world: &str,
        id: &str,
        bounds: Cuboid,
    ) -> Result<RegionHandle, ClaimError>;

    /// Every region of `world` whose bounds contain `point`.
    fn regions_containing(&self, world: &str, point: BlockPos) -> Vec<RegionHandle>;

    /// Remove a region. Returns `false` if it did not exist.
    fn remove_region(&self, world: &str, id: &str) -> bool;

    fn region(&self, world: &str, id: &str) -> Option<RegionHandle>;
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct SectorKey {
    world: String,
    x: i32,
    z: i32,
}

/// In-memory [`SpatialRegionService`] backed by concurrent maps.
#[derive(Debug, Default)]
pub struct InMemoryRegionIndex {
    regions: DashMap<(String, String), RegionHandle>,
    buckets: DashMap<SectorKey, Vec<String>>,
    /// Per world, ids of regions too large to bucket.
    oversized: DashMap<String, Vec<String>>,
}

impl InMemoryRegionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    fn sector_of(v: i32) -> i32 {
        v >> SECTOR_SHIFT
    }

    /// Sector keys covered by `bounds`, or `None` if there are too many.
    fn sectors(world: &str, bounds: &Cuboid) -> Option<Vec<SectorKey>> {
        let (x0, x1) = (Self::sector_of(bounds.min.x), Self::sector_of(bounds.max.x));
        let (z0, z1) = (Self::sector_of(bounds.min.z), Self::sector_of(bounds.max.z));
        let count = (x1 as i64 - x0 as i64 + 1) * (z1 as i64 - z0 as i64 + 1);
        if count > MAX_BUCKETED_SECTORS {
            return None;
        }
        let mut keys = Vec::with_capacity(count as usize);
        for x in x0..=x1 {
            for z in z0..=z1 {
                keys.push(SectorKey {
                    world: world.to_string(),
                    x,
                    z,
                });
            }
        }
        Some(keys)
    }

    fn index(&self, handle: &RegionHandle) {
        match Self::sectors(&handle.world, &handle.bounds) {
            Some(keys) => {
                for key in keys {
                    self.buckets.entry(key).or_default().push(handle.id.clone());
                }
            }
            None => self
                .oversized
                .entry(handle.world.clone())
                .or_default()
                .push(handle.id.clone()),
        }
    }

    fn unindex(&self, handle: &RegionHandle) {
        let forget = |ids: &mut Vec<String>| ids.retain(|id| *id != handle.id);
        match Self::sectors(&handle.world, &handle.bounds) {
            Some(keys) => {
                for key in keys {
                    if let Some(mut ids) = self.buckets.get_mut(&key) {
                        forget(ids.value_mut());
                    }
                    self.buckets.remove_if(&key, |_, ids| ids.is_empty());
                }
            }
            None => {
                if let Some(mut ids) = self.oversized.get_mut(&handle.world) {
                    forget(ids.value_mut());
                }
            }
        }
    }

    fn candidate_ids(&self, world: &str, point: BlockPos) -> Vec<String> {
        let key = SectorKey {
            world: world.to_string(),
            x: Self::sector_of(point.x),
            z: Self::sector_of(point.z),
        };
        let mut ids = self
            .buckets
            .get(&key)
            .map(|ids| ids.value().clone())
            .unwrap_or_default();
        if let Some(big) = self.oversized.get(world) {
            ids.extend(big.iter().cloned());
        }
        ids
    }
}

impl SpatialRegionService for InMemoryRegionIndex {
    fn create_cuboid_region(
        &self,
        world: &str,
        id: &str,
        bounds: Cuboid,
    ) -> Result<RegionHandle, ClaimError> {
        let handle = match self.regions.entry((world.to_string(), id.to_string())) {
            Entry::Occupied(_) => {
                return Err(ClaimError::DuplicateRegion {
                    world: world.to_string(),
                    id: id.to_string(),
                });
            }
            Entry::Vacant(slot) => {
                let handle = RegionHandle {
                    id: id.to_string(),
                    world: world.to_string(),
                    bounds,
                };
                slot.insert(handle.clone());
                handle
            }
        };
        self.index(&handle);
        trace!("Created region '{id}' in '{world}': {bounds:?}");
        Ok(handle)
    }

    fn regions_containing(&self, world: &str, point: BlockPos) -> Vec<RegionHandle> {
        self.candidate_ids(world, point)
            .into_iter()
            .filter_map(|id| {
                self.regions
                    .get(&(world.to_string(), id))
                    .map(|h| h.value().clone())
            })
            .filter(|h| h.bounds.contains(point))
            .collect()
    }

    fn remove_region(&self, world: &str, id: &str) -> bool {
        match self.regions.remove(&(world.to_string(), id.to_string())) {
            Some((_, handle)) => {
                self.unindex(&handle);
                true
            }
            None => false,
        }
    }

    fn region(&self, world: &str, id: &str) -> Option<RegionHandle> {
        self.regions
            .get(&(world.to_string(), id.to_string()))
            .map(|h| h.value().clone())
    }
}
