//! Biome claims: a cuboid of a world governed by one biome.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::bounds::{BlockPos, Cuboid};

/// "This volume is governed by this biome."
///
/// Claims may overlap. Where they do, the smaller claim is authoritative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomeClaim {
    /// Id of the spatial region backing the claim.
    pub id: String,
    pub world: String,
    pub bounds: Cuboid,
    pub biome_key: String,
    /// Who created the claim.
    pub claimant: String,
    /// Creation time, in seconds since the Unix epoch.
    #[serde(default)]
    pub created_at: u64,
}

impl BiomeClaim {
    /// A claim stamped with the current time.
    pub fn new(
        id: impl Into<String>,
        world: impl Into<String>,
        bounds: Cuboid,
        biome_key: impl Into<String>,
        claimant: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            world: world.into(),
            bounds,
            biome_key: biome_key.into(),
            claimant: claimant.into(),
            created_at: epoch_seconds(),
        }
    }

    pub fn contains(&self, world: &str, point: BlockPos) -> bool {
        self.world == world && self.bounds.contains(point)
    }

    pub fn volume(&self) -> u128 {
        self.bounds.volume()
    }
}

/// Seconds since the Unix epoch, or 0 if the clock is before it.
pub fn epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
