//! Claim and region errors.

/// Errors from creating, registering, or removing biome claims.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClaimError {
    /// No biome with this key is registered.
    #[error("unknown biome {0:?}")]
    UnknownBiome(String),

    /// A region with this id already exists in the world.
    #[error("region {id:?} already exists in world {world:?}")]
    DuplicateRegion { world: String, id: String },

    /// No region with this id exists in the world.
    #[error("no region {id:?} in world {world:?}")]
    UnknownRegion { world: String, id: String },
}
