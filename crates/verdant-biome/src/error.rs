//! Biome loading and registry error types.

use std::path::PathBuf;

use verdant_voxel::Material;

/// A definition invariant that downstream generation depends on was violated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// `terrain.min-height` exceeds `terrain.max-height`.
    #[error("terrain min-height {min} exceeds max-height {max}")]
    HeightBounds { min: i32, max: i32 },

    /// A multiplier that must be positive is zero, negative, or not finite.
    #[error("{field} must be positive, got {value}")]
    NonPositiveMultiplier { field: String, value: f64 },

    /// A probability lies outside `[0, 1]`.
    #[error("{field} must lie in [0, 1], got {value}")]
    ChanceOutOfRange { field: String, value: f64 },

    /// An ore vein's height band is inverted.
    #[error("ore vein {block} has min-height {min} above max-height {max}")]
    OreBand { block: Material, min: i32, max: i32 },
}

/// Errors that reject a biome definition file.
#[derive(Debug, thiserror::Error)]
pub enum BiomeLoadError {
    /// Failed to read the definition file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML.
    #[error("failed to parse biome definition: {0}")]
    Syntax(#[source] toml::de::Error),

    /// The document parsed but violates a definition invariant.
    #[error("invalid biome definition: {0}")]
    Validation(#[from] ValidationError),

    /// The definition's key is already registered.
    #[error(transparent)]
    Duplicate(#[from] RegistryError),
}

/// Errors from registering biomes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// Two definitions normalize to the same key.
    #[error("duplicate biome key {0:?}")]
    DuplicateKey(String),
}
