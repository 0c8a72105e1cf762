//! Biome definitions: the data model, the TOML loader, and the registry.
//!
//! Definitions are parsed once, validated, and then shared immutably behind
//! `Arc`. Token parsing for materials, tree types, and terrain shapes is
//! fallible; the loader decides which default replaces an unknown token.

pub mod def;
pub mod error;
pub mod loader;
pub mod registry;

pub use def::{
    BiomeDefinition, BlockPalette, FeatureSettings, Layer, OreSettings, OreVein, PlantEntry,
    StructureSettings, SurfaceDecoration, TerrainSettings, TerrainShape, TreeEntry, TreeSettings,
    TreeType, VegetationSettings, biome_key,
};
pub use error::{BiomeLoadError, RegistryError, ValidationError};
pub use loader::{LoadedBiome, load_file, parse_str};
pub use registry::{BiomeRegistry, LoadFailure};
