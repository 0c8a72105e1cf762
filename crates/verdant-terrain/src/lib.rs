//! Procedural terrain generation: seeded noise, biome height shaping, column
//! fill, caves, feature scattering, border blending, and the chunk pipeline.

mod async_generation;
mod cave;
mod column;
mod feature;
mod pipeline;
mod seed;
mod synth;
mod tree;

pub mod blend;
pub mod height_model;
pub mod noise_field;

pub use async_generation::{
    AsyncChunkGenerator, GenerationResult, GenerationTask, default_thread_count,
};
pub use blend::{
    BiomeSource, BlendedChunk, DEFAULT_BLEND_RADIUS, MAX_BLEND_RADIUS, blend_block, blend_height,
    primary_share,
};
pub use cave::{CaveCarver, CaveConfig};
pub use column::{BEDROCK_LAYERS, ColumnMaterializer, SUBSURFACE_DEPTH};
pub use feature::{
    FeaturePlacement, FeatureScatterer, FeatureStats, Placement, VeinPlan, pick_weighted,
    plan_vein,
};
pub use height_model::{ChunkHeightMap, HeightModel, HeightParams};
pub use noise_field::NoiseField;
pub use pipeline::{BiomeSelection, GeneratedChunk, TerrainPipeline};
pub use seed::{CHUNK_X_MIX, CHUNK_Z_MIX, chunk_rng, column_rng, feature_seed, generate_and_hash};
pub use synth::{ChunkSynthesizer, SynthesizedChunk, TerrainParams};
pub use tree::{Canopy, TreeCell, TreeTemplate};
