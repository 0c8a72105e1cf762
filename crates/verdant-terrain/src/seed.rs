//! Deterministic seeded generation utilities.
//!
//! Per-chunk and per-column RNG derivation from the world seed. No global
//! RNG state exists anywhere in the generator, so chunks can be generated on
//! any thread in any order with identical results.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use verdant_biome::BiomeDefinition;
use verdant_voxel::{ChunkPos, hash_chunk_data};

use crate::pipeline::TerrainPipeline;

/// Multiplier applied to the chunk X coordinate when mixing feature seeds.
pub const CHUNK_X_MIX: i64 = 341_873_128_712;
/// Multiplier applied to the chunk Z coordinate when mixing feature seeds.
pub const CHUNK_Z_MIX: i64 = 132_897_987_541;

/// `seed XOR (chunk_x * K1 + chunk_z * K2)` with wrapping arithmetic.
pub fn feature_seed(world_seed: u64, pos: ChunkPos) -> u64 {
    let mix = (pos.x as i64)
        .wrapping_mul(CHUNK_X_MIX)
        .wrapping_add((pos.z as i64).wrapping_mul(CHUNK_Z_MIX));
    world_seed ^ mix as u64
}

/// RNG for the feature pass of one chunk.
pub fn chunk_rng(world_seed: u64, pos: ChunkPos) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(feature_seed(world_seed, pos))
}

/// RNG for per-block rolls in one world column (border dithering).
pub fn column_rng(world_seed: u64, x: i32, z: i32) -> ChaCha8Rng {
    // Swap the multipliers so column streams never coincide with the chunk
    // stream of the same coordinates.
    let mix = (x as i64)
        .wrapping_mul(CHUNK_Z_MIX)
        .wrapping_add((z as i64).wrapping_mul(CHUNK_X_MIX));
    ChaCha8Rng::seed_from_u64(world_seed.rotate_left(17) ^ mix as u64)
}

/// Generate a chunk and return its content hash for determinism checks.
pub fn generate_and_hash(pipeline: &TerrainPipeline, pos: ChunkPos, biome: &BiomeDefinition) -> u64 {
    hash_chunk_data(&pipeline.generate_chunk(pos, biome).data)
}
