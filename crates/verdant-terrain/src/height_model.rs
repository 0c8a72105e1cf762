//! Multi-octave fractal Brownian motion (fBm) height model.
//!
//! Composites octaves of [`NoiseField`] into a normalized value, reshapes it
//! according to the biome's terrain shape, and maps it to an integer surface
//! Y clamped to the biome's height bounds.

use verdant_biome::{BiomeDefinition, TerrainShape};
use verdant_voxel::{CHUNK_AREA, CHUNK_WIDTH, ChunkPos};

use crate::noise_field::NoiseField;

/// Global height constants. Biomes scale `noise_scale` and
/// `height_multiplier` by their own multipliers.
#[derive(Clone, Debug, PartialEq)]
pub struct HeightParams {
    /// Frequency of the first octave.
    pub noise_scale: f64,
    /// Surface Y for a shaped value of zero.
    pub base_height: i32,
    /// Height range of a shaped value of one.
    pub height_multiplier: f64,
    /// Number of octaves to composite.
    pub octaves: u32,
    /// Amplitude multiplier between octaves. Default: 0.5.
    pub persistence: f64,
    /// Frequency multiplier between octaves. Default: 2.0.
    pub lacunarity: f64,
}

impl Default for HeightParams {
    fn default() -> Self {
        Self {
            noise_scale: 0.005,
            base_height: 64,
            height_multiplier: 64.0,
            octaves: 6,
            persistence: 0.5,
            lacunarity: 2.0,
        }
    }
}

/// Generates surface heights from seeded fBm noise.
#[derive(Clone, Debug)]
pub struct HeightModel {
    noise: NoiseField,
    params: HeightParams,
}

impl HeightModel {
    pub fn new(seed: u64, params: HeightParams) -> Self {
        Self {
            noise: NoiseField::new(seed),
            params,
        }
    }

    pub fn params(&self) -> &HeightParams {
        &self.params
    }

    pub fn seed(&self) -> u64 {
        self.noise.seed()
    }

    /// Octave sum at `(x, z)` divided by the total amplitude used.
    ///
    /// Returns a value in `[-1, 1]`, or 0 when no octaves are configured.
    pub fn fbm(&self, x: f64, z: f64, scale: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = scale;
        let mut amplitude = 1.0;
        let mut max_value = 0.0;

        for _ in 0..self.params.octaves {
            total += self.noise.sample(x * frequency, z * frequency) * amplitude;
            max_value += amplitude;
            amplitude *= self.params.persistence;
            frequency *= self.params.lacunarity;
        }

        if max_value == 0.0 {
            0.0
        } else {
            total / max_value
        }
    }

    /// Surface Y of world column `(x, z)` for `biome`.
    pub fn height(&self, x: i32, z: i32, biome: &BiomeDefinition) -> i32 {
        let terrain = &biome.terrain;
        let scale = self.params.noise_scale * terrain.noise_scale_multiplier;
        let multiplier = self.params.height_multiplier * terrain.height_multiplier;

        let raw = self.fbm(x as f64, z as f64, scale);
        let normalized = ((raw + 1.0) / 2.0).clamp(0.0, 1.0);
        let shaped = shape(terrain.shape, normalized);

        let height = (self.params.base_height as f64 + shaped * multiplier) as i32;
        // max/min rather than clamp: bounds are validated at load time but an
        // inverted pair must not panic here.
        height.max(terrain.min_height).min(terrain.max_height)
    }

    /// Heights for every column of a chunk, computed once.
    pub fn chunk_height_map(&self, pos: ChunkPos, biome: &BiomeDefinition) -> ChunkHeightMap {
        ChunkHeightMap::from_fn(pos, |lx, lz| {
            let (x, z) = pos.world_column(lx, lz);
            self.height(x, z, biome)
        })
    }
}

/// Reshape a normalized `[0, 1]` value for a terrain shape.
pub fn shape(shape: TerrainShape, n: f64) -> f64 {
    match shape {
        TerrainShape::Flat => n * 0.1 + 0.45,
        TerrainShape::Hills => n,
        TerrainShape::Mountains => libm::pow(n, 1.5),
        TerrainShape::Ocean => n * 0.3,
        TerrainShape::Plateau => {
            if n > 0.6 {
                0.6 + (n - 0.6) * 0.1
            } else {
                n
            }
        }
    }
}

/// One-shot height query. Prefer a cached [`HeightModel`] when sampling
/// repeatedly.
pub fn height(seed: u64, x: i32, z: i32, biome: &BiomeDefinition, params: &HeightParams) -> i32 {
    HeightModel::new(seed, params.clone()).height(x, z, biome)
}

/// Surface heights of the 16×16 columns of one chunk, indexed `[z * 16 + x]`.
///
/// Produced once per chunk and shared by materialization, cave carving, and
/// feature placement.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChunkHeightMap {
    pos: ChunkPos,
    heights: [i32; CHUNK_AREA],
}

impl ChunkHeightMap {
    /// Build a height map by evaluating `f(lx, lz)` for every column.
    pub fn from_fn(pos: ChunkPos, mut f: impl FnMut(usize, usize) -> i32) -> Self {
        let mut heights = [0; CHUNK_AREA];
        for lz in 0..CHUNK_WIDTH {
            for lx in 0..CHUNK_WIDTH {
                heights[lz * CHUNK_WIDTH + lx] = f(lx, lz);
            }
        }
        Self { pos, heights }
    }

    /// A height map with every column at `y`.
    pub fn flat(pos: ChunkPos, y: i32) -> Self {
        Self {
            pos,
            heights: [y; CHUNK_AREA],
        }
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    /// Surface Y of local column `(x, z)`.
    #[inline]
    pub fn get(&self, x: usize, z: usize) -> i32 {
        self.heights[z * CHUNK_WIDTH + x]
    }

    pub fn set(&mut self, x: usize, z: usize, y: i32) {
        self.heights[z * CHUNK_WIDTH + x] = y;
    }

    pub fn min(&self) -> i32 {
        self.heights.iter().copied().min().unwrap_or(0)
    }

    pub fn max(&self) -> i32 {
        self.heights.iter().copied().max().unwrap_or(0)
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.heights
    }
}
