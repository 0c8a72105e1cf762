//! 3D noise-based cave carving using the Swiss cheese model.
//!
//! Multi-octave 3D simplex noise hollows out solid cells between the bedrock
//! floor and a shell below the surface. Runs after column fill and before
//! feature placement, and only for biomes whose `structures.caves` is set.

use noise::{NoiseFn, Simplex};
use verdant_biome::BiomeDefinition;
use verdant_voxel::{CHUNK_WIDTH, ChunkData, ChunkPos, Material};

use crate::column::BEDROCK_LAYERS;
use crate::height_model::ChunkHeightMap;

/// Configuration for 3D noise-based cave carving.
#[derive(Clone, Debug, PartialEq)]
pub struct CaveConfig {
    /// Cells where `noise <= threshold` become air. Lower thresholds carve
    /// fewer, smaller caves. Default: -0.55.
    pub threshold: f64,
    /// Number of noise octaves. Default: 3.
    pub octaves: u32,
    /// Base frequency of the cave noise. Default: 0.04.
    pub frequency: f64,
    pub lacunarity: f64,
    pub persistence: f64,
    /// Deepest carve, in blocks below the surface. Default: 120.
    pub max_depth: f64,
    /// Solid shell kept below the surface. Default: 6.
    pub min_depth: f64,
    /// Columns at or below sea level keep this many blocks of floor
    /// below the water. Default: 8.
    pub ocean_floor_buffer: f64,
}

impl Default for CaveConfig {
    fn default() -> Self {
        Self {
            threshold: -0.55,
            octaves: 3,
            frequency: 0.04,
            lacunarity: 2.0,
            persistence: 0.5,
            max_depth: 120.0,
            min_depth: 6.0,
            ocean_floor_buffer: 8.0,
        }
    }
}

/// Carves cave systems into synthesized chunks.
#[derive(Clone, Debug)]
pub struct CaveCarver {
    noise: Simplex,
    config: CaveConfig,
}

impl CaveCarver {
    pub fn new(seed: u64, config: CaveConfig) -> Self {
        // Offset the seed so cave noise is decorrelated from terrain noise.
        let noise = Simplex::new(seed.wrapping_add(0xCAFE_BABE) as u32);
        Self { noise, config }
    }

    pub fn config(&self) -> &CaveConfig {
        &self.config
    }

    /// Whether the cell at world `(x, y, z)` under a column with surface
    /// `surface_y` should be hollow.
    pub fn is_cave(&self, x: i32, y: i32, z: i32, surface_y: i32, sea_level: i32) -> bool {
        if y >= surface_y {
            return false;
        }
        let depth = (surface_y - y) as f64;
        if depth < self.config.min_depth || depth > self.config.max_depth {
            return false;
        }
        // Keep a floor under water so oceans don't drain.
        if surface_y <= sea_level && depth < self.config.ocean_floor_buffer {
            return false;
        }

        let noise_val = self.sample(x as f64, y as f64, z as f64);

        // Caves taper off toward max_depth.
        let span = (self.config.max_depth - self.config.min_depth).max(f64::EPSILON);
        let fade = 1.0 - libm::pow((depth - self.config.min_depth) / span, 2.0);
        noise_val <= self.config.threshold * fade
    }

    /// Hollow out solid cells of `data`. Returns the number of cells carved.
    pub fn carve(
        &self,
        data: &mut ChunkData,
        pos: ChunkPos,
        heights: &ChunkHeightMap,
        biome: &BiomeDefinition,
    ) -> usize {
        let floor = data.min_y() + BEDROCK_LAYERS;
        let sea_level = biome.blocks.sea_level;
        let mut carved = 0;

        for lz in 0..CHUNK_WIDTH {
            for lx in 0..CHUNK_WIDTH {
                let surface_y = heights.get(lx, lz);
                let (wx, wz) = pos.world_column(lx, lz);
                for y in floor..surface_y {
                    let current = data.get(lx, y, lz);
                    if !current.is_solid() || current == biome.blocks.bedrock {
                        continue;
                    }
                    if self.is_cave(wx, y, wz, surface_y, sea_level) {
                        data.set(lx, y, lz, Material::Air);
                        carved += 1;
                    }
                }
            }
        }
        carved
    }

    fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.config.frequency;
        let mut amplitude = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..self.config.octaves {
            total += self.noise.get([x * frequency, y * frequency, z * frequency]) * amplitude;
            max_amplitude += amplitude;
            frequency *= self.config.lacunarity;
            amplitude *= self.config.persistence;
        }

        if max_amplitude == 0.0 {
            0.0
        } else {
            total / max_amplitude
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::{ChunkSynthesizer, TerrainParams};

    fn carver(threshold: f64) -> CaveCarver {
        CaveCarver::new(
            42,
            CaveConfig {
                threshold,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_no_caves_at_or_above_surface() {
        let c = carver(1.0);
        for y in 100..140 {
            assert!(!c.is_cave(0, y, 0, 100, 62));
        }
    }

    #[test]
    fn test_no_caves_in_shell() {
        let c = carver(1.0);
        for depth in 1..6 {
            assert!(!c.is_cave(3, 100 - depth, 3, 100, 62), "depth {depth}");
        }
        assert!(c.is_cave(3, 100 - 6, 3, 100, 62));
    }

    #[test]
    fn test_ocean_floor_buffer() {
        let c = carver(1.0);
        for depth in 6..8 {
            assert!(!c.is_cave(0, 40 - depth, 0, 40, 62));
        }
        assert!(c.is_cave(0, 40 - 8, 0, 40, 62));
    }

    #[test]
    fn test_threshold_controls_density() {
        let count = |threshold: f64| {
            let c = carver(threshold);
            (0..2000)
                .filter(|i| c.is_cave(i % 40, 40 - (i / 40) % 50, i / 7, 100, 62))
                .count()
        };
        assert!(count(0.2) > count(-0.5));
    }

    #[test]
    fn test_carve_is_deterministic_and_spares_bedrock() {
        let mut biome = BiomeDefinition::new("caves");
        biome.terrain.min_height = 110;
        biome.terrain.max_height = 120;
        let pos = ChunkPos::new(4, -9);
        let synth = ChunkSynthesizer::new(3, TerrainParams::default());
        let base = synth.synthesize(pos, &biome);

        let c = CaveCarver::new(3, CaveConfig::default());
        let mut a = base.data.clone();
        let mut b = base.data.clone();
        let carved_a = c.carve(&mut a, pos, &base.heights, &biome);
        let carved_b = c.carve(&mut b, pos, &base.heights, &biome);

        assert_eq!(a, b);
        assert_eq!(carved_a, carved_b);
        assert_eq!(
            base.data.count(Material::Air) + carved_a,
            a.count(Material::Air)
        );
        assert_eq!(a.count(Material::Bedrock), 512);
        // Surface cells are never touched.
        for lz in 0..CHUNK_WIDTH {
            for lx in 0..CHUNK_WIDTH {
                let y = base.heights.get(lx, lz);
                assert_eq!(a.get(lx, y, lz), Material::GrassBlock);
            }
        }
    }
}
