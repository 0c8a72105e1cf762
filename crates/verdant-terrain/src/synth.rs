//! Chunk synthesis: height map plus column fill over a 16×16 tile.

use verdant_biome::BiomeDefinition;
use verdant_voxel::{CHUNK_WIDTH, ChunkData, ChunkPos};

use crate::column::ColumnMaterializer;
use crate::height_model::{ChunkHeightMap, HeightModel, HeightParams};

/// Height constants plus the world's vertical extent.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainParams {
    pub height: HeightParams,
    /// Lowest world Y.
    pub world_min_y: i32,
    /// Number of vertical cells in a chunk.
    pub world_height: u32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            height: HeightParams::default(),
            world_min_y: -64,
            world_height: 384,
        }
    }
}

/// A synthesized chunk and the height map it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesizedChunk {
    pub pos: ChunkPos,
    pub data: ChunkData,
    pub heights: ChunkHeightMap,
}

/// Drives [`HeightModel`] and [`ColumnMaterializer`] over a chunk.
///
/// Holds only immutable state, so one synthesizer can serve many worker
/// threads.
#[derive(Clone, Debug)]
pub struct ChunkSynthesizer {
    model: HeightModel,
    materializer: ColumnMaterializer,
    world_height: u32,
}

impl ChunkSynthesizer {
    pub fn new(seed: u64, params: TerrainParams) -> Self {
        Self {
            model: HeightModel::new(seed, params.height),
            materializer: ColumnMaterializer::new(params.world_min_y),
            world_height: params.world_height,
        }
    }

    pub fn seed(&self) -> u64 {
        self.model.seed()
    }

    pub fn model(&self) -> &HeightModel {
        &self.model
    }

    pub fn materializer(&self) -> &ColumnMaterializer {
        &self.materializer
    }

    /// An air-filled chunk spanning the world's vertical range.
    pub fn empty_chunk(&self) -> ChunkData {
        ChunkData::new(self.materializer.min_y(), self.world_height)
    }

    pub fn height_map(&self, pos: ChunkPos, biome: &BiomeDefinition) -> ChunkHeightMap {
        self.model.chunk_height_map(pos, biome)
    }

    /// Fill a fresh chunk from an existing height map.
    pub fn materialize(&self, biome: &BiomeDefinition, heights: &ChunkHeightMap) -> ChunkData {
        let mut data = self.empty_chunk();
        for lz in 0..CHUNK_WIDTH {
            for lx in 0..CHUNK_WIDTH {
                self.materializer
                    .fill(&mut data, (lx, lz), heights.get(lx, lz), biome);
            }
        }
        data
    }

    /// Height map then column fill for one chunk.
    pub fn synthesize(&self, pos: ChunkPos, biome: &BiomeDefinition) -> SynthesizedChunk {
        let heights = self.height_map(pos, biome);
        let data = self.materialize(biome, &heights);
        SynthesizedChunk { pos, data, heights }
    }
}
