//! Per-chunk generation pipeline.
//!
//! Height map, column fill, cave carving, then feature placement. Every
//! stage reads the same height map, so trees and ores always sit on the
//! terrain that was actually materialized.

use std::fmt;
use std::sync::Arc;

use tracing::debug;
use verdant_biome::BiomeDefinition;
use verdant_voxel::{ChunkData, ChunkPos};

use crate::blend::{BiomeSource, DEFAULT_BLEND_RADIUS};
use crate::cave::{CaveCarver, CaveConfig};
use crate::feature::{FeatureScatterer, FeatureStats};
use crate::height_model::ChunkHeightMap;
use crate::synth::{ChunkSynthesizer, SynthesizedChunk, TerrainParams};

/// How the biome of each column is decided.
#[derive(Clone)]
pub enum BiomeSelection {
    /// The whole chunk belongs to one biome.
    Single(Arc<BiomeDefinition>),
    /// Columns are looked up in `source` and blended within `radius` of a
    /// border. Unclaimed columns use `fallback`.
    Blended {
        source: Arc<dyn BiomeSource + Send + Sync>,
        fallback: Arc<BiomeDefinition>,
        radius: f64,
    },
}

impl BiomeSelection {
    pub fn blended(
        source: Arc<dyn BiomeSource + Send + Sync>,
        fallback: Arc<BiomeDefinition>,
    ) -> Self {
        Self::Blended {
            source,
            fallback,
            radius: DEFAULT_BLEND_RADIUS,
        }
    }
}

impl fmt::Debug for BiomeSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(biome) => f.debug_tuple("Single").field(&biome.key).finish(),
            Self::Blended {
                fallback, radius, ..
            } => f
                .debug_struct("Blended")
                .field("fallback", &fallback.key)
                .field("radius", radius)
                .finish_non_exhaustive(),
        }
    }
}

/// A fully generated chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedChunk {
    pub pos: ChunkPos,
    pub data: ChunkData,
    pub heights: ChunkHeightMap,
    /// Key of the biome whose features were placed.
    pub biome: String,
    /// Cells hollowed out by the cave pass.
    pub carved: usize,
    /// Feature placements that landed in the chunk.
    pub placed: usize,
    pub features: FeatureStats,
    /// Columns blended with a neighbouring biome.
    pub blended_columns: usize,
}

/// Runs every generation stage for one chunk. Immutable, so a single
/// pipeline is shared by all worker threads.
#[derive(Clone, Debug)]
pub struct TerrainPipeline {
    synthesizer: ChunkSynthesizer,
    caves: CaveCarver,
    scatterer: FeatureScatterer,
}

impl TerrainPipeline {
    pub fn new(seed: u64, params: TerrainParams) -> Self {
        Self::with_caves(seed, params, CaveConfig::default())
    }

    pub fn with_caves(seed: u64, params: TerrainParams, caves: CaveConfig) -> Self {
        Self {
            synthesizer: ChunkSynthesizer::new(seed, params),
            caves: CaveCarver::new(seed, caves),
            scatterer: FeatureScatterer::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.synthesizer.seed()
    }

    pub fn synthesizer(&self) -> &ChunkSynthesizer {
        &self.synthesizer
    }

    /// Generate a chunk governed entirely by `biome`.
    pub fn generate_chunk(&self, pos: ChunkPos, biome: &BiomeDefinition) -> GeneratedChunk {
        let chunk = self.synthesizer.synthesize(pos, biome);
        self.finish(chunk, biome, 0)
    }

    /// Generate a chunk using whatever `selection` describes.
    pub fn generate(&self, pos: ChunkPos, selection: &BiomeSelection) -> GeneratedChunk {
        match selection {
            BiomeSelection::Single(biome) => self.generate_chunk(pos, biome),
            BiomeSelection::Blended {
                source,
                fallback,
                radius,
            } => {
                let blended =
                    self.synthesizer
                        .synthesize_blended(pos, source.as_ref(), fallback, *radius);
                let dominant = Arc::clone(blended.dominant());
                self.finish(blended.chunk, &dominant, blended.blended_columns)
            }
        }
    }

    fn finish(
        &self,
        chunk: SynthesizedChunk,
        biome: &BiomeDefinition,
        blended_columns: usize,
    ) -> GeneratedChunk {
        let SynthesizedChunk {
            pos,
            mut data,
            heights,
        } = chunk;

        let carved = if biome.features.structures.caves {
            self.caves.carve(&mut data, pos, &heights, biome)
        } else {
            0
        };

        let placement = self
            .scatterer
            .populate(pos, biome, &heights, self.seed(), &data);
        let placed = placement.apply(&mut data);

        debug!(
            "Generated chunk ({}, {}) as '{}': {carved} carved, {placed} placed",
            pos.x, pos.z, biome.key
        );

        GeneratedChunk {
            pos,
            data,
            heights,
            biome: biome.key.clone(),
            carved,
            placed,
            features: placement.stats,
            blended_columns,
        }
    }
}
