//! Vertical palette fill for a single column.

use verdant_biome::{BiomeDefinition, BlockPalette, Layer, TerrainShape};
use verdant_voxel::{BlockSink, BlockView, Material};

/// Number of subsurface cells between the deep layer and the surface.
pub const SUBSURFACE_DEPTH: i32 = 4;

/// Number of bedrock layers at the bottom of the world.
pub const BEDROCK_LAYERS: i32 = 2;

/// Fills one column of a chunk grid from a height value and a palette.
///
/// Only writes palette cells; decorations and cave carving are separate
/// passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnMaterializer {
    min_y: i32,
}

impl ColumnMaterializer {
    /// `min_y` is the lowest world Y, where the bedrock floor starts.
    pub fn new(min_y: i32) -> Self {
        Self { min_y }
    }

    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    /// Fill local column `(x, z)` with `biome`'s palette up to `surface_y`.
    pub fn fill<G>(
        &self,
        grid: &mut G,
        column: (usize, usize),
        surface_y: i32,
        biome: &BiomeDefinition,
    ) where
        G: BlockView + BlockSink,
    {
        let blocks = &biome.blocks;
        self.fill_with(grid, column, surface_y, blocks, biome.terrain.shape, |layer| {
            blocks.layer(layer)
        });
    }

    /// Fill local column `(x, z)`, asking `pick` for every surface, subsurface and
    /// deep cell. Bedrock, fluid and sea level come from `blocks`.
    pub fn fill_with<G, F>(
        &self,
        grid: &mut G,
        (x, z): (usize, usize),
        surface_y: i32,
        blocks: &BlockPalette,
        shape: TerrainShape,
        mut pick: F,
    ) where
        G: BlockView + BlockSink,
        F: FnMut(Layer) -> Material,
    {
        let floor = self.min_y + BEDROCK_LAYERS;
        for y in self.min_y..floor {
            grid.set_block(x, y, z, blocks.bedrock);
        }

        for y in floor..surface_y - SUBSURFACE_DEPTH {
            grid.set_block(x, y, z, pick(Layer::Deep));
        }

        for y in (surface_y - SUBSURFACE_DEPTH).max(floor)..surface_y {
            grid.set_block(x, y, z, pick(Layer::Subsurface));
        }

        if surface_y > blocks.sea_level {
            grid.set_block(x, surface_y, z, pick(Layer::Surface));
        } else {
            // Submerged: no exposed surface material.
            grid.set_block(x, surface_y, z, pick(Layer::Subsurface));
            for y in surface_y + 1..=blocks.sea_level {
                grid.set_block(x, y, z, blocks.fluid);
            }
        }

        if shape == TerrainShape::Ocean {
            for y in surface_y + 1..=blocks.sea_level {
                if grid.block(x, y, z).is_air() {
                    grid.set_block(x, y, z, blocks.fluid);
                }
            }
        }
    }
}
