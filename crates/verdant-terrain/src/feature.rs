//! Deterministic feature placement: trees, vegetation, ore veins, and surface
//! decorations.
//!
//! [`FeatureScatterer::populate`] reads a synthesized chunk and returns the
//! blocks to write as a [`FeaturePlacement`]. It never mutates the chunk, so
//! the caller decides whether and when to apply the result. Passes run in a
//! fixed order against an overlay of their own earlier placements; a later
//! pass may overwrite an earlier one at the same cell (last write wins).

use hashbrown::HashMap;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::trace;
use verdant_biome::{BiomeDefinition, OreVein, TreeEntry, TreeType};
use verdant_voxel::{BlockSink, BlockView, CHUNK_WIDTH, ChunkPos, Material};

use crate::height_model::ChunkHeightMap;
use crate::seed::chunk_rng;
use crate::tree::TreeTemplate;

/// Tree trunks are kept off the outermost ring of columns.
const TREE_MARGIN: usize = 1;

/// Horizontal offset range of ore vein attempts (±2).
const VEIN_SPREAD_XZ: i32 = 2;
/// Vertical offset range of ore vein attempts (±1).
const VEIN_SPREAD_Y: i32 = 1;

/// A single block write in chunk-local coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub x: usize,
    pub y: i32,
    pub z: usize,
    pub material: Material,
}

/// Counters describing one populate call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FeatureStats {
    pub trees: u32,
    /// Trees skipped because their ground or trunk was obstructed.
    pub trees_obstructed: u32,
    pub plants: u32,
    pub vein_origins: u32,
    pub ore_attempts: u32,
    pub ores: u32,
    pub decorations: u32,
}

/// The ordered block writes produced for one chunk.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeaturePlacement {
    pub pos: ChunkPos,
    placements: Vec<Placement>,
    pub stats: FeatureStats,
}

impl FeaturePlacement {
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn into_vec(self) -> Vec<Placement> {
        self.placements
    }

    /// Writes every placement in order. Returns how many landed inside the
    /// sink's grid.
    pub fn apply<S: BlockSink + ?Sized>(&self, sink: &mut S) -> usize {
        self.placements
            .iter()
            .filter(|p| sink.set_block(p.x, p.y, p.z, p.material))
            .count()
    }
}

/// A read view of the chunk with pending placements layered on top.
struct Overlay<'a, V: ?Sized> {
    base: &'a V,
    pending: HashMap<(usize, i32, usize), Material>,
    placements: Vec<Placement>,
}

impl<'a, V: BlockView + ?Sized> Overlay<'a, V> {
    fn new(base: &'a V) -> Self {
        Self {
            base,
            pending: HashMap::new(),
            placements: Vec::new(),
        }
    }

    fn get(&self, x: usize, y: i32, z: usize) -> Material {
        self.pending
            .get(&(x, y, z))
            .copied()
            .unwrap_or_else(|| self.base.block(x, y, z))
    }

    fn put(&mut self, x: usize, y: i32, z: usize, material: Material) {
        self.pending.insert((x, y, z), material);
        self.placements.push(Placement { x, y, z, material });
    }
}

/// Chunk-local offset within `0..16`, or `None` if it falls outside.
fn local(base: usize, offset: i32) -> Option<usize> {
    let v = base as i32 + offset;
    (0..CHUNK_WIDTH as i32).contains(&v).then_some(v as usize)
}

/// Weighted pick over the tree table. A roll that survives every entry
/// (possible only with zero weights) falls back to the last entry.
pub fn pick_weighted<'a>(entries: &'a [TreeEntry], rng: &mut impl Rng) -> Option<&'a TreeEntry> {
    let last = entries.last()?;
    let total: u64 = entries.iter().map(|e| e.weight as u64).sum();
    if total == 0 {
        return Some(last);
    }
    let mut roll = rng.random_range(0..total) as i64;
    for entry in entries {
        roll -= entry.weight as i64;
        if roll < 0 {
            return Some(entry);
        }
    }
    Some(last)
}

/// A planned ore vein: its origin and the cells it will try to replace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VeinPlan {
    /// Chunk-local `(x, y, z)` of the origin.
    pub origin: (i32, i32, i32),
    /// One target per attempt, in chunk-local coordinates, Y clamped to the
    /// vein's height band. May fall outside the chunk horizontally.
    pub targets: Vec<(i32, i32, i32)>,
}

/// Roll a vein origin inside the chunk and the vein's height band, then one
/// offset per attempt.
pub fn plan_vein(vein: &OreVein, rng: &mut impl Rng) -> VeinPlan {
    let ox = rng.random_range(0..CHUNK_WIDTH as i32);
    let band = (vein.max_height - vein.min_height).max(1);
    let oy = rng.random_range(0..band) + vein.min_height;
    let oz = rng.random_range(0..CHUNK_WIDTH as i32);

    let targets = (0..vein.vein_size)
        .map(|_| {
            let dx = rng.random_range(-VEIN_SPREAD_XZ..=VEIN_SPREAD_XZ);
            let dy = rng.random_range(-VEIN_SPREAD_Y..=VEIN_SPREAD_Y);
            let dz = rng.random_range(-VEIN_SPREAD_XZ..=VEIN_SPREAD_XZ);
            let y = (oy + dy).max(vein.min_height).min(vein.max_height);
            (ox + dx, y, oz + dz)
        })
        .collect();

    VeinPlan {
        origin: (ox, oy, oz),
        targets,
    }
}

/// Places biome features into a synthesized chunk.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureScatterer;

impl FeatureScatterer {
    pub fn new() -> Self {
        Self
    }

    /// Compute the feature placements for chunk `pos`.
    ///
    /// `heights` must be the height map the chunk was synthesized from and
    /// `view` the chunk's current blocks. The result depends only on the
    /// arguments: equal inputs give equal placement lists.
    pub fn populate<V: BlockView + ?Sized>(
        &self,
        pos: ChunkPos,
        biome: &BiomeDefinition,
        heights: &ChunkHeightMap,
        seed: u64,
        view: &V,
    ) -> FeaturePlacement {
        let mut rng = chunk_rng(seed, pos);
        let mut overlay = Overlay::new(view);
        let mut stats = FeatureStats::default();

        self.place_trees(biome, heights, &mut rng, &mut overlay, &mut stats);
        self.place_vegetation(biome, heights, &mut rng, &mut overlay, &mut stats);
        self.place_ores(biome, &mut rng, &mut overlay, &mut stats);
        self.place_decorations(biome, heights, &mut rng, &mut overlay, &mut stats);

        trace!(
            "Populated chunk ({}, {}) with {} placements: {stats:?}",
            pos.x,
            pos.z,
            overlay.placements.len()
        );

        FeaturePlacement {
            pos,
            placements: overlay.placements,
            stats,
        }
    }

    fn place_trees<V: BlockView + ?Sized>(
        &self,
        biome: &BiomeDefinition,
        heights: &ChunkHeightMap,
        rng: &mut ChaCha8Rng,
        overlay: &mut Overlay<'_, V>,
        stats: &mut FeatureStats,
    ) {
        let trees = &biome.features.trees;
        if !trees.enabled || rng.random::<f64>() >= trees.chance {
            return;
        }

        let count = rng.random_range(0..trees.max_per_chunk.max(1)) + 1;
        // One archetype per chunk.
        let tree = pick_weighted(&trees.types, rng)
            .map(|e| e.tree)
            .unwrap_or(TreeType::Oak);
        let template = TreeTemplate::for_type(tree);
        let interior = CHUNK_WIDTH - 2 * TREE_MARGIN;

        for _ in 0..count {
            let bx = rng.random_range(0..interior) + TREE_MARGIN;
            let bz = rng.random_range(0..interior) + TREE_MARGIN;
            let ground = heights.get(bx, bz);
            let trunk = rng.random_range(template.trunk_min..=template.trunk_max);

            if grow_tree(&template, trunk, bx, ground, bz, overlay) {
                stats.trees += 1;
            } else {
                stats.trees_obstructed += 1;
            }
        }
    }

    fn place_vegetation<V: BlockView + ?Sized>(
        &self,
        biome: &BiomeDefinition,
        heights: &ChunkHeightMap,
        rng: &mut ChaCha8Rng,
        overlay: &mut Overlay<'_, V>,
        stats: &mut FeatureStats,
    ) {
        let vegetation = &biome.features.vegetation;
        if !vegetation.enabled {
            return;
        }

        for plant in &vegetation.plants {
            let count = rng.random_range(0..plant.max_per_chunk.max(1)) + 1;
            for _ in 0..count {
                if rng.random::<f64>() >= plant.chance {
                    continue;
                }
                let bx = rng.random_range(0..CHUNK_WIDTH);
                let bz = rng.random_range(0..CHUNK_WIDTH);
                let ground = heights.get(bx, bz);
                if overlay.get(bx, ground + 1, bz).is_air() && overlay.get(bx, ground, bz).is_solid()
                {
                    overlay.put(bx, ground + 1, bz, plant.block);
                    stats.plants += 1;
                }
            }
        }
    }

    fn place_ores<V: BlockView + ?Sized>(
        &self,
        biome: &BiomeDefinition,
        rng: &mut ChaCha8Rng,
        overlay: &mut Overlay<'_, V>,
        stats: &mut FeatureStats,
    ) {
        let ores = &biome.features.ores;
        if !ores.enabled {
            return;
        }

        for vein in &ores.veins {
            if rng.random::<f64>() >= vein.chance {
                continue;
            }
            let plan = plan_vein(vein, rng);
            stats.vein_origins += 1;

            for (tx, ty, tz) in plan.targets {
                stats.ore_attempts += 1;
                let (Some(x), Some(z)) = (local(0, tx), local(0, tz)) else {
                    continue;
                };
                if overlay.get(x, ty, z).is_deep_stone() {
                    overlay.put(x, ty, z, vein.block);
                    stats.ores += 1;
                }
            }
        }
    }

    fn place_decorations<V: BlockView + ?Sized>(
        &self,
        biome: &BiomeDefinition,
        heights: &ChunkHeightMap,
        rng: &mut ChaCha8Rng,
        overlay: &mut Overlay<'_, V>,
        stats: &mut FeatureStats,
    ) {
        let blocks = &biome.blocks;
        for deco in &blocks.surface_decorations {
            if rng.random::<f64>() >= deco.chance {
                continue;
            }
            let bx = rng.random_range(0..CHUNK_WIDTH);
            let bz = rng.random_range(0..CHUNK_WIDTH);
            let y = heights.get(bx, bz);
            if overlay.get(bx, y, bz) == blocks.surface {
                overlay.put(bx, y, bz, deco.block);
                stats.decorations += 1;
            }
        }
    }
}

/// Places one tree standing on `(bx, ground, bz)`.
///
/// Returns `false` without writing anything when the ground is not solid or
/// a trunk cell is occupied. Leaves fill only empty cells; cells outside the
/// chunk are clipped.
fn grow_tree<V: BlockView + ?Sized>(
    template: &TreeTemplate,
    trunk: i32,
    bx: usize,
    ground: i32,
    bz: usize,
    overlay: &mut Overlay<'_, V>,
) -> bool {
    if !overlay.get(bx, ground, bz).is_solid() {
        return false;
    }
    if (1..=trunk).any(|dy| !overlay.get(bx, ground + dy, bz).is_air()) {
        return false;
    }

    for cell in template.cells(trunk) {
        let (Some(x), Some(z)) = (local(bx, cell.dx), local(bz, cell.dz)) else {
            continue;
        };
        let y = ground + cell.dy;
        if cell.material == template.log || overlay.get(x, y, z).is_air() {
            overlay.put(x, y, z, cell.material);
        }
    }
    true
}
