//! Biome border blending.
//!
//! Near a border between two biomes the column height is interpolated and
//! each palette cell is chosen by a random roll weighted toward the nearer
//! biome, producing a dithered transition instead of a hard edge. Both sides
//! of a border reach an even split at the border line, so heights meet
//! without a step.

use std::sync::Arc;

use rand::Rng;
use verdant_biome::{BiomeDefinition, Layer};
use verdant_voxel::{CHUNK_WIDTH, ChunkPos, Material};

use crate::height_model::ChunkHeightMap;
use crate::seed::column_rng;
use crate::synth::{ChunkSynthesizer, SynthesizedChunk};

/// Default distance in blocks over which two biomes are blended.
pub const DEFAULT_BLEND_RADIUS: f64 = 8.0;

/// Largest radius the border search honours. Larger radii are clamped.
pub const MAX_BLEND_RADIUS: f64 = 64.0;

/// Transition weight of the primary biome at `distance` from the border.
///
/// 0 at the border, 1 at or beyond `blend_radius`, smoothstep between.
pub fn weight(distance: f64, blend_radius: f64) -> f64 {
    if distance >= blend_radius {
        return 1.0;
    }
    if distance <= 0.0 {
        return 0.0;
    }
    let t = distance / blend_radius;
    t * t * (3.0 - 2.0 * t)
}

/// Pick `a`'s material for `layer` with probability `weight`, otherwise `b`'s.
pub fn blend_block(
    a: &BiomeDefinition,
    b: &BiomeDefinition,
    weight: f64,
    roll: f64,
    layer: Layer,
) -> Material {
    if roll < weight {
        a.blocks.layer(layer)
    } else {
        b.blocks.layer(layer)
    }
}

/// Linear interpolation from `b` (weight 0) to `a` (weight 1), truncated
/// toward zero.
pub fn blend_height(a: i32, b: i32, weight: f64) -> i32 {
    (a as f64 * weight + b as f64 * (1.0 - weight)) as i32
}

/// Share of the primary biome for a column `distance` blocks from the border.
///
/// 0.5 on the border line, rising with [`weight`] to 1 at `blend_radius`.
/// The neighbouring biome gets the complement, so the columns either side of
/// a border mirror each other.
pub fn primary_share(distance: f64, blend_radius: f64) -> f64 {
    0.5 + 0.5 * weight(distance, blend_radius)
}

/// Answers which biome governs a world column.
pub trait BiomeSource {
    /// The biome at world column `(x, z)`, or `None` if unclaimed.
    fn biome_at(&self, x: i32, z: i32) -> Option<Arc<BiomeDefinition>>;
}

/// Every column belongs to one biome.
impl BiomeSource for Arc<BiomeDefinition> {
    fn biome_at(&self, _x: i32, _z: i32) -> Option<Arc<BiomeDefinition>> {
        Some(Arc::clone(self))
    }
}

impl<F> BiomeSource for F
where
    F: Fn(i32, i32) -> Option<Arc<BiomeDefinition>>,
{
    fn biome_at(&self, x: i32, z: i32) -> Option<Arc<BiomeDefinition>> {
        self(x, z)
    }
}

/// The nearest column whose biome differs from `primary`, found by scanning
/// square rings outward. Returns the other biome and the distance from the
/// column centre to the border line, which lies half a block short of the
/// differing column. Only borders closer than `radius` count.
///
/// A non-finite or non-positive radius finds nothing; radii above
/// [`MAX_BLEND_RADIUS`] are clamped.
pub fn nearest_border<S: BiomeSource + ?Sized>(
    source: &S,
    fallback: &Arc<BiomeDefinition>,
    primary: &BiomeDefinition,
    x: i32,
    z: i32,
    radius: f64,
) -> Option<(Arc<BiomeDefinition>, f64)> {
    if !radius.is_finite() || radius <= 0.0 {
        return None;
    }
    let radius = radius.min(MAX_BLEND_RADIUS);
    let max_ring = (radius + 0.5).ceil() as i32;
    let mut best: Option<(Arc<BiomeDefinition>, f64)> = None;
    for ring in 1..=max_ring {
        // Every cell of this ring is at least `ring - 0.5` from its border.
        if best.as_ref().is_some_and(|(_, bd)| *bd <= ring as f64 - 0.5) {
            break;
        }
        for dz in -ring..=ring {
            for dx in -ring..=ring {
                if dx.abs() != ring && dz.abs() != ring {
                    continue;
                }
                let d = ((dx * dx + dz * dz) as f64).sqrt() - 0.5;
                if d >= radius || best.as_ref().is_some_and(|(_, bd)| d >= *bd) {
                    continue;
                }
                let other = source
                    .biome_at(x + dx, z + dz)
                    .unwrap_or_else(|| Arc::clone(fallback));
                if other.key != primary.key {
                    best = Some((other, d));
                }
            }
        }
    }
    best
}

/// A chunk synthesized from a biome source, with the primary biome of every
/// column.
#[derive(Clone, Debug)]
pub struct BlendedChunk {
    pub chunk: SynthesizedChunk,
    /// Primary biome per column, indexed `[z * 16 + x]`.
    pub columns: Vec<Arc<BiomeDefinition>>,
    /// Columns that were blended with a neighbouring biome.
    pub blended_columns: usize,
}

impl BlendedChunk {
    pub fn biome_at(&self, x: usize, z: usize) -> &Arc<BiomeDefinition> {
        &self.columns[z * CHUNK_WIDTH + x]
    }

    /// The biome whose features, caves and structures apply to the chunk:
    /// the primary biome of the centre column.
    pub fn dominant(&self) -> &Arc<BiomeDefinition> {
        self.biome_at(CHUNK_WIDTH / 2, CHUNK_WIDTH / 2)
    }
}

impl ChunkSynthesizer {
    /// Synthesize a chunk whose columns may belong to different biomes.
    ///
    /// Columns farther than `blend_radius` from any other biome use the
    /// single-biome path. Columns inside it take the interpolated height and
    /// per-cell dithered materials, weighted by [`primary_share`]. Unclaimed
    /// columns use `fallback`.
    pub fn synthesize_blended<S: BiomeSource + ?Sized>(
        &self,
        pos: ChunkPos,
        source: &S,
        fallback: &Arc<BiomeDefinition>,
        blend_radius: f64,
    ) -> BlendedChunk {
        let mut data = self.empty_chunk();
        let mut heights = ChunkHeightMap::flat(pos, 0);
        let mut columns = Vec::with_capacity(CHUNK_WIDTH * CHUNK_WIDTH);
        let mut blended_columns = 0;

        for lz in 0..CHUNK_WIDTH {
            for lx in 0..CHUNK_WIDTH {
                let (x, z) = pos.world_column(lx, lz);
                let primary = source
                    .biome_at(x, z)
                    .unwrap_or_else(|| Arc::clone(fallback));
                let height_a = self.model().height(x, z, &primary);

                match nearest_border(source, fallback, &primary, x, z, blend_radius) {
                    None => {
                        heights.set(lx, lz, height_a);
                        self.materializer()
                            .fill(&mut data, (lx, lz), height_a, &primary);
                    }
                    Some((other, distance)) => {
                        let w = primary_share(distance, blend_radius);
                        let height_b = self.model().height(x, z, &other);
                        let surface = blend_height(height_a, height_b, w);
                        heights.set(lx, lz, surface);

                        let mut rng = column_rng(self.seed(), x, z);
                        self.materializer().fill_with(
                            &mut data,
                            (lx, lz),
                            surface,
                            &primary.blocks,
                            primary.terrain.shape,
                            |layer| blend_block(&primary, &other, w, rng.random::<f64>(), layer),
                        );
                        blended_columns += 1;
                    }
                }
                columns.push(primary);
            }
        }

        BlendedChunk {
            chunk: SynthesizedChunk { pos, data, heights },
            columns,
            blended_columns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use verdant_biome::TerrainShape;

    use crate::synth::TerrainParams;

    fn biome(name: &str, surface: Material, deep: Material) -> Arc<BiomeDefinition> {
        let mut b = BiomeDefinition::new(name);
        b.blocks.surface = surface;
        b.blocks.subsurface = surface;
        b.blocks.deep = deep;
        b.terrain.shape = TerrainShape::Flat;
        Arc::new(b)
    }

    #[test]
    fn test_weight_endpoints() {
        assert_eq!(weight(0.0, 8.0), 0.0);
        assert_eq!(weight(-3.0, 8.0), 0.0);
        assert_eq!(weight(8.0, 8.0), 1.0);
        assert_eq!(weight(100.0, 8.0), 1.0);
        assert!((weight(4.0, 8.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_blend_block_uses_roll() {
        let a = biome("a", Material::GrassBlock, Material::Stone);
        let b = biome("b", Material::Sand, Material::Sandstone);
        assert_eq!(blend_block(&a, &b, 0.7, 0.69, Layer::Surface), Material::GrassBlock);
        assert_eq!(blend_block(&a, &b, 0.7, 0.70, Layer::Surface), Material::Sand);
        assert_eq!(blend_block(&a, &b, 1.0, 0.99, Layer::Deep), Material::Stone);
        assert_eq!(blend_block(&a, &b, 0.0, 0.0, Layer::Deep), Material::Sandstone);
        // Unrecognized layer names map to the deep layer.
        assert_eq!(
            blend_block(&a, &b, 1.0, 0.5, Layer::from_name("core")),
            Material::Stone
        );
    }

    #[test]
    fn test_blend_height_truncates() {
        assert_eq!(blend_height(10, 20, 0.5), 15);
        assert_eq!(blend_height(10, 11, 0.5), 10);
        assert_eq!(blend_height(-10, -11, 0.5), -10);
    }

    #[test]
    fn test_nearest_border() {
        let west = biome("west", Material::GrassBlock, Material::Stone);
        let east = biome("east", Material::Sand, Material::Sandstone);
        let (w, e) = (Arc::clone(&west), Arc::clone(&east));
        let source = move |x: i32, _z: i32| Some(if x < 0 { Arc::clone(&w) } else { Arc::clone(&e) });

        let (other, d) = nearest_border(&source, &west, &east, 3, 0, 8.0).unwrap();
        assert_eq!(other.key, "west");
        assert_eq!(d, 3.5);
        let (_, d) = nearest_border(&source, &west, &east, 0, 0, 8.0).unwrap();
        assert_eq!(d, 0.5);
        assert!(nearest_border(&source, &west, &east, 8, 0, 8.0).is_none());
        assert!(nearest_border(&source, &west, &east, 20, 0, 8.0).is_none());
    }

    #[test]
    fn test_uniform_source_matches_single_biome_path() {
        let synth = ChunkSynthesizer::new(21, TerrainParams::default());
        let plains = biome("plains", Material::GrassBlock, Material::Stone);
        let pos = ChunkPos::new(5, 5);

        let blended = synth.synthesize_blended(pos, &plains, &plains, 8.0);
        let single = synth.synthesize(pos, &plains);
        assert_eq!(blended.chunk, single);
        assert_eq!(blended.blended_columns, 0);
        assert_eq!(blended.dominant().key, "plains");
    }

    #[test]
    fn test_border_columns_mix_materials() {
        let synth = ChunkSynthesizer::new(4, TerrainParams::default());
        let west = biome("west", Material::GrassBlock, Material::Stone);
        let east = biome("east", Material::Sand, Material::Sandstone);
        let (w, e) = (Arc::clone(&west), Arc::clone(&east));
        let source = move |x: i32, _z: i32| Some(if x < 8 { Arc::clone(&w) } else { Arc::clone(&e) });

        let pos = ChunkPos::new(0, 0);
        let a = synth.synthesize_blended(pos, &source, &west, 8.0);
        let b = synth.synthesize_blended(pos, &source, &west, 8.0);
        assert_eq!(a.chunk, b.chunk);
        // The border line at x = 7.5 is within the radius of every column.
        assert_eq!(a.blended_columns, 16 * 16);
        assert_eq!(a.biome_at(0, 0).key, "west");
        assert_eq!(a.biome_at(15, 0).key, "east");
        assert!(a.chunk.data.count(Material::Stone) > 0);
        assert!(a.chunk.data.count(Material::Sandstone) > 0);
    }

    #[test]
    fn test_nearest_border_degenerate_radius() {
        let west = biome("west", Material::GrassBlock, Material::Stone);
        let east = biome("east", Material::Sand, Material::Sandstone);
        let (w, e) = (Arc::clone(&west), Arc::clone(&east));
        let source = move |x: i32, _z: i32| Some(if x < 0 { Arc::clone(&w) } else { Arc::clone(&e) });

        for radius in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            assert!(nearest_border(&source, &west, &east, 0, 0, radius).is_none());
        }
        // Huge radii are clamped instead of scanning forever.
        let (_, d) = nearest_border(&source, &west, &east, 10, 0, 1e12).unwrap();
        assert_eq!(d, 10.5);
        assert!(nearest_border(&source, &west, &east, 100, 0, 1e12).is_none());
    }

    fn fixed_height(name: &str, surface: Material, height: i32) -> Arc<BiomeDefinition> {
        let mut b = BiomeDefinition::new(name);
        b.blocks.surface = surface;
        b.blocks.subsurface = surface;
        b.terrain.shape = TerrainShape::Flat;
        b.terrain.min_height = height;
        b.terrain.max_height = height;
        Arc::new(b)
    }

    #[test]
    fn test_border_height_profile_is_monotone() {
        let synth = ChunkSynthesizer::new(9, TerrainParams::default());
        let low = fixed_height("low", Material::GrassBlock, 70);
        let high = fixed_height("high", Material::Sand, 110);
        let (l, h) = (Arc::clone(&low), Arc::clone(&high));
        let source = move |x: i32, _z: i32| Some(if x < 8 { Arc::clone(&l) } else { Arc::clone(&h) });

        let chunk = synth.synthesize_blended(ChunkPos::new(0, 0), &source, &low, 8.0);
        for lz in 0..CHUNK_WIDTH {
            let row: Vec<i32> = (0..CHUNK_WIDTH)
                .map(|lx| chunk.chunk.heights.get(lx, lz))
                .collect();
            assert!(
                row.windows(2).all(|pair| pair[0] <= pair[1]),
                "row {lz} not monotone: {row:?}"
            );
            // The two columns beside the border mirror each other around 90.
            let step = row[8] - row[7];
            assert!((0..=2).contains(&step), "step {step} at the border in {row:?}");
            assert!(row[0] < 72 && row[15] > 108, "{row:?}");
        }
    }

    #[test]
    fn test_border_mirrors_across_sides() {
        let synth = ChunkSynthesizer::new(9, TerrainParams::default());
        let low = fixed_height("low", Material::GrassBlock, 70);
        let high = fixed_height("high", Material::Sand, 110);
        let (l, h) = (Arc::clone(&low), Arc::clone(&high));
        let source = move |x: i32, _z: i32| Some(if x < 8 { Arc::clone(&l) } else { Arc::clone(&h) });

        let chunk = synth.synthesize_blended(ChunkPos::new(0, 0), &source, &low, 8.0);
        for lx in 0..CHUNK_WIDTH / 2 {
            let west = chunk.chunk.heights.get(lx, 0) - 70;
            let east = 110 - chunk.chunk.heights.get(CHUNK_WIDTH - 1 - lx, 0);
            // Truncation toward zero can cost each side one block.
            assert!((west - east).abs() <= 1, "column {lx}: {west} vs {east}");
        }
    }

    #[test]
    fn test_unclaimed_columns_use_fallback() {
        let synth = ChunkSynthesizer::new(4, TerrainParams::default());
        let fallback = biome("void", Material::Gravel, Material::Stone);
        let source = |_x: i32, _z: i32| None;
        let chunk = synth.synthesize_blended(ChunkPos::new(0, 0), &source, &fallback, 8.0);
        assert_eq!(chunk.blended_columns, 0);
        assert!(chunk.columns.iter().all(|b| b.key == "void"));
    }

    proptest! {
        #[test]
        fn prop_weight_monotonic(a in -20.0..20.0f64, b in -20.0..20.0f64, r in 0.5..32.0f64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(weight(lo, r) <= weight(hi, r));
            prop_assert!((0.0..=1.0).contains(&weight(a, r)));
        }

        #[test]
        fn prop_weight_saturates(d in 0.0..100.0f64, r in 0.5..32.0f64) {
            prop_assert_eq!(weight(r + d, r), 1.0);
        }

        #[test]
        fn prop_primary_share_rises_from_half(a in 0.0..20.0f64, b in 0.0..20.0f64, r in 0.5..32.0f64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(primary_share(lo, r) <= primary_share(hi, r));
            prop_assert_eq!(primary_share(0.0, r), 0.5);
            prop_assert_eq!(primary_share(r, r), 1.0);
            prop_assert!((0.5..=1.0).contains(&primary_share(a, r)));
        }

        #[test]
        fn prop_blend_height_endpoints(a in any::<i32>(), b in any::<i32>()) {
            prop_assert_eq!(blend_height(a, b, 1.0), a);
            prop_assert_eq!(blend_height(a, b, 0.0), b);
        }
    }
}
