//! Point-in-biome resolution over overlapping claims.

use std::sync::Arc;

use verdant_biome::{BiomeDefinition, BiomeRegistry};

use crate::bounds::BlockPos;
use crate::claim::BiomeClaim;

/// Picks the authoritative claim at a point: the one with the smallest
/// volume. Among equal volumes the first candidate wins.
///
/// Candidates are expected to be pre-filtered by the spatial service, so a
/// query costs O(k) in the number of overlapping claims.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegionResolver;

impl RegionResolver {
    pub fn new() -> Self {
        Self
    }

    /// The smallest claim containing `point`, if any.
    pub fn resolve_claim<'a, I>(&self, point: BlockPos, claims: I) -> Option<&'a BiomeClaim>
    where
        I: IntoIterator<Item = &'a BiomeClaim>,
    {
        let mut best: Option<(&BiomeClaim, u128)> = None;
        for claim in claims {
            if !claim.bounds.contains(point) {
                continue;
            }
            let volume = claim.volume();
            if best.is_none_or(|(_, v)| volume < v) {
                best = Some((claim, volume));
            }
        }
        best.map(|(claim, _)| claim)
    }

    /// The biome of the smallest claim containing `point`. Claims naming a
    /// biome the registry no longer knows are ignored.
    pub fn resolve<'a, I>(
        &self,
        point: BlockPos,
        claims: I,
        registry: &BiomeRegistry,
    ) -> Option<Arc<BiomeDefinition>>
    where
        I: IntoIterator<Item = &'a BiomeClaim>,
    {
        let known = claims
            .into_iter()
            .filter(|c| registry.contains(&c.biome_key));
        let claim = self.resolve_claim(point, known)?;
        registry.get(&claim.biome_key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::Cuboid;

    fn claim(id: &str, biome: &str, min: (i32, i32, i32), max: (i32, i32, i32)) -> BiomeClaim {
        BiomeClaim::new(
            id,
            "world",
            Cuboid::new(
                BlockPos::new(min.0, min.1, min.2),
                BlockPos::new(max.0, max.1, max.2),
            ),
            biome,
            "test",
        )
    }

    fn registry() -> BiomeRegistry {
        let mut registry = BiomeRegistry::new();
        for name in ["forest", "desert", "swamp"] {
            registry.register(BiomeDefinition::new(name)).unwrap();
        }
        registry
    }

    #[test]
    fn test_smaller_claim_wins() {
        let big = claim("a", "forest", (0, 0, 0), (9, 9, 9));
        let small = claim("b", "desert", (4, 4, 4), (4, 13, 4));
        assert_eq!(big.volume(), 1000);
        assert_eq!(small.volume(), 10);

        let p = BlockPos::new(4, 5, 4);
        let resolver = RegionResolver::new();
        let biome = resolver.resolve(p, [&big, &small], &registry()).unwrap();
        assert_eq!(biome.key, "desert");
        // Order of candidates does not matter.
        let biome = resolver.resolve(p, [&small, &big], &registry()).unwrap();
        assert_eq!(biome.key, "desert");
    }

    #[test]
    fn test_no_claim_is_none() {
        let resolver = RegionResolver::new();
        assert!(resolver.resolve(BlockPos::new(0, 0, 0), [], &registry()).is_none());

        let far = claim("a", "forest", (100, 0, 100), (110, 10, 110));
        assert!(
            resolver
                .resolve(BlockPos::new(0, 0, 0), [&far], &registry())
                .is_none()
        );
    }

    #[test]
    fn test_equal_volume_first_wins() {
        let a = claim("a", "forest", (0, 0, 0), (1, 1, 1));
        let b = claim("b", "swamp", (1, 1, 1), (2, 2, 2));
        let p = BlockPos::new(1, 1, 1);
        let resolver = RegionResolver::new();
        assert_eq!(resolver.resolve_claim(p, [&a, &b]).unwrap().id, "a");
        assert_eq!(resolver.resolve_claim(p, [&b, &a]).unwrap().id, "b");
    }

    #[test]
    fn test_unknown_biome_falls_through() {
        let big = claim("a", "forest", (0, 0, 0), (9, 9, 9));
        let stale = claim("b", "tundra", (4, 4, 4), (5, 5, 5));
        let biome = RegionResolver::new()
            .resolve(BlockPos::new(4, 4, 4), [&big, &stale], &registry())
            .unwrap();
        assert_eq!(biome.key, "forest");
    }
}
