//! Caller-owned claim bookkeeping on top of a spatial region service.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tracing::{info, warn};
use verdant_biome::{BiomeDefinition, BiomeRegistry};
use verdant_terrain::BiomeSource;

use crate::bounds::{BlockPos, Cuboid};
use crate::claim::BiomeClaim;
use crate::error::ClaimError;
use crate::resolver::RegionResolver;
use crate::service::SpatialRegionService;

/// Default prefix of generated claim ids.
pub const DEFAULT_PREFIX: &str = "cb_";

/// Tracks which regions are biome claims.
///
/// The region geometry lives in the spatial service; this adds the biome,
/// claimant and timestamp for each claimed region. Claims are keyed by
/// `(world, id)` like the regions they describe, so the same id may be
/// claimed once per world.
#[derive(Debug)]
pub struct ClaimManager<S> {
    service: S,
    claims: DashMap<(String, String), BiomeClaim>,
    prefix: String,
    next_id: AtomicU64,
    resolver: RegionResolver,
}

impl<S: SpatialRegionService> ClaimManager<S> {
    pub fn new(service: S) -> Self {
        Self::with_prefix(service, DEFAULT_PREFIX)
    }

    pub fn with_prefix(service: S, prefix: impl Into<String>) -> Self {
        Self {
            service,
            claims: DashMap::new(),
            prefix: prefix.into(),
            next_id: AtomicU64::new(0),
            resolver: RegionResolver::new(),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(world: &str, id: &str) -> (String, String) {
        (world.to_string(), id.to_string())
    }

    fn insert(&self, claim: BiomeClaim) {
        self.claims.insert(Self::key(&claim.world, &claim.id), claim);
    }

    /// Claim `bounds` in `world` for `biome_key`, creating a new region with
    /// id `<prefix><key>_<n>`.
    ///
    /// # Errors
    ///
    /// [`ClaimError::UnknownBiome`] if the registry has no such biome.
    pub fn assign(
        &self,
        world: &str,
        bounds: Cuboid,
        biome_key: &str,
        claimant: &str,
        registry: &BiomeRegistry,
    ) -> Result<BiomeClaim, ClaimError> {
        let biome = registry
            .get(biome_key)
            .ok_or_else(|| ClaimError::UnknownBiome(biome_key.to_string()))?;

        // Skip ids already taken by regions created outside this manager.
        let handle = loop {
            let n = self.next_id.fetch_add(1, Ordering::Relaxed);
            let id = format!("{}{}_{n}", self.prefix, biome.key);
            match self.service.create_cuboid_region(world, &id, bounds) {
                Ok(handle) => break handle,
                Err(ClaimError::DuplicateRegion { .. }) => continue,
                Err(e) => return Err(e),
            }
        };

        let claim = BiomeClaim::new(handle.id, world, handle.bounds, &biome.key, claimant);
        self.insert(claim.clone());
        info!(
            "Assigned biome '{}' to region '{}' in '{world}'",
            claim.biome_key, claim.id
        );
        Ok(claim)
    }

    /// Claim a region that already exists in the spatial service.
    ///
    /// # Errors
    ///
    /// [`ClaimError::UnknownRegion`] if the region does not exist,
    /// [`ClaimError::UnknownBiome`] if the biome is not registered.
    pub fn register_existing(
        &self,
        world: &str,
        region_id: &str,
        biome_key: &str,
        claimant: &str,
        registry: &BiomeRegistry,
    ) -> Result<BiomeClaim, ClaimError> {
        let handle = self
            .service
            .region(world, region_id)
            .ok_or_else(|| ClaimError::UnknownRegion {
                world: world.to_string(),
                id: region_id.to_string(),
            })?;
        let biome = registry
            .get(biome_key)
            .ok_or_else(|| ClaimError::UnknownBiome(biome_key.to_string()))?;

        let claim = BiomeClaim::new(handle.id, world, handle.bounds, &biome.key, claimant);
        self.insert(claim.clone());
        info!(
            "Assigned biome '{}' to existing region '{region_id}' in '{world}'",
            claim.biome_key
        );
        Ok(claim)
    }

    /// Re-create previously saved claims, region included. Claims whose
    /// biome is no longer registered or whose region cannot be created are
    /// skipped. Returns how many were restored.
    pub fn restore(
        &self,
        claims: impl IntoIterator<Item = BiomeClaim>,
        registry: &BiomeRegistry,
    ) -> usize {
        let mut restored = 0;
        for claim in claims {
            if !registry.contains(&claim.biome_key) {
                warn!(
                    "Skipping claim '{}': unknown biome '{}'",
                    claim.id, claim.biome_key
                );
                continue;
            }
            if let Err(e) = self
                .service
                .create_cuboid_region(&claim.world, &claim.id, claim.bounds)
            {
                warn!("Skipping claim '{}': {e}", claim.id);
                continue;
            }
            self.insert(claim);
            restored += 1;
        }
        info!("Loaded {restored} biome claim(s)");
        restored
    }

    /// Drop a claim. With `remove_region`, the backing region is removed
    /// from the spatial service too.
    pub fn remove(&self, world: &str, id: &str, remove_region: bool) -> Option<BiomeClaim> {
        let (_, claim) = self.claims.remove(&Self::key(world, id))?;
        if remove_region {
            self.service.remove_region(&claim.world, &claim.id);
        }
        info!("Removed biome claim '{id}' in '{world}'");
        Some(claim)
    }

    pub fn get(&self, world: &str, id: &str) -> Option<BiomeClaim> {
        self.claims
            .get(&Self::key(world, id))
            .map(|c| c.value().clone())
    }

    /// Every claim, sorted by world then id.
    pub fn all(&self) -> Vec<BiomeClaim> {
        let mut claims: Vec<_> = self.claims.iter().map(|c| c.value().clone()).collect();
        claims.sort_by(|a, b| (&a.world, &a.id).cmp(&(&b.world, &b.id)));
        claims
    }

    pub fn by_biome(&self, biome_key: &str) -> Vec<BiomeClaim> {
        let mut claims: Vec<_> = self
            .claims
            .iter()
            .filter(|c| c.biome_key == biome_key)
            .map(|c| c.value().clone())
            .collect();
        claims.sort_by(|a, b| (&a.world, &a.id).cmp(&(&b.world, &b.id)));
        claims
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// The claims covering `point`, in the order the service reports them.
    pub fn claims_at(&self, world: &str, point: BlockPos) -> Vec<BiomeClaim> {
        self.service
            .regions_containing(world, point)
            .into_iter()
            .filter_map(|region| self.get(world, &region.id))
            .collect()
    }

    /// The biome governing `point`: the smallest claim covering it.
    pub fn biome_at(
        &self,
        world: &str,
        point: BlockPos,
        registry: &BiomeRegistry,
    ) -> Option<Arc<BiomeDefinition>> {
        let claims = self.claims_at(world, point);
        self.resolver.resolve(point, &claims, registry)
    }
}

/// Column lookups against a claim manager, sampled at a fixed Y.
#[derive(Debug)]
pub struct ClaimBiomeSource<S> {
    manager: Arc<ClaimManager<S>>,
    registry: Arc<BiomeRegistry>,
    world: String,
    sample_y: i32,
}

impl<S> ClaimBiomeSource<S> {
    pub fn new(
        manager: Arc<ClaimManager<S>>,
        registry: Arc<BiomeRegistry>,
        world: impl Into<String>,
        sample_y: i32,
    ) -> Self {
        Self {
            manager,
            registry,
            world: world.into(),
            sample_y,
        }
    }
}

impl<S: SpatialRegionService> BiomeSource for ClaimBiomeSource<S> {
    fn biome_at(&self, x: i32, z: i32) -> Option<Arc<BiomeDefinition>> {
        self.manager.biome_at(
            &self.world,
            BlockPos::new(x, self.sample_y, z),
            &self.registry,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::InMemoryRegionIndex;

    fn registry() -> BiomeRegistry {
        let mut registry = BiomeRegistry::new();
        for name in ["Forest", "Desert", "Red Mesa"] {
            registry.register(BiomeDefinition::new(name)).unwrap();
        }
        registry
    }

    fn cuboid(a: (i32, i32, i32), b: (i32, i32, i32)) -> Cuboid {
        Cuboid::new(BlockPos::new(a.0, a.1, a.2), BlockPos::new(b.0, b.1, b.2))
    }

    #[test]
    fn test_assign_generates_prefixed_ids() {
        let registry = registry();
        let manager = ClaimManager::new(InMemoryRegionIndex::new());
        let a = manager
            .assign("world", cuboid((0, 0, 0), (9, 9, 9)), "forest", "ops", &registry)
            .unwrap();
        let b = manager
            .assign("world", cuboid((0, 0, 0), (9, 9, 9)), "Red Mesa", "ops", &registry)
            .unwrap();
        assert_eq!(a.id, "cb_forest_0");
        assert_eq!(b.id, "cb_red_mesa_1");
        assert_eq!(b.biome_key, "red_mesa");
        assert_eq!(manager.len(), 2);
        assert!(manager.service().region("world", "cb_forest_0").is_some());
    }

    #[test]
    fn test_assign_skips_taken_ids() {
        let registry = registry();
        let service = InMemoryRegionIndex::new();
        service
            .create_cuboid_region("world", "cb_desert_0", cuboid((0, 0, 0), (1, 1, 1)))
            .unwrap();
        let manager = ClaimManager::new(service);
        let claim = manager
            .assign("world", cuboid((5, 5, 5), (6, 6, 6)), "desert", "ops", &registry)
            .unwrap();
        assert_eq!(claim.id, "cb_desert_1");
    }

    #[test]
    fn test_assign_unknown_biome() {
        let manager = ClaimManager::new(InMemoryRegionIndex::new());
        let err = manager
            .assign("world", cuboid((0, 0, 0), (1, 1, 1)), "tundra", "ops", &registry())
            .unwrap_err();
        assert_eq!(err, ClaimError::UnknownBiome("tundra".into()));
        assert!(manager.is_empty());
        assert!(manager.service().is_empty());
    }

    #[test]
    fn test_register_existing() {
        let registry = registry();
        let service = InMemoryRegionIndex::new();
        service
            .create_cuboid_region("world", "spawn", cuboid((-8, 0, -8), (8, 64, 8)))
            .unwrap();
        let manager = ClaimManager::with_prefix(service, "biome_");

        let claim = manager
            .register_existing("world", "spawn", "desert", "ops", &registry)
            .unwrap();
        assert_eq!(claim.bounds, cuboid((-8, 0, -8), (8, 64, 8)));

        let err = manager
            .register_existing("world", "missing", "desert", "ops", &registry)
            .unwrap_err();
        assert!(matches!(err, ClaimError::UnknownRegion { .. }));
    }

    #[test]
    fn test_biome_at_prefers_smaller_claim() {
        let registry = registry();
        let manager = ClaimManager::new(InMemoryRegionIndex::new());
        manager
            .assign("world", cuboid((0, 0, 0), (99, 99, 99)), "forest", "ops", &registry)
            .unwrap();
        manager
            .assign("world", cuboid((10, 10, 10), (12, 12, 12)), "desert", "ops", &registry)
            .unwrap();

        let at = |x, y, z| {
            manager
                .biome_at("world", BlockPos::new(x, y, z), &registry)
                .map(|b| b.key.clone())
        };
        assert_eq!(at(11, 11, 11).as_deref(), Some("desert"));
        assert_eq!(at(50, 50, 50).as_deref(), Some("forest"));
        assert_eq!(at(500, 50, 50), None);
        assert_eq!(
            manager.biome_at("nether", BlockPos::new(11, 11, 11), &registry),
            None
        );
    }

    #[test]
    fn test_remove_and_queries() {
        let registry = registry();
        let manager = ClaimManager::new(InMemoryRegionIndex::new());
        let a = manager
            .assign("world", cuboid((0, 0, 0), (9, 9, 9)), "forest", "ops", &registry)
            .unwrap();
        manager
            .assign("world", cuboid((20, 0, 0), (29, 9, 9)), "forest", "ops", &registry)
            .unwrap();
        manager
            .assign("world", cuboid((40, 0, 0), (49, 9, 9)), "desert", "ops", &registry)
            .unwrap();

        assert_eq!(manager.by_biome("forest").len(), 2);
        assert_eq!(manager.all().len(), 3);
        assert_eq!(manager.get("world", &a.id), Some(a.clone()));
        assert_eq!(manager.get("nether", &a.id), None);

        // Keeping the region leaves the geometry but drops the biome.
        assert_eq!(manager.remove("world", &a.id, false), Some(a.clone()));
        assert!(manager.service().region("world", &a.id).is_some());
        assert!(
            manager
                .biome_at("world", BlockPos::new(1, 1, 1), &registry)
                .is_none()
        );
        assert!(manager.remove("world", &a.id, true).is_none());

        let b = manager.by_biome("desert").remove(0);
        manager.remove("world", &b.id, true);
        assert!(manager.service().region("world", &b.id).is_none());
    }

    #[test]
    fn test_restore_skips_unknown_biomes() {
        let registry = registry();
        let manager = ClaimManager::new(InMemoryRegionIndex::new());
        let saved = vec![
            BiomeClaim::new("cb_forest_7", "world", cuboid((0, 0, 0), (3, 3, 3)), "forest", "ops"),
            BiomeClaim::new("cb_tundra_1", "world", cuboid((0, 0, 0), (3, 3, 3)), "tundra", "ops"),
        ];
        assert_eq!(manager.restore(saved, &registry), 1);
        assert_eq!(
            manager
                .biome_at("world", BlockPos::new(2, 2, 2), &registry)
                .map(|b| b.key.clone())
                .as_deref(),
            Some("forest")
        );
    }

    #[test]
    fn test_same_id_in_two_worlds() {
        let registry = registry();
        let service = InMemoryRegionIndex::new();
        for world in ["world", "nether"] {
            service
                .create_cuboid_region(world, "spawn", cuboid((0, 0, 0), (9, 9, 9)))
                .unwrap();
        }
        let manager = ClaimManager::new(service);
        manager
            .register_existing("world", "spawn", "forest", "ops", &registry)
            .unwrap();
        manager
            .register_existing("nether", "spawn", "desert", "ops", &registry)
            .unwrap();

        assert_eq!(manager.len(), 2);
        let key_at = |world| {
            manager
                .biome_at(world, BlockPos::new(1, 1, 1), &registry)
                .map(|b| b.key.clone())
        };
        assert_eq!(key_at("world").as_deref(), Some("forest"));
        assert_eq!(key_at("nether").as_deref(), Some("desert"));

        let worlds: Vec<_> = manager.all().into_iter().map(|c| c.world).collect();
        assert_eq!(worlds, ["nether", "world"]);

        manager.remove("nether", "spawn", true);
        assert_eq!(key_at("world").as_deref(), Some("forest"));
        assert!(key_at("nether").is_none());
    }

    #[test]
    fn test_restore_same_id_in_two_worlds() {
        let registry = registry();
        let manager = ClaimManager::new(InMemoryRegionIndex::new());
        let saved = vec![
            BiomeClaim::new("cb_forest_0", "world", cuboid((0, 0, 0), (3, 3, 3)), "forest", "ops"),
            BiomeClaim::new("cb_forest_0", "nether", cuboid((0, 0, 0), (3, 3, 3)), "forest", "ops"),
        ];
        assert_eq!(manager.restore(saved, &registry), 2);
        assert_eq!(manager.len(), 2);
        assert!(manager.get("world", "cb_forest_0").is_some());
        assert!(manager.get("nether", "cb_forest_0").is_some());
    }

    #[test]
    fn test_claim_source_samples_at_fixed_y() {
        let registry = Arc::new(registry());
        let manager = Arc::new(ClaimManager::new(InMemoryRegionIndex::new()));
        manager
            .assign("world", cuboid((0, 60, 0), (15, 70, 15)), "desert", "ops", &registry)
            .unwrap();

        let high = ClaimBiomeSource::new(Arc::clone(&manager), Arc::clone(&registry), "world", 64);
        let low = ClaimBiomeSource::new(Arc::clone(&manager), Arc::clone(&registry), "world", 0);
        assert_eq!(high.biome_at(3, 3).map(|b| b.key.clone()).as_deref(), Some("desert"));
        assert!(low.biome_at(3, 3).is_none());
        assert!(high.biome_at(16, 3).is_none());
    }
}
