//! Caller-owned biome registry.
//!
//! A registry is built once and then shared read-only. Reloading builds a new
//! registry and replaces the old one wholesale; definitions are never mutated
//! in place.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;
use tracing::{info, warn};

use crate::def::BiomeDefinition;
use crate::error::{BiomeLoadError, RegistryError};
use crate::loader;

/// Biome definitions keyed by their normalized key, in registration order.
#[derive(Debug, Clone, Default)]
pub struct BiomeRegistry {
    biomes: Vec<Arc<BiomeDefinition>>,
    by_key: HashMap<String, usize>,
}

impl BiomeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a definition under its key.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateKey`] if the key is already taken.
    pub fn register(
        &mut self,
        definition: BiomeDefinition,
    ) -> Result<Arc<BiomeDefinition>, RegistryError> {
        if self.by_key.contains_key(&definition.key) {
            return Err(RegistryError::DuplicateKey(definition.key));
        }
        let definition = Arc::new(definition);
        self.by_key.insert(definition.key.clone(), self.biomes.len());
        self.biomes.push(Arc::clone(&definition));
        Ok(definition)
    }

    /// Looks up a biome by key. Keys are normalized first, so display names
    /// also resolve.
    pub fn get(&self, key: &str) -> Option<&Arc<BiomeDefinition>> {
        let index = match self.by_key.get(key) {
            Some(&i) => i,
            None => *self.by_key.get(&crate::biome_key(key))?,
        };
        self.biomes.get(index)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.biomes.iter().map(|b| b.key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BiomeDefinition>> {
        self.biomes.iter()
    }

    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }

    /// Builds a registry from every `*.toml` file in `dir`, in file name
    /// order.
    ///
    /// Files that fail to load or collide with an earlier key are skipped
    /// and returned alongside the registry.
    ///
    /// # Errors
    ///
    /// [`BiomeLoadError::Io`] if the directory itself cannot be read.
    pub fn load_from_directory(dir: &Path) -> Result<(Self, Vec<LoadFailure>), BiomeLoadError> {
        let read_dir = std::fs::read_dir(dir).map_err(|source| BiomeLoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths: Vec<PathBuf> = read_dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "toml"))
            .collect();
        paths.sort();

        let mut registry = Self::new();
        let mut failures = Vec::new();
        for path in paths {
            let result = loader::load_file(&path).and_then(|def| {
                registry
                    .register(def)
                    .map(|_| ())
                    .map_err(BiomeLoadError::Duplicate)
            });
            if let Err(error) = result {
                warn!("Skipping biome file {}: {error}", path.display());
                failures.push(LoadFailure { path, error });
            }
        }

        info!(
            "Loaded {} biome(s) from {} ({} failed)",
            registry.len(),
            dir.display(),
            failures.len()
        );
        Ok((registry, failures))
    }
}

/// A definition file that was skipped while loading a directory.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: BiomeLoadError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TerrainShape;

    #[test]
    fn test_register_and_get() {
        let mut registry = BiomeRegistry::new();
        registry.register(BiomeDefinition::new("Magic Forest")).unwrap();
        registry.register(BiomeDefinition::new("desert")).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("magic_forest").is_some());
        assert!(registry.get("Magic Forest").is_some());
        assert!(registry.get("tundra").is_none());
        assert_eq!(
            registry.keys().collect::<Vec<_>>(),
            vec!["magic_forest", "desert"]
        );
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let mut registry = BiomeRegistry::new();
        registry.register(BiomeDefinition::new("Ice Plains")).unwrap();
        let err = registry
            .register(BiomeDefinition::new("ice plains"))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateKey("ice_plains".to_string()));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b_ocean.toml"),
            "name = \"Deep Ocean\"\n[terrain]\ntype = \"OCEAN\"\nmin-height = 20\nmax-height = 60\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("a_plains.toml"), "name = \"Plains\"\n").unwrap();
        std::fs::write(
            dir.path().join("c_broken.toml"),
            "[terrain]\nmin-height = 90\nmax-height = 10\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("d_dupe.toml"), "name = \"plains\"\n").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a biome").unwrap();

        let (registry, failures) = BiomeRegistry::load_from_directory(dir.path()).unwrap();
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec!["plains", "deep_ocean"]);
        assert_eq!(
            registry.get("deep_ocean").unwrap().terrain.shape,
            TerrainShape::Ocean
        );
        assert_eq!(failures.len(), 2);
        assert!(matches!(failures[0].error, BiomeLoadError::Validation(_)));
        assert!(matches!(failures[1].error, BiomeLoadError::Duplicate(_)));
    }

    #[test]
    fn test_load_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = BiomeRegistry::load_from_directory(&dir.path().join("missing"));
        assert!(matches!(result, Err(BiomeLoadError::Io { .. })));
    }
}
