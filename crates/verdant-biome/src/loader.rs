//! TOML biome definition loader.
//!
//! Definition files use kebab-case keys:
//!
//! ```toml
//! name = "Magic Forest"
//! display-name = "Magic Forest"
//!
//! [terrain]
//! type = "HILLS"
//! min-height = 60
//! max-height = 120
//!
//! [blocks]
//! surface = "grass_block"
//! sea-level = 62
//!
//! [[features.trees.types]]
//! type = "birch"
//! weight = 3
//! ```
//!
//! Missing or wrong-typed fields take their documented defaults and unknown
//! tokens degrade to a safe default. Every substitution is collected and
//! logged once per file. Invariant violations are not repaired: they reject
//! the file with a [`ValidationError`](crate::ValidationError).

use std::path::Path;
use std::str::FromStr;

use toml::{Table, Value};
use tracing::warn;
use verdant_voxel::Material;

use crate::def::{
    BiomeDefinition, BlockPalette, FeatureSettings, OreSettings, OreVein, PlantEntry,
    StructureSettings, SurfaceDecoration, TerrainSettings, TerrainShape, TreeEntry, TreeSettings,
    TreeType, VegetationSettings, biome_key,
};
use crate::error::BiomeLoadError;

const DEFAULT_PLANT_MAX: u32 = 16;
const DEFAULT_PLANT_CHANCE: f64 = 0.0;
const DEFAULT_VEIN_MIN: i32 = 0;
const DEFAULT_VEIN_MAX: i32 = 128;
const DEFAULT_VEIN_SIZE: u32 = 8;
const DEFAULT_VEIN_CHANCE: f64 = 0.5;
const DEFAULT_DECORATION_CHANCE: f64 = 0.0;
const DEFAULT_TREE_WEIGHT: u32 = 1;

/// A successfully loaded definition together with the defaults that were
/// substituted while reading it.
#[derive(Debug, Clone)]
pub struct LoadedBiome {
    pub definition: BiomeDefinition,
    /// One entry per substituted field or dropped list entry.
    pub warnings: Vec<String>,
}

/// Parses a definition document. `fallback_name` is used when the document
/// has no `name`.
///
/// # Errors
///
/// [`BiomeLoadError::Syntax`] for malformed TOML and
/// [`BiomeLoadError::Validation`] when the result violates an invariant.
pub fn parse_str(source: &str, fallback_name: &str) -> Result<LoadedBiome, BiomeLoadError> {
    let table = Table::from_str(source).map_err(BiomeLoadError::Syntax)?;
    let mut reader = FieldReader::default();
    let definition = reader.definition(&table, fallback_name);
    definition.validate()?;
    Ok(LoadedBiome {
        definition,
        warnings: reader.warnings,
    })
}

/// Loads a definition file. The file stem is the fallback name. Substituted
/// defaults are logged in a single warning.
///
/// # Errors
///
/// [`BiomeLoadError::Io`] if the file cannot be read, otherwise as
/// [`parse_str`].
pub fn load_file(path: &Path) -> Result<BiomeDefinition, BiomeLoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| BiomeLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let loaded = parse_str(&source, &stem)?;
    if !loaded.warnings.is_empty() {
        warn!(
            "{}: substituted defaults ({})",
            path.display(),
            loaded.warnings.join("; ")
        );
    }
    Ok(loaded.definition)
}

/// Reads typed fields out of TOML tables, recording each fallback.
#[derive(Default)]
struct FieldReader {
    warnings: Vec<String>,
}

impl FieldReader {
    fn note(&mut self, message: String) {
        self.warnings.push(message);
    }

    fn section<'a>(&mut self, table: &'a Table, key: &str, path: &str) -> Option<&'a Table> {
        match table.get(key) {
            None => None,
            Some(Value::Table(t)) => Some(t),
            Some(_) => {
                self.note(format!("{path} is not a table"));
                None
            }
        }
    }

    fn string(&mut self, table: &Table, key: &str, path: &str) -> Option<String> {
        match table.get(key) {
            None => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.note(format!("{path} is not a string"));
                None
            }
        }
    }

    fn bool(&mut self, table: Option<&Table>, key: &str, path: &str, default: bool) -> bool {
        match table.and_then(|t| t.get(key)) {
            None => default,
            Some(Value::Boolean(b)) => *b,
            Some(_) => {
                self.note(format!("{path} is not a boolean, using {default}"));
                default
            }
        }
    }

    fn int(&mut self, table: Option<&Table>, key: &str, path: &str, default: i32) -> i32 {
        match table.and_then(|t| t.get(key)) {
            None => default,
            Some(Value::Integer(i)) => match i32::try_from(*i) {
                Ok(v) => v,
                Err(_) => {
                    self.note(format!("{path} = {i} is out of range, using {default}"));
                    default
                }
            },
            Some(_) => {
                self.note(format!("{path} is not an integer, using {default}"));
                default
            }
        }
    }

    fn count(&mut self, table: Option<&Table>, key: &str, path: &str, default: u32) -> u32 {
        match table.and_then(|t| t.get(key)) {
            None => default,
            Some(Value::Integer(i)) => match u32::try_from(*i) {
                Ok(v) => v,
                Err(_) => {
                    self.note(format!("{path} = {i} is not a valid count, using {default}"));
                    default
                }
            },
            Some(_) => {
                self.note(format!("{path} is not an integer, using {default}"));
                default
            }
        }
    }

    /// Integers are accepted where reals are expected.
    fn real(&mut self, table: Option<&Table>, key: &str, path: &str, default: f64) -> f64 {
        match table.and_then(|t| t.get(key)) {
            None => default,
            Some(Value::Float(f)) => *f,
            Some(Value::Integer(i)) => *i as f64,
            Some(_) => {
                self.note(format!("{path} is not a number, using {default}"));
                default
            }
        }
    }

    /// A token field that falls back to `default` when absent or unknown.
    fn token<T>(&mut self, table: Option<&Table>, key: &str, path: &str, default: T) -> T
    where
        T: FromStr + Copy + std::fmt::Display,
        T::Err: std::fmt::Display,
    {
        let Some(table) = table else {
            return default;
        };
        match self.string(table, key, path) {
            None => default,
            Some(raw) => match raw.parse::<T>() {
                Ok(v) => v,
                Err(e) => {
                    self.note(format!("{path}: {e}, using {default}"));
                    default
                }
            },
        }
    }

    /// Table entries of an array. Non-table entries are dropped.
    fn entries<'a>(&mut self, table: Option<&'a Table>, key: &str, path: &str) -> Vec<&'a Table> {
        match table.and_then(|t| t.get(key)) {
            None => Vec::new(),
            Some(Value::Array(items)) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    match item {
                        Value::Table(t) => out.push(t),
                        _ => self.note(format!("{path}[{i}] is not a table, dropped")),
                    }
                }
                out
            }
            Some(_) => {
                self.note(format!("{path} is not an array"));
                Vec::new()
            }
        }
    }

    /// A required token inside a list entry. `None` drops the entry.
    fn entry_token<T>(&mut self, entry: &Table, key: &str, path: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.string(entry, key, path)?;
        match raw.parse::<T>() {
            Ok(v) => Some(v),
            Err(e) => {
                self.note(format!("{path}: {e}, entry dropped"));
                None
            }
        }
    }

    fn definition(&mut self, root: &Table, fallback_name: &str) -> BiomeDefinition {
        let name = self
            .string(root, "name", "name")
            .unwrap_or_else(|| fallback_name.to_string());
        let display_name = self
            .string(root, "display-name", "display-name")
            .unwrap_or_else(|| name.clone());
        let description = self
            .string(root, "description", "description")
            .unwrap_or_default();
        let icon = self.token(Some(root), "icon", "icon", Material::GrassBlock);

        let terrain = self.section_of(root, "terrain");
        let blocks = self.section_of(root, "blocks");
        let features = self.section_of(root, "features");

        BiomeDefinition {
            key: biome_key(&name),
            name,
            display_name,
            description,
            icon,
            terrain: self.terrain(terrain),
            blocks: self.blocks(blocks),
            features: self.features(features),
        }
    }

    fn section_of<'a>(&mut self, root: &'a Table, key: &str) -> Option<&'a Table> {
        self.section(root, key, key)
    }

    fn terrain(&mut self, t: Option<&Table>) -> TerrainSettings {
        let d = TerrainSettings::default();
        TerrainSettings {
            shape: self.token(t, "type", "terrain.type", d.shape),
            min_height: self.int(t, "min-height", "terrain.min-height", d.min_height),
            max_height: self.int(t, "max-height", "terrain.max-height", d.max_height),
            noise_scale_multiplier: self.real(
                t,
                "noise-scale-multiplier",
                "terrain.noise-scale-multiplier",
                d.noise_scale_multiplier,
            ),
            height_multiplier: self.real(
                t,
                "height-multiplier",
                "terrain.height-multiplier",
                d.height_multiplier,
            ),
        }
    }

    fn blocks(&mut self, b: Option<&Table>) -> BlockPalette {
        let d = BlockPalette::default();
        let mut surface_decorations = Vec::new();
        for (i, entry) in self
            .entries(b, "surface-decorations", "blocks.surface-decorations")
            .into_iter()
            .enumerate()
        {
            let path = format!("blocks.surface-decorations[{i}]");
            let Some(block) = self.entry_token::<Material>(entry, "block", &path) else {
                continue;
            };
            let chance = self.real(
                Some(entry),
                "chance",
                &format!("{path}.chance"),
                DEFAULT_DECORATION_CHANCE,
            );
            surface_decorations.push(SurfaceDecoration { block, chance });
        }

        BlockPalette {
            surface: self.token(b, "surface", "blocks.surface", d.surface),
            subsurface: self.token(b, "subsurface", "blocks.subsurface", d.subsurface),
            deep: self.token(b, "deep", "blocks.deep", d.deep),
            bedrock: self.token(b, "bedrock-layer", "blocks.bedrock-layer", d.bedrock),
            fluid: self.token(b, "fluid", "blocks.fluid", d.fluid),
            sea_level: self.int(b, "sea-level", "blocks.sea-level", d.sea_level),
            surface_decorations,
        }
    }

    fn features(&mut self, f: Option<&Table>) -> FeatureSettings {
        let trees = f.and_then(|f| self.section(f, "trees", "features.trees"));
        let vegetation = f.and_then(|f| self.section(f, "vegetation", "features.vegetation"));
        let ores = f.and_then(|f| self.section(f, "ores", "features.ores"));
        let structures = f.and_then(|f| self.section(f, "structures", "features.structures"));

        FeatureSettings {
            trees: self.trees(trees),
            vegetation: self.vegetation(vegetation),
            ores: self.ores(ores),
            structures: self.structures(structures),
        }
    }

    fn trees(&mut self, t: Option<&Table>) -> TreeSettings {
        let d = TreeSettings::default();
        let mut types = Vec::new();
        for (i, entry) in self
            .entries(t, "types", "features.trees.types")
            .into_iter()
            .enumerate()
        {
            let path = format!("features.trees.types[{i}]");
            let Some(tree) = self.entry_token::<TreeType>(entry, "type", &path) else {
                continue;
            };
            let weight = self.count(
                Some(entry),
                "weight",
                &format!("{path}.weight"),
                DEFAULT_TREE_WEIGHT,
            );
            types.push(TreeEntry { tree, weight });
        }
        if types.is_empty() {
            types = d.types;
        }

        TreeSettings {
            enabled: self.bool(t, "enabled", "features.trees.enabled", d.enabled),
            types,
            max_per_chunk: self.count(
                t,
                "max-per-chunk",
                "features.trees.max-per-chunk",
                d.max_per_chunk,
            ),
            chance: self.real(t, "chance", "features.trees.chance", d.chance),
        }
    }

    fn vegetation(&mut self, v: Option<&Table>) -> VegetationSettings {
        let mut plants = Vec::new();
        for (i, entry) in self
            .entries(v, "plants", "features.vegetation.plants")
            .into_iter()
            .enumerate()
        {
            let path = format!("features.vegetation.plants[{i}]");
            let Some(block) = self.entry_token::<Material>(entry, "block", &path) else {
                continue;
            };
            plants.push(PlantEntry {
                block,
                chance: self.real(
                    Some(entry),
                    "chance",
                    &format!("{path}.chance"),
                    DEFAULT_PLANT_CHANCE,
                ),
                max_per_chunk: self.count(
                    Some(entry),
                    "max-per-chunk",
                    &format!("{path}.max-per-chunk"),
                    DEFAULT_PLANT_MAX,
                ),
            });
        }

        VegetationSettings {
            enabled: self.bool(v, "enabled", "features.vegetation.enabled", true),
            plants,
        }
    }

    fn ores(&mut self, o: Option<&Table>) -> OreSettings {
        let mut veins = Vec::new();
        for (i, entry) in self
            .entries(o, "veins", "features.ores.veins")
            .into_iter()
            .enumerate()
        {
            let path = format!("features.ores.veins[{i}]");
            let Some(block) = self.entry_token::<Material>(entry, "block", &path) else {
                continue;
            };
            let e = Some(entry);
            veins.push(OreVein {
                block,
                min_height: self.int(
                    e,
                    "min-height",
                    &format!("{path}.min-height"),
                    DEFAULT_VEIN_MIN,
                ),
                max_height: self.int(
                    e,
                    "max-height",
                    &format!("{path}.max-height"),
                    DEFAULT_VEIN_MAX,
                ),
                vein_size: self.count(
                    e,
                    "vein-size",
                    &format!("{path}.vein-size"),
                    DEFAULT_VEIN_SIZE,
                ),
                chance: self.real(e, "chance", &format!("{path}.chance"), DEFAULT_VEIN_CHANCE),
            });
        }

        OreSettings {
            enabled: self.bool(o, "enabled", "features.ores.enabled", true),
            veins,
        }
    }

    fn structures(&mut self, s: Option<&Table>) -> StructureSettings {
        let d = StructureSettings::default();
        StructureSettings {
            caves: self.bool(s, "caves", "features.structures.caves", d.caves),
            dungeons: self.bool(s, "dungeons", "features.structures.dungeons", d.dungeons),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    const MAGIC_FOREST: &str = r#"
name = "Magic Forest"
display-name = "Enchanted Woods"
description = "Tall birches and glowing flowers"
icon = "BIRCH_LOG"

[terrain]
type = "HILLS"
min-height = 62
max-height = 110
noise-scale-multiplier = 1.5
height-multiplier = 0.8

[blocks]
surface = "GRASS_BLOCK"
subsurface = "DIRT"
deep = "STONE"
bedrock-layer = "BEDROCK"
fluid = "WATER"
sea-level = 63

[[blocks.surface-decorations]]
block = "PODZOL"
chance = 0.2

[features.trees]
enabled = true
max-per-chunk = 6
chance = 0.8

[[features.trees.types]]
type = "BIRCH"
weight = 70

[[features.trees.types]]
type = "OAK"
weight = 30

[[features.vegetation.plants]]
block = "ALLIUM"
chance = 0.4
max-per-chunk = 5

[[features.ores.veins]]
block = "EMERALD_ORE"
min-height = 4
max-height = 32
vein-size = 3
chance = 0.25

[features.structures]
caves = false
"#;

    #[test]
    fn test_parse_full_document() {
        let loaded = parse_str(MAGIC_FOREST, "ignored").unwrap();
        assert!(loaded.warnings.is_empty(), "{:?}", loaded.warnings);
        let def = loaded.definition;

        assert_eq!(def.key, "magic_forest");
        assert_eq!(def.display_name, "Enchanted Woods");
        assert_eq!(def.icon, Material::BirchLog);
        assert_eq!(def.terrain.max_height, 110);
        assert_eq!(def.terrain.noise_scale_multiplier, 1.5);
        assert_eq!(def.blocks.sea_level, 63);
        assert_eq!(def.blocks.surface_decorations[0].block, Material::Podzol);
        assert_eq!(def.features.trees.types.len(), 2);
        assert_eq!(def.features.trees.types[0].tree, TreeType::Birch);
        assert_eq!(def.features.trees.types[0].weight, 70);
        assert_eq!(def.features.vegetation.plants[0].max_per_chunk, 5);
        assert_eq!(def.features.ores.veins[0].block, Material::EmeraldOre);
        assert!(!def.features.structures.caves);
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let loaded = parse_str("", "desert").unwrap();
        let def = loaded.definition;
        assert_eq!(def.name, "desert");
        assert_eq!(def.key, "desert");
        assert_eq!(def.terrain, TerrainSettings::default());
        assert_eq!(def.blocks, BlockPalette::default());
        assert_eq!(def.features.trees.types[0].tree, TreeType::Oak);
        assert_eq!(def.features.trees.types[0].weight, 100);
        assert!(def.features.structures.caves);
        assert!(!def.features.structures.dungeons);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_unknown_palette_token_falls_back() {
        let loaded = parse_str("[blocks]\nsurface = \"moon_dust\"\n", "x").unwrap();
        assert_eq!(loaded.definition.blocks.surface, Material::GrassBlock);
        assert_eq!(loaded.warnings.len(), 1);
        assert!(loaded.warnings[0].contains("moon_dust"));
    }

    #[test]
    fn test_unknown_list_entries_dropped() {
        let src = r#"
[[features.trees.types]]
type = "BAOBAB"

[[features.vegetation.plants]]
block = "NOT_A_FLOWER"

[[features.vegetation.plants]]
block = "POPPY"
"#;
        let loaded = parse_str(src, "x").unwrap();
        let def = loaded.definition;
        // empty tree list becomes the oak default
        assert_eq!(def.features.trees.types.len(), 1);
        assert_eq!(def.features.trees.types[0].tree, TreeType::Oak);
        assert_eq!(def.features.vegetation.plants.len(), 1);
        assert_eq!(def.features.vegetation.plants[0].block, Material::Poppy);
        assert_eq!(def.features.vegetation.plants[0].max_per_chunk, 16);
        assert_eq!(loaded.warnings.len(), 2);
    }

    #[test]
    fn test_decoration_without_chance_never_fires() {
        let src = r#"
[[blocks.surface-decorations]]
block = "COARSE_DIRT"
"#;
        let loaded = parse_str(src, "x").unwrap();
        let decorations = &loaded.definition.blocks.surface_decorations;
        assert_eq!(decorations.len(), 1);
        assert_eq!(decorations[0].block, Material::CoarseDirt);
        assert_eq!(decorations[0].chance, 0.0);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_wrong_type_falls_back() {
        let loaded = parse_str("[terrain]\nmin-height = \"low\"\n", "x").unwrap();
        assert_eq!(loaded.definition.terrain.min_height, 60);
        assert_eq!(loaded.warnings.len(), 1);
    }

    #[test]
    fn test_integer_accepted_for_real() {
        let loaded = parse_str("[terrain]\nheight-multiplier = 2\n", "x").unwrap();
        assert_eq!(loaded.definition.terrain.height_multiplier, 2.0);
    }

    #[test]
    fn test_inverted_heights_fail_fast() {
        let err = parse_str("[terrain]\nmin-height = 200\nmax-height = 100\n", "x").unwrap_err();
        assert!(matches!(
            err,
            BiomeLoadError::Validation(ValidationError::HeightBounds { min: 200, max: 100 })
        ));
    }

    #[test]
    fn test_defaulting_can_expose_invariant_violation() {
        // max-height defaults to 120, so a lone min-height above it is rejected.
        let err = parse_str("[terrain]\nmin-height = 150\n", "x").unwrap_err();
        assert!(matches!(err, BiomeLoadError::Validation(_)));
    }

    #[test]
    fn test_syntax_error() {
        let err = parse_str("name = ", "x").unwrap_err();
        assert!(matches!(err, BiomeLoadError::Syntax(_)));
    }

    #[test]
    fn test_load_file_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Frozen Peaks.toml");
        std::fs::write(&path, "[terrain]\ntype = \"mountains\"\n").unwrap();

        let def = load_file(&path).unwrap();
        assert_eq!(def.name, "Frozen Peaks");
        assert_eq!(def.key, "frozen_peaks");
        assert_eq!(def.terrain.shape, TerrainShape::Mountains);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_file(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, BiomeLoadError::Io { .. }));
    }
}
