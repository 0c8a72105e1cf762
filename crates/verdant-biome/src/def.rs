//! Biome definition: the immutable terrain and feature profile of one biome.

use std::fmt;
use std::str::FromStr;

use verdant_voxel::{Material, UnknownToken, normalize_token};

use crate::error::ValidationError;

/// Derives a biome's identity key: lowercase, spaces replaced by underscores.
pub fn biome_key(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Full descriptor for a biome. Shared read-only by every consumer.
#[derive(Clone, Debug, PartialEq)]
pub struct BiomeDefinition {
    /// Name as written in the definition file.
    pub name: String,
    /// Normalized identity key (see [`biome_key`]).
    pub key: String,
    /// Human-readable name.
    pub display_name: String,
    pub description: String,
    /// Material used to represent the biome in listings.
    pub icon: Material,
    pub terrain: TerrainSettings,
    pub blocks: BlockPalette,
    pub features: FeatureSettings,
}

impl BiomeDefinition {
    /// Creates a definition with every section at its default.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            key: biome_key(&name),
            display_name: name.clone(),
            name,
            description: String::new(),
            icon: Material::GrassBlock,
            terrain: TerrainSettings::default(),
            blocks: BlockPalette::default(),
            features: FeatureSettings::default(),
        }
    }

    /// Checks the invariants downstream generation relies on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let t = &self.terrain;
        if t.min_height > t.max_height {
            return Err(ValidationError::HeightBounds {
                min: t.min_height,
                max: t.max_height,
            });
        }
        positive("terrain.noise-scale-multiplier", t.noise_scale_multiplier)?;
        positive("terrain.height-multiplier", t.height_multiplier)?;

        for (i, deco) in self.blocks.surface_decorations.iter().enumerate() {
            probability(
                format!("blocks.surface-decorations[{i}].chance"),
                deco.chance,
            )?;
        }

        let f = &self.features;
        probability("features.trees.chance".to_string(), f.trees.chance)?;
        for (i, plant) in f.vegetation.plants.iter().enumerate() {
            probability(
                format!("features.vegetation.plants[{i}].chance"),
                plant.chance,
            )?;
        }
        for (i, vein) in f.ores.veins.iter().enumerate() {
            probability(format!("features.ores.veins[{i}].chance"), vein.chance)?;
            if vein.min_height > vein.max_height {
                return Err(ValidationError::OreBand {
                    block: vein.block,
                    min: vein.min_height,
                    max: vein.max_height,
                });
            }
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveMultiplier {
            field: field.to_string(),
            value,
        })
    }
}

fn probability(field: String, value: f64) -> Result<(), ValidationError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::ChanceOutOfRange { field, value })
    }
}

// ---------------------------------------------------------------------------
// Terrain
// ---------------------------------------------------------------------------

/// Terrain shape applied to normalized noise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TerrainShape {
    Flat,
    #[default]
    Hills,
    Mountains,
    Ocean,
    Plateau,
}

impl TerrainShape {
    pub const ALL: [TerrainShape; 5] = [
        TerrainShape::Flat,
        TerrainShape::Hills,
        TerrainShape::Mountains,
        TerrainShape::Ocean,
        TerrainShape::Plateau,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TerrainShape::Flat => "flat",
            TerrainShape::Hills => "hills",
            TerrainShape::Mountains => "mountains",
            TerrainShape::Ocean => "ocean",
            TerrainShape::Plateau => "plateau",
        }
    }
}

impl FromStr for TerrainShape {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = normalize_token(s);
        TerrainShape::ALL
            .into_iter()
            .find(|shape| shape.name() == token)
            .ok_or_else(|| UnknownToken::new("terrain type", s))
    }
}

impl fmt::Display for TerrainShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Terrain shape parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainSettings {
    pub shape: TerrainShape,
    /// Lowest surface Y. Invariant: `min_height <= max_height`.
    pub min_height: i32,
    /// Highest surface Y.
    pub max_height: i32,
    /// Scales the global noise frequency. Must be positive.
    pub noise_scale_multiplier: f64,
    /// Scales the global height range. Must be positive.
    pub height_multiplier: f64,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            shape: TerrainShape::Hills,
            min_height: 60,
            max_height: 120,
            noise_scale_multiplier: 1.0,
            height_multiplier: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Vertical palette layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Surface,
    Subsurface,
    Deep,
}

impl Layer {
    /// Maps a layer name to a layer. Anything unrecognized is [`Layer::Deep`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "surface" => Layer::Surface,
            "subsurface" => Layer::Subsurface,
            _ => Layer::Deep,
        }
    }
}

/// A surface block that may replace the biome's surface material.
#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceDecoration {
    pub block: Material,
    /// Independent spawn probability in `[0, 1]`.
    pub chance: f64,
}

/// Materials used to fill terrain columns.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockPalette {
    pub surface: Material,
    pub subsurface: Material,
    pub deep: Material,
    /// Floor layers at the bottom of the world.
    pub bedrock: Material,
    pub fluid: Material,
    /// Columns at or below this Y are submerged.
    pub sea_level: i32,
    /// Ordered decoration entries, each rolled independently.
    pub surface_decorations: Vec<SurfaceDecoration>,
}

impl BlockPalette {
    /// The material for a palette layer.
    pub fn layer(&self, layer: Layer) -> Material {
        match layer {
            Layer::Surface => self.surface,
            Layer::Subsurface => self.subsurface,
            Layer::Deep => self.deep,
        }
    }
}

impl Default for BlockPalette {
    fn default() -> Self {
        Self {
            surface: Material::GrassBlock,
            subsurface: Material::Dirt,
            deep: Material::Stone,
            bedrock: Material::Bedrock,
            fluid: Material::Water,
            sea_level: 62,
            surface_decorations: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// Tree archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeType {
    Oak,
    Birch,
    Spruce,
    Jungle,
    DarkOak,
    Acacia,
    Cherry,
    Azalea,
}

impl TreeType {
    pub const ALL: [TreeType; 8] = [
        TreeType::Oak,
        TreeType::Birch,
        TreeType::Spruce,
        TreeType::Jungle,
        TreeType::DarkOak,
        TreeType::Acacia,
        TreeType::Cherry,
        TreeType::Azalea,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TreeType::Oak => "oak",
            TreeType::Birch => "birch",
            TreeType::Spruce => "spruce",
            TreeType::Jungle => "jungle",
            TreeType::DarkOak => "dark_oak",
            TreeType::Acacia => "acacia",
            TreeType::Cherry => "cherry",
            TreeType::Azalea => "azalea",
        }
    }
}

impl FromStr for TreeType {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = normalize_token(s);
        TreeType::ALL
            .into_iter()
            .find(|tree| tree.name() == token)
            .ok_or_else(|| UnknownToken::new("tree type", s))
    }
}

impl fmt::Display for TreeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A tree type with its selection weight.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeEntry {
    pub tree: TreeType,
    pub weight: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TreeSettings {
    pub enabled: bool,
    pub types: Vec<TreeEntry>,
    pub max_per_chunk: u32,
    /// Probability that a chunk gets any trees.
    pub chance: f64,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            types: vec![TreeEntry {
                tree: TreeType::Oak,
                weight: 100,
            }],
            max_per_chunk: 4,
            chance: 0.5,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlantEntry {
    pub block: Material,
    /// Probability gating each placement attempt.
    pub chance: f64,
    pub max_per_chunk: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VegetationSettings {
    pub enabled: bool,
    pub plants: Vec<PlantEntry>,
}

impl Default for VegetationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            plants: Vec::new(),
        }
    }
}

/// An ore vein definition. Invariant: `min_height <= max_height`.
#[derive(Clone, Debug, PartialEq)]
pub struct OreVein {
    pub block: Material,
    pub min_height: i32,
    pub max_height: i32,
    /// Number of replacement attempts around the vein origin.
    pub vein_size: u32,
    /// Probability that a chunk gets this vein.
    pub chance: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct OreSettings {
    pub enabled: bool,
    pub veins: Vec<OreVein>,
}

impl Default for OreSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            veins: Vec::new(),
        }
    }
}

/// Structural generation flags.
#[derive(Clone, Debug, PartialEq)]
pub struct StructureSettings {
    /// Run the cave carving pass.
    pub caves: bool,
    pub dungeons: bool,
}

impl Default for StructureSettings {
    fn default() -> Self {
        Self {
            caves: true,
            dungeons: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FeatureSettings {
    pub trees: TreeSettings,
    pub vegetation: VegetationSettings,
    pub ores: OreSettings,
    pub structures: StructureSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_normalization() {
        assert_eq!(biome_key("Magic Forest"), "magic_forest");
        assert_eq!(biome_key("DEEP  Ocean"), "deep__ocean");
        assert_eq!(BiomeDefinition::new("Crystal Caves").key, "crystal_caves");
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(BiomeDefinition::new("plains").validate().is_ok());
    }

    #[test]
    fn test_inverted_height_bounds_rejected() {
        let mut def = BiomeDefinition::new("broken");
        def.terrain.min_height = 130;
        def.terrain.max_height = 70;
        assert_eq!(
            def.validate(),
            Err(ValidationError::HeightBounds { min: 130, max: 70 })
        );
    }

    #[test]
    fn test_non_positive_multiplier_rejected() {
        let mut def = BiomeDefinition::new("broken");
        def.terrain.height_multiplier = 0.0;
        assert!(matches!(
            def.validate(),
            Err(ValidationError::NonPositiveMultiplier { .. })
        ));
    }

    #[test]
    fn test_chance_out_of_range_names_field() {
        let mut def = BiomeDefinition::new("broken");
        def.features.vegetation.plants.push(PlantEntry {
            block: Material::Poppy,
            chance: 1.5,
            max_per_chunk: 3,
        });
        match def.validate() {
            Err(ValidationError::ChanceOutOfRange { field, value }) => {
                assert_eq!(field, "features.vegetation.plants[0].chance");
                assert_eq!(value, 1.5);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_inverted_ore_band_rejected() {
        let mut def = BiomeDefinition::new("broken");
        def.features.ores.veins.push(OreVein {
            block: Material::IronOre,
            min_height: 40,
            max_height: 10,
            vein_size: 8,
            chance: 0.5,
        });
        assert!(matches!(
            def.validate(),
            Err(ValidationError::OreBand { min: 40, max: 10, .. })
        ));
    }

    #[test]
    fn test_layer_from_name_defaults_to_deep() {
        assert_eq!(Layer::from_name("surface"), Layer::Surface);
        assert_eq!(Layer::from_name("subsurface"), Layer::Subsurface);
        assert_eq!(Layer::from_name("deep"), Layer::Deep);
        assert_eq!(Layer::from_name("mantle"), Layer::Deep);
    }

    #[test]
    fn test_enum_tokens() {
        assert_eq!("MOUNTAINS".parse::<TerrainShape>(), Ok(TerrainShape::Mountains));
        assert_eq!("dark-oak".parse::<TreeType>(), Ok(TreeType::DarkOak));
        assert!("baobab".parse::<TreeType>().is_err());
    }
}
