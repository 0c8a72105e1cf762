//! Block materials: a closed vocabulary of named block types with physical kinds.
//!
//! Definition files name materials with free-form tokens (`GRASS_BLOCK`,
//! `minecraft:oak_log`, `stone`). Parsing is fallible and returns
//! [`UnknownToken`]; substituting a default is the loader's decision.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Physical kind of a material, used for placement and collision checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    /// Empty space.
    Air,
    /// Full collidable block.
    Solid,
    /// Water, lava.
    Fluid,
    /// Non-collidable decoration that needs solid ground (flowers, grass).
    Plant,
}

/// A token that does not name any known material, tree type, or terrain shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} token: {token:?}")]
pub struct UnknownToken {
    /// What was being parsed ("material", "tree type", ...).
    pub kind: &'static str,
    /// The offending token as written.
    pub token: String,
}

impl UnknownToken {
    /// Creates an error for `token` of the given kind.
    pub fn new(kind: &'static str, token: impl Into<String>) -> Self {
        Self {
            kind,
            token: token.into(),
        }
    }
}

/// Normalizes a free-form token: trims, lowercases, strips a `minecraft:`
/// namespace, and maps spaces and hyphens to underscores.
pub fn normalize_token(token: &str) -> String {
    let lower = token.trim().to_ascii_lowercase();
    let bare = lower.strip_prefix("minecraft:").unwrap_or(&lower);
    bare.replace([' ', '-'], "_")
}

macro_rules! materials {
    ($($variant:ident => $name:literal, $kind:ident;)*) => {
        /// Identifier of a block type.
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Material {
            $(
                #[doc = concat!("`", $name, "`")]
                $variant,
            )*
        }

        impl Material {
            /// Every material, in declaration order.
            pub const ALL: &'static [Material] = &[$(Material::$variant,)*];

            /// Canonical lowercase name.
            pub fn name(self) -> &'static str {
                match self {
                    $(Material::$variant => $name,)*
                }
            }

            /// Physical kind.
            pub fn kind(self) -> MaterialKind {
                match self {
                    $(Material::$variant => MaterialKind::$kind,)*
                }
            }
        }
    };
}

materials! {
    Air => "air", Air;
    Bedrock => "bedrock", Solid;
    Stone => "stone", Solid;
    Deepslate => "deepslate", Solid;
    Cobblestone => "cobblestone", Solid;
    MossyCobblestone => "mossy_cobblestone", Solid;
    Andesite => "andesite", Solid;
    Diorite => "diorite", Solid;
    Granite => "granite", Solid;
    Tuff => "tuff", Solid;
    Calcite => "calcite", Solid;
    Dirt => "dirt", Solid;
    CoarseDirt => "coarse_dirt", Solid;
    RootedDirt => "rooted_dirt", Solid;
    GrassBlock => "grass_block", Solid;
    Podzol => "podzol", Solid;
    Mycelium => "mycelium", Solid;
    MossBlock => "moss_block", Solid;
    Mud => "mud", Solid;
    Clay => "clay", Solid;
    Sand => "sand", Solid;
    RedSand => "red_sand", Solid;
    Sandstone => "sandstone", Solid;
    RedSandstone => "red_sandstone", Solid;
    Gravel => "gravel", Solid;
    Terracotta => "terracotta", Solid;
    SnowBlock => "snow_block", Solid;
    Ice => "ice", Solid;
    PackedIce => "packed_ice", Solid;
    BlueIce => "blue_ice", Solid;
    Obsidian => "obsidian", Solid;
    Netherrack => "netherrack", Solid;
    Basalt => "basalt", Solid;
    EndStone => "end_stone", Solid;
    Magma => "magma_block", Solid;
    Glowstone => "glowstone", Solid;
    Water => "water", Fluid;
    Lava => "lava", Fluid;
    CoalOre => "coal_ore", Solid;
    IronOre => "iron_ore", Solid;
    CopperOre => "copper_ore", Solid;
    GoldOre => "gold_ore", Solid;
    RedstoneOre => "redstone_ore", Solid;
    LapisOre => "lapis_ore", Solid;
    DiamondOre => "diamond_ore", Solid;
    EmeraldOre => "emerald_ore", Solid;
    DeepslateCoalOre => "deepslate_coal_ore", Solid;
    DeepslateIronOre => "deepslate_iron_ore", Solid;
    DeepslateGoldOre => "deepslate_gold_ore", Solid;
    DeepslateDiamondOre => "deepslate_diamond_ore", Solid;
    AmethystBlock => "amethyst_block", Solid;
    OakLog => "oak_log", Solid;
    OakLeaves => "oak_leaves", Solid;
    BirchLog => "birch_log", Solid;
    BirchLeaves => "birch_leaves", Solid;
    SpruceLog => "spruce_log", Solid;
    SpruceLeaves => "spruce_leaves", Solid;
    JungleLog => "jungle_log", Solid;
    JungleLeaves => "jungle_leaves", Solid;
    DarkOakLog => "dark_oak_log", Solid;
    DarkOakLeaves => "dark_oak_leaves", Solid;
    AcaciaLog => "acacia_log", Solid;
    AcaciaLeaves => "acacia_leaves", Solid;
    CherryLog => "cherry_log", Solid;
    CherryLeaves => "cherry_leaves", Solid;
    AzaleaLeaves => "azalea_leaves", Solid;
    FloweringAzaleaLeaves => "flowering_azalea_leaves", Solid;
    ShortGrass => "short_grass", Plant;
    TallGrass => "tall_grass", Plant;
    Fern => "fern", Plant;
    DeadBush => "dead_bush", Plant;
    Dandelion => "dandelion", Plant;
    Poppy => "poppy", Plant;
    BlueOrchid => "blue_orchid", Plant;
    Allium => "allium", Plant;
    AzureBluet => "azure_bluet", Plant;
    Cornflower => "cornflower", Plant;
    OxeyeDaisy => "oxeye_daisy", Plant;
    LilyOfTheValley => "lily_of_the_valley", Plant;
    Sunflower => "sunflower", Plant;
    Cactus => "cactus", Plant;
    SugarCane => "sugar_cane", Plant;
    SweetBerryBush => "sweet_berry_bush", Plant;
    BrownMushroom => "brown_mushroom", Plant;
    RedMushroom => "red_mushroom", Plant;
    Azalea => "azalea", Plant;
    FloweringAzalea => "flowering_azalea", Plant;
    MossCarpet => "moss_carpet", Plant;
    Snow => "snow", Plant;
}

impl Material {
    /// Returns `true` for air.
    pub fn is_air(self) -> bool {
        self.kind() == MaterialKind::Air
    }

    /// Returns `true` for full collidable blocks.
    pub fn is_solid(self) -> bool {
        self.kind() == MaterialKind::Solid
    }

    /// Returns `true` for water and lava.
    pub fn is_fluid(self) -> bool {
        self.kind() == MaterialKind::Fluid
    }

    /// Generic underground stone that ore veins may replace.
    pub fn is_deep_stone(self) -> bool {
        matches!(self, Material::Stone | Material::Deepslate)
    }
}

impl Default for Material {
    fn default() -> Self {
        Material::Air
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Material {
    type Err = UnknownToken;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = normalize_token(s);
        Material::ALL
            .iter()
            .copied()
            .find(|m| m.name() == token)
            .ok_or_else(|| UnknownToken::new("material", s))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("GRASS_BLOCK".parse::<Material>(), Ok(Material::GrassBlock));
        assert_eq!("grass_block".parse::<Material>(), Ok(Material::GrassBlock));
        assert_eq!(" Stone ".parse::<Material>(), Ok(Material::Stone));
    }

    #[test]
    fn test_parse_strips_namespace() {
        assert_eq!(
            "minecraft:oak_log".parse::<Material>(),
            Ok(Material::OakLog)
        );
    }

    #[test]
    fn test_unknown_token_reports_original() {
        let err = "unobtainium".parse::<Material>().unwrap_err();
        assert_eq!(err.kind, "material");
        assert_eq!(err.token, "unobtainium");
        assert_eq!(err.to_string(), "unknown material token: \"unobtainium\"");
    }

    #[test]
    fn test_names_round_trip_through_parse() {
        for &m in Material::ALL {
            assert_eq!(m.name().parse::<Material>(), Ok(m), "{m} did not parse");
        }
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = Material::ALL.iter().map(|m| m.name()).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_kinds() {
        assert!(Material::Air.is_air());
        assert!(Material::Stone.is_solid());
        assert!(Material::Water.is_fluid());
        assert!(!Material::Poppy.is_solid());
        assert_eq!(Material::Poppy.kind(), MaterialKind::Plant);
    }

    #[test]
    fn test_deep_stone() {
        assert!(Material::Stone.is_deep_stone());
        assert!(Material::Deepslate.is_deep_stone());
        assert!(!Material::CoalOre.is_deep_stone());
        assert!(!Material::Air.is_deep_stone());
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let s = ron::to_string(&Material::DeepslateDiamondOre).unwrap();
        assert_eq!(s, "deepslate_diamond_ore");
    }
}
