//! Block templates for the tree archetypes.
//!
//! A template expands to trunk cells followed by leaf cells, relative to the
//! ground block the tree stands on.

use verdant_biome::TreeType;
use verdant_voxel::Material;

/// Canopy silhouette.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Canopy {
    /// Diamond layers around the trunk top, widest just below it.
    Round,
    /// Layers narrowing toward a pointed top.
    Conical,
    /// A wide, thin umbrella.
    Flat,
}

/// Materials and proportions of one tree archetype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeTemplate {
    pub log: Material,
    pub leaves: Material,
    /// Inclusive trunk height range.
    pub trunk_min: i32,
    pub trunk_max: i32,
    pub canopy_radius: i32,
    pub canopy: Canopy,
}

/// A cell of an expanded tree, relative to the ground block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TreeCell {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
    pub material: Material,
}

impl TreeTemplate {
    pub fn for_type(tree: TreeType) -> Self {
        let (log, leaves, trunk_min, trunk_max, canopy_radius, canopy) = match tree {
            TreeType::Oak => (Material::OakLog, Material::OakLeaves, 4, 6, 2, Canopy::Round),
            TreeType::Birch => (Material::BirchLog, Material::BirchLeaves, 5, 7, 2, Canopy::Round),
            TreeType::Spruce => (
                Material::SpruceLog,
                Material::SpruceLeaves,
                6,
                9,
                2,
                Canopy::Conical,
            ),
            TreeType::Jungle => (
                Material::JungleLog,
                Material::JungleLeaves,
                8,
                12,
                3,
                Canopy::Round,
            ),
            TreeType::DarkOak => (
                Material::DarkOakLog,
                Material::DarkOakLeaves,
                5,
                7,
                3,
                Canopy::Round,
            ),
            TreeType::Acacia => (
                Material::AcaciaLog,
                Material::AcaciaLeaves,
                4,
                6,
                3,
                Canopy::Flat,
            ),
            TreeType::Cherry => (
                Material::CherryLog,
                Material::CherryLeaves,
                4,
                7,
                3,
                Canopy::Round,
            ),
            TreeType::Azalea => (
                Material::OakLog,
                Material::AzaleaLeaves,
                3,
                4,
                2,
                Canopy::Round,
            ),
        };
        Self {
            log,
            leaves,
            trunk_min,
            trunk_max,
            canopy_radius,
            canopy,
        }
    }

    /// Trunk cells (bottom to top) then leaf cells for a trunk of
    /// `trunk_height`. The trunk starts one block above the ground.
    pub fn cells(&self, trunk_height: i32) -> Vec<TreeCell> {
        let mut cells: Vec<TreeCell> = (1..=trunk_height)
            .map(|dy| TreeCell {
                dx: 0,
                dy,
                dz: 0,
                material: self.log,
            })
            .collect();

        let top = trunk_height;
        let r = self.canopy_radius;
        for (layer, radius) in self.canopy_layers() {
            let dy = top + layer;
            for dx in -(r + 1)..=(r + 1) {
                for dz in -(r + 1)..=(r + 1) {
                    if dx == 0 && dz == 0 && layer <= 0 {
                        continue; // trunk
                    }
                    if dx.abs() + dz.abs() <= radius {
                        cells.push(TreeCell {
                            dx,
                            dy,
                            dz,
                            material: self.leaves,
                        });
                    }
                }
            }
        }
        cells
    }

    /// `(offset from trunk top, manhattan radius)` per canopy layer.
    fn canopy_layers(&self) -> Vec<(i32, i32)> {
        let r = self.canopy_radius;
        match self.canopy {
            Canopy::Round => (-2..=2)
                .map(|layer: i32| {
                    let base = if layer.abs() == 2 { r - 1 } else { r };
                    let extra = if layer >= 1 { 0 } else { 1 };
                    (layer, base + extra)
                })
                .collect(),
            Canopy::Conical => (-3..=1)
                .map(|layer: i32| (layer, ((1 - layer) * r + 2) / 4))
                .collect(),
            Canopy::Flat => vec![(0, r + 1), (1, r - 1)],
        }
    }
}
