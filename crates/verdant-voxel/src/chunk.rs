//! Dense block storage for one 16×16 chunk column.
//!
//! The grid covers the world's full vertical range (`min_y .. min_y + height`).
//! Air is the zero state so a fresh chunk is empty space. Local `x`/`z` are
//! in `0..16`; `y` is a world coordinate.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::material::Material;

/// Side length of a chunk in blocks.
pub const CHUNK_WIDTH: usize = 16;

/// Number of columns in a chunk (16²).
pub const CHUNK_AREA: usize = CHUNK_WIDTH * CHUNK_WIDTH;

/// Horizontal chunk coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk containing world block column `(block_x, block_z)`.
    pub fn containing(block_x: i32, block_z: i32) -> Self {
        Self {
            x: block_x.div_euclid(CHUNK_WIDTH as i32),
            z: block_z.div_euclid(CHUNK_WIDTH as i32),
        }
    }

    /// World X of local column 0.
    pub fn origin_x(&self) -> i32 {
        self.x * CHUNK_WIDTH as i32
    }

    /// World Z of local column 0.
    pub fn origin_z(&self) -> i32 {
        self.z * CHUNK_WIDTH as i32
    }

    /// World coordinates of local column `(lx, lz)`.
    pub fn world_column(&self, lx: usize, lz: usize) -> (i32, i32) {
        (self.origin_x() + lx as i32, self.origin_z() + lz as i32)
    }
}

/// Errors from checked chunk access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// The local coordinate lies outside the chunk.
    #[error("block ({x}, {y}, {z}) is outside the chunk (y range {min_y}..{max_y})")]
    OutOfBounds {
        x: usize,
        y: i32,
        z: usize,
        min_y: i32,
        max_y: i32,
    },
}

/// Read access to a chunk's blocks.
pub trait BlockView {
    /// Returns the block at local `(x, z)` and world `y`. Cells outside the
    /// grid read as air.
    fn block(&self, x: usize, y: i32, z: usize) -> Material;
}

/// Write access to a caller-owned chunk grid.
pub trait BlockSink {
    /// Writes a block. Returns `false` if the cell lies outside the grid.
    fn set_block(&mut self, x: usize, y: i32, z: usize, material: Material) -> bool;
}

/// Block storage for one chunk, indexed `(y - min_y) * 256 + z * 16 + x`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkData {
    min_y: i32,
    height: u32,
    blocks: Vec<Material>,
}

impl ChunkData {
    /// Creates an air-filled chunk spanning `min_y .. min_y + height`.
    pub fn new(min_y: i32, height: u32) -> Self {
        Self {
            min_y,
            height,
            blocks: vec![Material::Air; height as usize * CHUNK_AREA],
        }
    }

    /// Lowest world Y stored in the chunk.
    pub fn min_y(&self) -> i32 {
        self.min_y
    }

    /// One past the highest world Y stored in the chunk.
    pub fn max_y(&self) -> i32 {
        self.min_y + self.height as i32
    }

    /// Number of vertical cells.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` if `y` lies within the vertical range.
    pub fn contains_y(&self, y: i32) -> bool {
        y >= self.min_y && y < self.max_y()
    }

    fn index(&self, x: usize, y: i32, z: usize) -> Option<usize> {
        if x >= CHUNK_WIDTH || z >= CHUNK_WIDTH || !self.contains_y(y) {
            return None;
        }
        let ly = (y - self.min_y) as usize;
        Some(ly * CHUNK_AREA + z * CHUNK_WIDTH + x)
    }

    fn out_of_bounds(&self, x: usize, y: i32, z: usize) -> ChunkError {
        ChunkError::OutOfBounds {
            x,
            y,
            z,
            min_y: self.min_y,
            max_y: self.max_y(),
        }
    }

    /// Returns the block at `(x, y, z)`, or air outside the grid.
    pub fn get(&self, x: usize, y: i32, z: usize) -> Material {
        self.index(x, y, z)
            .map(|i| self.blocks[i])
            .unwrap_or(Material::Air)
    }

    /// Returns the block at `(x, y, z)`, failing outside the grid.
    pub fn try_get(&self, x: usize, y: i32, z: usize) -> Result<Material, ChunkError> {
        self.index(x, y, z)
            .map(|i| self.blocks[i])
            .ok_or_else(|| self.out_of_bounds(x, y, z))
    }

    /// Writes the block at `(x, y, z)`, failing outside the grid.
    pub fn try_set(
        &mut self,
        x: usize,
        y: i32,
        z: usize,
        material: Material,
    ) -> Result<(), ChunkError> {
        let i = self
            .index(x, y, z)
            .ok_or_else(|| self.out_of_bounds(x, y, z))?;
        self.blocks[i] = material;
        Ok(())
    }

    /// Writes the block at `(x, y, z)`. Writes outside the grid are dropped.
    pub fn set(&mut self, x: usize, y: i32, z: usize, material: Material) -> bool {
        self.try_set(x, y, z, material).is_ok()
    }

    /// Highest non-air Y in column `(x, z)`.
    pub fn column_top(&self, x: usize, z: usize) -> Option<i32> {
        (self.min_y..self.max_y())
            .rev()
            .find(|&y| !self.get(x, y, z).is_air())
    }

    /// Number of cells holding `material`.
    pub fn count(&self, material: Material) -> usize {
        self.blocks.iter().filter(|&&m| m == material).count()
    }

    /// Distinct materials present in the chunk, sorted.
    pub fn palette(&self) -> Vec<Material> {
        let mut palette = self.blocks.clone();
        palette.sort_unstable();
        palette.dedup();
        palette
    }

    /// Raw block slice in index order.
    pub fn as_slice(&self) -> &[Material] {
        &self.blocks
    }
}

impl BlockView for ChunkData {
    fn block(&self, x: usize, y: i32, z: usize) -> Material {
        self.get(x, y, z)
    }
}

impl BlockSink for ChunkData {
    fn set_block(&mut self, x: usize, y: i32, z: usize, material: Material) -> bool {
        self.set(x, y, z, material)
    }
}

/// Hash the contents of a `ChunkData` for determinism comparison.
pub fn hash_chunk_data(chunk: &ChunkData) -> u64 {
    let mut hasher = DefaultHasher::new();
    chunk.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chunk_is_air() {
        let chunk = ChunkData::new(-64, 384);
        assert_eq!(chunk.palette(), vec![Material::Air]);
        assert_eq!(chunk.max_y(), 320);
        assert_eq!(chunk.column_top(3, 3), None);
    }

    #[test]
    fn test_set_and_get() {
        let mut chunk = ChunkData::new(0, 64);
        assert!(chunk.set(15, 63, 0, Material::Stone));
        assert_eq!(chunk.get(15, 63, 0), Material::Stone);
        assert_eq!(chunk.get(0, 63, 15), Material::Air);
        assert_eq!(chunk.column_top(15, 0), Some(63));
    }

    #[test]
    fn test_out_of_range_writes_dropped() {
        let mut chunk = ChunkData::new(0, 16);
        assert!(!chunk.set(0, 16, 0, Material::Stone));
        assert!(!chunk.set(16, 0, 0, Material::Stone));
        assert!(!chunk.set(0, -1, 0, Material::Stone));
        assert_eq!(chunk.count(Material::Stone), 0);
        assert_eq!(chunk.get(0, 99, 0), Material::Air);
    }

    #[test]
    fn test_try_set_reports_bounds() {
        let mut chunk = ChunkData::new(-4, 8);
        let err = chunk.try_set(0, 4, 0, Material::Dirt).unwrap_err();
        assert_eq!(
            err,
            ChunkError::OutOfBounds {
                x: 0,
                y: 4,
                z: 0,
                min_y: -4,
                max_y: 4
            }
        );
        assert!(chunk.try_get(0, -4, 0).is_ok());
    }

    #[test]
    fn test_chunk_pos_containing_negative() {
        assert_eq!(ChunkPos::containing(-1, -16), ChunkPos::new(-1, -1));
        assert_eq!(ChunkPos::containing(15, 16), ChunkPos::new(0, 1));
        assert_eq!(ChunkPos::new(3, -5).world_column(2, 4), (50, -76));
    }

    #[test]
    fn test_hash_tracks_contents() {
        let mut a = ChunkData::new(0, 8);
        let b = a.clone();
        assert_eq!(hash_chunk_data(&a), hash_chunk_data(&b));
        a.set(1, 1, 1, Material::Sand);
        assert_ne!(hash_chunk_data(&a), hash_chunk_data(&b));
    }
}
