//! Integer block positions and inclusive cuboid bounds.

use serde::{Deserialize, Serialize};

/// A block position in world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// Axis-aligned box of blocks. Both corners are inside the box.
///
/// Invariant: min.x <= max.x, min.y <= max.y, min.z <= max.z.
/// The constructor enforces this by swapping components if needed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cuboid {
    pub min: BlockPos,
    pub max: BlockPos,
}

impl Cuboid {
    /// Create a cuboid from two corners in any order.
    pub fn new(a: BlockPos, b: BlockPos) -> Self {
        Self {
            min: BlockPos::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: BlockPos::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// A single-block cuboid.
    pub fn point(p: BlockPos) -> Self {
        Self { min: p, max: p }
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains(&self, p: BlockPos) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Returns true if the two cuboids share at least one block.
    pub fn intersects(&self, other: &Cuboid) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Number of blocks per axis.
    pub fn extent(&self) -> (u64, u64, u64) {
        let span = |lo: i32, hi: i32| (hi as i64 - lo as i64 + 1) as u64;
        (
            span(self.min.x, self.max.x),
            span(self.min.y, self.max.y),
            span(self.min.z, self.max.z),
        )
    }

    /// Number of blocks inside: `(dx + 1)(dy + 1)(dz + 1)`.
    ///
    /// Computed in `u128`, which cannot overflow for `i32` corners.
    pub fn volume(&self) -> u128 {
        let (dx, dy, dz) = self.extent();
        dx as u128 * dy as u128 * dz as u128
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_sorts_corners() {
        let c = Cuboid::new(BlockPos::new(5, -1, 3), BlockPos::new(-2, 7, 3));
        assert_eq!(c.min, BlockPos::new(-2, -1, 3));
        assert_eq!(c.max, BlockPos::new(5, 7, 3));
    }

    #[test]
    fn test_volume_counts_blocks() {
        assert_eq!(Cuboid::point(BlockPos::new(9, 9, 9)).volume(), 1);
        let c = Cuboid::new(BlockPos::new(0, 0, 0), BlockPos::new(9, 9, 9));
        assert_eq!(c.volume(), 1000);
        let full = Cuboid::new(
            BlockPos::new(i32::MIN, i32::MIN, i32::MIN),
            BlockPos::new(i32::MAX, i32::MAX, i32::MAX),
        );
        assert_eq!(full.volume(), 1u128 << 96);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let c = Cuboid::new(BlockPos::new(0, 0, 0), BlockPos::new(2, 2, 2));
        assert!(c.contains(BlockPos::new(0, 0, 0)));
        assert!(c.contains(BlockPos::new(2, 2, 2)));
        assert!(!c.contains(BlockPos::new(3, 2, 2)));
        assert!(!c.contains(BlockPos::new(1, -1, 1)));
    }

    #[test]
    fn test_intersects_touching() {
        let a = Cuboid::new(BlockPos::new(0, 0, 0), BlockPos::new(2, 2, 2));
        let b = Cuboid::new(BlockPos::new(2, 2, 2), BlockPos::new(4, 4, 4));
        let c = Cuboid::new(BlockPos::new(3, 0, 0), BlockPos::new(4, 4, 4));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }

    proptest! {
        #[test]
        fn prop_corners_are_contained(
            ax in -1000..1000i32, ay in -64..320i32, az in -1000..1000i32,
            bx in -1000..1000i32, by in -64..320i32, bz in -1000..1000i32,
        ) {
            let c = Cuboid::new(BlockPos::new(ax, ay, az), BlockPos::new(bx, by, bz));
            prop_assert!(c.contains(BlockPos::new(ax, ay, az)));
            prop_assert!(c.contains(BlockPos::new(bx, by, bz)));
            prop_assert!(c.volume() >= 1);
        }
    }
}
