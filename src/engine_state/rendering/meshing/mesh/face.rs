use cgmath::Point3;

use crate::engine_state::voxels::block::{block_side::BlockSide, BlockTypeSize};

/// Represents a single quad face in the mesh, in world block coordinates.
///
/// A face is defined by four corner points (lower-left, lower-right, upper-right, upper-left)
/// and contains information about the block type and which side of the block it represents.
/// The corners are laid out so that `(ll, lr, ur)` and `(ll, ur, ul)` wind counter-clockwise
/// when seen from outside the block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Lower-right corner of the face
    pub lr: Point3<i32>,
    /// Lower-left corner of the face
    pub ll: Point3<i32>,
    /// Upper-right corner of the face
    pub ur: Point3<i32>,
    /// Upper-left corner of the face
    pub ul: Point3<i32>,
    /// The block type as an integer, used for texture mapping
    pub block_type_int: BlockTypeSize,
    /// Which side of the block this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates a new unit face for the voxel at the given world coordinates.
    ///
    /// # Arguments
    /// * `i`, `j`, `k` - The world coordinates of the voxel
    /// * `block_type_int` - The type of the block, used for texture mapping
    /// * `block_side` - Which side of the block this face represents
    pub fn new(i: i32, j: i32, k: i32, block_type_int: BlockTypeSize, block_side: BlockSide) -> Self {
        let (ll, lr, ul, ur) = match block_side {
            BlockSide::FRONT => (
                Point3::new(i, j, k),
                Point3::new(i, j, k + 1),
                Point3::new(i, j + 1, k),
                Point3::new(i, j + 1, k + 1),
            ),
            BlockSide::BACK => (
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j, k),
                Point3::new(i + 1, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k),
            ),
            BlockSide::BOTTOM => (
                Point3::new(i, j, k + 1),
                Point3::new(i, j, k),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i + 1, j, k),
            ),
            BlockSide::TOP => (
                Point3::new(i, j + 1, k),
                Point3::new(i, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i + 1, j + 1, k + 1),
            ),
            BlockSide::LEFT => (
                Point3::new(i + 1, j, k),
                Point3::new(i, j, k),
                Point3::new(i + 1, j + 1, k),
                Point3::new(i, j + 1, k),
            ),
            BlockSide::RIGHT => (
                Point3::new(i, j, k + 1),
                Point3::new(i + 1, j, k + 1),
                Point3::new(i, j + 1, k + 1),
                Point3::new(i + 1, j + 1, k + 1),
            ),
        };

        Face {
            ll,
            lr,
            ul,
            ur,
            block_type_int,
            block_side,
        }
    }

    fn same_kind(&self, other: &Face) -> bool {
        self.block_type_int == other.block_type_int && self.block_side == other.block_side
    }

    /// Attempts to merge this face with another face that is directly above it.
    ///
    /// # Returns
    /// `Some(merged_face)` if the faces can be merged, or `None` if they cannot be merged.
    ///
    /// # Note
    /// Faces can only be merged if they have the same block type and side and their edges
    /// align perfectly.
    pub fn merge_up(&self, other: &Face) -> Option<Face> {
        if self.same_kind(other) && self.ul == other.ll && self.ur == other.lr {
            return Some(Face {
                ul: other.ul,
                ur: other.ur,
                ..*self
            });
        }

        None
    }

    /// Attempts to merge this face with another face that is directly below it.
    pub fn merge_down(&self, other: &Face) -> Option<Face> {
        other.merge_up(self)
    }

    /// Attempts to merge this face with another face that is directly to its right.
    pub fn merge_right(&self, other: &Face) -> Option<Face> {
        if self.same_kind(other) && self.lr == other.ll && self.ur == other.ul {
            return Some(Face {
                lr: other.lr,
                ur: other.ur,
                ..*self
            });
        }

        None
    }

    /// Attempts to merge this face with another face that is directly to its left.
    pub fn merge_left(&self, other: &Face) -> Option<Face> {
        other.merge_right(self)
    }

    /// Tries all four merge directions.
    pub fn try_merge(&self, other: &Face) -> Option<Face> {
        self.merge_up(other)
            .or_else(|| self.merge_down(other))
            .or_else(|| self.merge_right(other))
            .or_else(|| self.merge_left(other))
    }

    /// Width of the face in blocks, along `ll -> lr`.
    pub fn width(&self) -> i32 {
        manhattan(self.ll, self.lr)
    }

    /// Height of the face in blocks, along `ll -> ul`.
    pub fn height(&self) -> i32 {
        manhattan(self.ll, self.ul)
    }
}

fn manhattan(a: Point3<i32>, b: Point3<i32>) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs() + (a.z - b.z).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    fn corner(p: Point3<i32>) -> Vector3<f32> {
        Vector3::new(p.x as f32, p.y as f32, p.z as f32)
    }

    #[test]
    fn winding_matches_the_outward_normal() {
        for side in BlockSide::all() {
            let face = Face::new(3, 7, -2, 1, side);
            let (ll, lr, ul, ur) = (corner(face.ll), corner(face.lr), corner(face.ul), corner(face.ur));
            let first = (lr - ll).cross(ur - ll).normalize();
            let second = (ur - ll).cross(ul - ll).normalize();
            assert_eq!(first, side.normal(), "{side:?}");
            assert_eq!(second, side.normal(), "{side:?}");
        }
    }

    #[test]
    fn neighbours_merge_in_every_direction() {
        let a = Face::new(0, 0, 0, 2, BlockSide::FRONT);
        let above = Face::new(0, 1, 0, 2, BlockSide::FRONT);
        let beside = Face::new(0, 0, 1, 2, BlockSide::FRONT);

        let tall = a.try_merge(&above).map(|f| (f.width(), f.height()));
        let wide = a.try_merge(&beside).map(|f| (f.width(), f.height()));
        assert_eq!(tall, Some((1, 2)));
        assert_eq!(wide, Some((2, 1)));
        assert_eq!(above.try_merge(&a), a.try_merge(&above));
    }

    #[test]
    fn different_types_or_sides_do_not_merge() {
        let a = Face::new(0, 0, 0, 2, BlockSide::TOP);
        assert!(a.try_merge(&Face::new(1, 0, 0, 3, BlockSide::TOP)).is_none());
        assert!(a.try_merge(&Face::new(0, 0, 2, 2, BlockSide::TOP)).is_none());
        assert!(a.try_merge(&Face::new(1, 0, 0, 2, BlockSide::BOTTOM)).is_none());
    }
}
