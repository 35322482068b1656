//! # Chunk Snapshots
//!
//! A meshing job must not read a chunk that the coordinator may edit while
//! the job runs. Before submission the chunk is copied into a `MeshSnapshot`,
//! which the worker then owns outright.
//!
//! The snapshot stores:
//! - the non-air blocks, already translated to world coordinates
//! - a solid mask padded by one voxel on every side (`SNAPSHOT_DIMENSION_WRAPPED`)
//!
//! The padding is never set. Neighbour lookups at the chunk edge therefore see
//! air, and faces on the chunk boundary are always emitted.

use bitvec::prelude::BitVec;
use cgmath::Point3;

use crate::engine_state::voxels::{
    block::{block_side::BlockSide, BlockTypeSize},
    chunk::{
        chunk_iteration::ChunkBlockIterator, Chunk, ChunkKey, ChunkVersion, CHUNK_DIMENSION,
        CHUNK_HEIGHT,
    },
};

/// Horizontal dimension of the padded solid mask.
pub const SNAPSHOT_DIMENSION_WRAPPED: usize = CHUNK_DIMENSION + 2;
/// Vertical dimension of the padded solid mask.
pub const SNAPSHOT_HEIGHT_WRAPPED: usize = CHUNK_HEIGHT + 2;
/// Number of cells in one padded horizontal slice.
pub const SNAPSHOT_PLANE_SIZE_WRAPPED: usize =
    SNAPSHOT_DIMENSION_WRAPPED * SNAPSHOT_DIMENSION_WRAPPED;
/// Total number of cells in the padded solid mask.
pub const SNAPSHOT_SIZE_WRAPPED: usize = SNAPSHOT_PLANE_SIZE_WRAPPED * SNAPSHOT_HEIGHT_WRAPPED;

/// One non-air voxel of a snapshot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SnapshotBlock {
    /// World-space position of the voxel.
    pub position: Point3<i32>,
    pub block_type: BlockTypeSize,
}

/// Immutable copy of a chunk's voxels for off-thread meshing.
#[derive(Clone, Debug)]
pub struct MeshSnapshot {
    pub key: ChunkKey,
    /// Version of the chunk when the snapshot was taken.
    pub version: ChunkVersion,
    /// World position of the chunk's minimum corner.
    pub origin: Point3<i32>,
    blocks: Vec<SnapshotBlock>,
    solid_array: BitVec,
}

impl MeshSnapshot {
    /// Copies a chunk.
    pub fn capture(chunk: &Chunk) -> Self {
        let origin = chunk.position.world_origin();
        let mut solid_array = BitVec::repeat(false, SNAPSHOT_SIZE_WRAPPED);
        let mut blocks = Vec::new();

        for (local, block_type) in ChunkBlockIterator::new(chunk) {
            solid_array.set(wrapped_index(local.x + 1, local.y + 1, local.z + 1), true);
            blocks.push(SnapshotBlock {
                position: Point3::new(
                    origin.x + local.x as i32,
                    local.y as i32,
                    origin.z + local.z as i32,
                ),
                block_type: block_type.id(),
            });
        }

        Self {
            key: chunk.position,
            version: chunk.version(),
            origin,
            blocks,
            solid_array,
        }
    }

    /// Non-air voxels in storage order.
    pub fn blocks(&self) -> &[SnapshotBlock] {
        &self.blocks
    }

    pub fn solid_count(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the world voxel at `position` is non-air. Voxels outside the
    /// chunk read as air.
    pub fn is_solid(&self, position: Point3<i32>) -> bool {
        let (x, y, z) = (
            position.x - self.origin.x + 1,
            position.y + 1,
            position.z - self.origin.z + 1,
        );
        let in_range = (0..SNAPSHOT_DIMENSION_WRAPPED as i32).contains(&x)
            && (0..SNAPSHOT_HEIGHT_WRAPPED as i32).contains(&y)
            && (0..SNAPSHOT_DIMENSION_WRAPPED as i32).contains(&z);
        in_range && self.solid_array[wrapped_index(x as usize, y as usize, z as usize)]
    }

    /// Whether the face of the voxel at `position` facing `side` is exposed.
    pub fn is_face_visible(&self, position: Point3<i32>, side: BlockSide) -> bool {
        !self.is_solid(position + side.offset())
    }
}

#[inline]
fn wrapped_index(x: usize, y: usize, z: usize) -> usize {
    x + SNAPSHOT_DIMENSION_WRAPPED * z + SNAPSHOT_PLANE_SIZE_WRAPPED * y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::block::block_type::BlockType;

    #[test]
    fn blocks_are_translated_to_world_space() {
        let mut chunk = Chunk::empty(ChunkKey::new(-1, 2));
        chunk.replace_block(0, 5, 15, BlockType::DIRT);

        let snapshot = MeshSnapshot::capture(&chunk);

        assert_eq!(
            snapshot.blocks(),
            &[SnapshotBlock {
                position: Point3::new(-16, 5, 47),
                block_type: BlockType::DIRT.id(),
            }]
        );
        assert!(snapshot.is_solid(Point3::new(-16, 5, 47)));
        assert!(!snapshot.is_solid(Point3::new(-15, 5, 47)));
        assert_eq!(snapshot.version, chunk.version());
    }

    #[test]
    fn chunk_edges_read_as_air() {
        let mut chunk = Chunk::empty(ChunkKey::new(0, 0));
        chunk.replace_block(0, 0, 0, BlockType::STONE);
        let snapshot = MeshSnapshot::capture(&chunk);
        let corner = Point3::new(0, 0, 0);

        assert!(snapshot.is_face_visible(corner, BlockSide::FRONT));
        assert!(snapshot.is_face_visible(corner, BlockSide::BOTTOM));
        assert!(snapshot.is_face_visible(corner, BlockSide::LEFT));
        assert!(!snapshot.is_solid(Point3::new(-5, 300, 40)));
    }

    #[test]
    fn later_edits_do_not_leak_into_the_snapshot() {
        let mut chunk = Chunk::empty(ChunkKey::new(0, 0));
        chunk.replace_block(1, 1, 1, BlockType::STONE);
        let snapshot = MeshSnapshot::capture(&chunk);

        chunk.replace_block(1, 1, 1, BlockType::AIR);

        assert!(snapshot.is_solid(Point3::new(1, 1, 1)));
        assert_eq!(snapshot.solid_count(), 1);
    }
}
