//! # Chunk Iteration Module
//!
//! This module provides an iterator over the non-air blocks of a chunk. Terrain
//! chunks are mostly air above the surface, so skipping it keeps snapshot capture
//! proportional to the amount of solid ground.

use cgmath::Point3;

use crate::engine_state::voxels::block::block_type::BlockType;

use super::{Chunk, CHUNK_AREA, CHUNK_DIMENSION, CHUNK_VOLUME};

/// An iterator over all non-air blocks in a chunk.
///
/// Blocks are visited in storage order: x fastest, then z, then y. Each item is
/// the chunk-relative position of the block and its type.
pub struct ChunkBlockIterator<'a> {
    /// Reference to the chunk being iterated over
    chunk_ref: &'a Chunk,
    /// Next voxel index to inspect
    current_offset: usize,
}

impl<'a> ChunkBlockIterator<'a> {
    /// Creates a new `ChunkBlockIterator` for the given chunk.
    pub fn new(chunk_ref: &'a Chunk) -> Self {
        ChunkBlockIterator {
            chunk_ref,
            current_offset: 0,
        }
    }
}

impl Iterator for ChunkBlockIterator<'_> {
    type Item = (Point3<usize>, BlockType);

    fn next(&mut self) -> Option<Self::Item> {
        let blocks = self.chunk_ref.blocks();
        while self.current_offset < CHUNK_VOLUME {
            let offset = self.current_offset;
            self.current_offset += 1;

            let block_type = blocks[offset];
            if block_type.is_air() {
                continue;
            }

            let y = offset / CHUNK_AREA;
            let z = (offset % CHUNK_AREA) / CHUNK_DIMENSION;
            let x = offset % CHUNK_DIMENSION;
            return Some((Point3::new(x, y, z), block_type));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::ChunkKey;

    #[test]
    fn visits_only_solid_blocks_in_storage_order() {
        let mut chunk = Chunk::empty(ChunkKey::new(0, 0));
        chunk.replace_block(5, 3, 0, BlockType::STONE);
        chunk.replace_block(1, 0, 2, BlockType::DIRT);
        chunk.replace_block(15, 255, 15, BlockType::LEAVES);

        let visited: Vec<_> = ChunkBlockIterator::new(&chunk).collect();

        assert_eq!(
            visited,
            vec![
                (Point3::new(1, 0, 2), BlockType::DIRT),
                (Point3::new(5, 3, 0), BlockType::STONE),
                (Point3::new(15, 255, 15), BlockType::LEAVES),
            ]
        );
    }
}
