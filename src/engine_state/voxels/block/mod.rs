//! # Block Module
//!
//! This module provides the block-level data model of the voxel world: block
//! types, block faces, the optional per-block metadata, and the `Block` value
//! returned by world queries.

use block_side::BlockSide;
use block_type::BlockType;
use cgmath::Point3;
use serde::{Deserialize, Serialize};

pub mod block_side;
pub mod block_type;

/// The underlying integer type used to represent block types in memory.
/// This is used for efficient storage of block ids in chunk snapshots.
pub type BlockTypeSize = u8;

/// Maps each block id to its texture tile for each face.
///
/// The inner array contains 6 tile indices, one for each face in `BlockSide`
/// order: [Front, Back, Bottom, Top, Left, Right]. Air and the sword have no
/// entry since they never produce terrain faces.
pub static BLOCK_TYPE_TO_TEXTURE_INDICES: phf::Map<u8, [u32; 6]> = phf::phf_map! {
    1u8 => [2, 2, 1, 3, 2, 2], // GRASS (top: 3, bottom: 1, sides: 2)
    2u8 => [1, 1, 1, 1, 1, 1], // DIRT
    3u8 => [5, 5, 5, 5, 5, 5], // STONE
    4u8 => [0, 0, 6, 6, 0, 0], // WOOD (rings on top and bottom)
    5u8 => [7, 7, 7, 7, 7, 7], // LEAVES
    6u8 => [8, 8, 8, 8, 8, 8], // SAND
    7u8 => [9, 9, 9, 9, 9, 9], // WATER
};

/// Tile used for any block id missing from the table.
pub const FALLBACK_TEXTURE_INDEX: u32 = 4;

/// Climate and material values recorded for generated surface blocks.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockMetadata {
    /// Column moisture in `[0, 1]`.
    pub moisture: f32,
    /// Column temperature in `[0, 1]`.
    pub temperature: f32,
    pub hardness: f32,
}

/// A single voxel as seen by callers of the world queries.
///
/// This is a value: it is produced from chunk storage on demand and changing it
/// has no effect on the world. Edits go through `set_block`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Block {
    pub block_type: BlockType,
    /// World-space position of the voxel.
    pub position: Point3<i32>,
    pub metadata: Option<BlockMetadata>,
}

impl Block {
    /// Creates a new block of the specified type at a world position.
    ///
    /// # Arguments
    /// * `block_type` - The type of block to create
    /// * `position` - World-space position of the voxel
    ///
    /// # Returns
    /// A new `Block` instance without metadata.
    pub fn new(block_type: BlockType, position: Point3<i32>) -> Self {
        Block {
            block_type,
            position,
            metadata: None,
        }
    }

    /// Gets the texture tile for one face of a block given its type as an integer.
    ///
    /// # Arguments
    /// * `btype_int` - The block type as a `BlockTypeSize`
    /// * `side` - Which face of the block
    ///
    /// # Returns
    /// The tile index of that face, or [`FALLBACK_TEXTURE_INDEX`] for untextured ids.
    pub fn get_texture_index_from_int(btype_int: BlockTypeSize, side: BlockSide) -> u32 {
        BLOCK_TYPE_TO_TEXTURE_INDICES
            .get(&btype_int)
            .map(|tiles| tiles[side as usize])
            .unwrap_or(FALLBACK_TEXTURE_INDEX)
    }
}
