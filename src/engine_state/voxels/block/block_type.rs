//! # Block Type Module
//!
//! This module defines the different types of blocks in the voxel world and the
//! per-type properties the terrain generator and the mesher look up.

use std::fmt;

use num_derive::FromPrimitive;

use super::BlockTypeSize;

/// Enumerates all possible block types in the voxel world.
///
/// The discriminants are the compact ids stored in chunk snapshots and used as
/// keys of the texture tile table. The `FromPrimitive` derive allows conversion
/// back from those ids.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, FromPrimitive)]
pub enum BlockType {
    /// The empty block. Non-solid, never rendered, and the fill value of fresh chunks.
    #[default]
    AIR = 0,

    /// Surface block of temperate columns.
    GRASS = 1,

    /// Layer between the surface and the stone below it.
    DIRT = 2,

    /// Bedrock at y = 0, the deep layer, and rock features.
    STONE = 3,

    /// Tree trunks.
    WOOD = 4,

    /// Tree canopies and flowers.
    LEAVES = 5,

    /// Surface block of deserts, beaches and low-lying columns.
    SAND = 6,

    /// Fills every column from its surface up to the water level.
    WATER = 7,

    /// Inventory-only item. Never produced by terrain generation.
    SWORD = 8,
}

impl BlockType {
    /// Every block type, in id order.
    pub const ALL: [BlockType; 9] = [
        BlockType::AIR,
        BlockType::GRASS,
        BlockType::DIRT,
        BlockType::STONE,
        BlockType::WOOD,
        BlockType::LEAVES,
        BlockType::SAND,
        BlockType::WATER,
        BlockType::SWORD,
    ];

    /// Converts a compact id back into a `BlockType`.
    ///
    /// # Arguments
    /// * `id` - The block type as a `BlockTypeSize`
    ///
    /// # Returns
    /// The corresponding `BlockType`, or `None` for an unknown id.
    pub fn from_id(id: BlockTypeSize) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    /// The compact id of this block type.
    pub fn id(self) -> BlockTypeSize {
        self as BlockTypeSize
    }

    pub fn is_air(self) -> bool {
        self == BlockType::AIR
    }

    /// Whether the block occupies its voxel. Anything but air does, water included.
    pub fn is_solid(self) -> bool {
        !self.is_air()
    }

    /// Default hardness recorded in the metadata of generated surface blocks.
    pub fn hardness(self) -> f32 {
        match self {
            BlockType::AIR => 0.0,
            BlockType::LEAVES => 0.2,
            BlockType::DIRT | BlockType::SAND => 0.5,
            BlockType::GRASS => 0.6,
            BlockType::STONE => 1.5,
            BlockType::WOOD => 2.0,
            BlockType::WATER => 100.0,
            BlockType::SWORD => 0.0,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BlockType::AIR => "air",
            BlockType::GRASS => "grass",
            BlockType::DIRT => "dirt",
            BlockType::STONE => "stone",
            BlockType::WOOD => "wood",
            BlockType::LEAVES => "leaves",
            BlockType::SAND => "sand",
            BlockType::WATER => "water",
            BlockType::SWORD => "sword",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for block_type in BlockType::ALL {
            assert_eq!(BlockType::from_id(block_type.id()), Some(block_type));
        }
        assert_eq!(BlockType::from_id(200), None);
    }

    #[test]
    fn only_air_is_empty() {
        assert!(BlockType::AIR.is_air());
        assert!(!BlockType::AIR.is_solid());
        assert!(BlockType::WATER.is_solid());
        assert_eq!(BlockType::default(), BlockType::AIR);
    }
}
