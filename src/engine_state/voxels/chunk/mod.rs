//! # Chunk Module
//!
//! This module provides the `Chunk` struct: a 16 x 256 x 16 column of voxels that
//! is the unit of generation, caching and meshing.
//!
//! ## Storage
//!
//! Blocks are stored densely, one `BlockType` per voxel, in y-major order
//! (`x + z * CHUNK_SIZE + y * CHUNK_AREA`), so every horizontal slice is
//! contiguous. Alongside the voxels each chunk keeps per-column data:
//! - `height_map`: the y of the topmost non-air block, `None` for an empty column
//! - `biome_map`: the biome the column was generated with
//!
//! Surface metadata (moisture, temperature, hardness) is sparse and keyed by
//! voxel index, since only generated surface blocks carry it.
//!
//! ## Edits
//!
//! Every edit goes through [`Chunk::replace_block`], which keeps the height map
//! exact without rescanning whole columns, flags the chunk dirty and bumps its
//! revision. A mesh built from revision `r` may only clear the dirty flag while
//! the chunk is still at revision `r`.
//!
//! The chunk store stamps every chunk it generates with a fresh epoch. A chunk
//! regenerated after eviction therefore never shares a [`ChunkVersion`] with
//! meshes built from its previous residency.

use std::{collections::HashMap, fmt, str::FromStr};

use cgmath::Point3;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use super::{
    block::{block_type::BlockType, Block, BlockMetadata},
    terrain::biome::Biome,
};

pub mod chunk_iteration;

/// Side length of a chunk in blocks, along X and Z.
pub const CHUNK_SIZE: i32 = 16;
/// Height of the world in blocks. Valid y coordinates are `0..WORLD_HEIGHT`.
pub const WORLD_HEIGHT: i32 = 256;
/// Every column is filled with water from its surface up to this y.
pub const WATER_LEVEL: i32 = 32;

/// `CHUNK_SIZE` as an index type.
pub const CHUNK_DIMENSION: usize = CHUNK_SIZE as usize;
/// Number of columns in a chunk (one horizontal slice).
pub const CHUNK_AREA: usize = CHUNK_DIMENSION * CHUNK_DIMENSION;
/// `WORLD_HEIGHT` as an index type.
pub const CHUNK_HEIGHT: usize = WORLD_HEIGHT as usize;
/// Total number of voxels in a chunk.
pub const CHUNK_VOLUME: usize = CHUNK_AREA * CHUNK_HEIGHT;

/// Chunk coordinates: world block coordinates divided by `CHUNK_SIZE`, floored.
///
/// Displayed and parsed as `"x,z"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey {
    pub x: i32,
    pub z: i32,
}

impl ChunkKey {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// The chunk that owns the world column `(x, z)`.
    pub fn containing(x: i32, z: i32) -> Self {
        Self {
            x: x.div_euclid(CHUNK_SIZE),
            z: z.div_euclid(CHUNK_SIZE),
        }
    }

    /// World coordinates of the chunk's minimum corner at y = 0.
    pub fn world_origin(&self) -> Point3<i32> {
        Point3::new(self.x * CHUNK_SIZE, 0, self.z * CHUNK_SIZE)
    }

    /// Key of the chunk offset by `(dx, dz)` chunks.
    pub fn offset(&self, dx: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.z + dz)
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.z)
    }
}

impl FromStr for ChunkKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, z) = s
            .split_once(',')
            .ok_or_else(|| format!("chunk key {s:?} is not of the form \"x,z\""))?;
        let parse = |part: &str| {
            part.trim()
                .parse::<i32>()
                .map_err(|e| format!("chunk key {s:?}: {e}"))
        };
        Ok(Self::new(parse(x)?, parse(z)?))
    }
}

/// Identifies the chunk contents a mesh was built from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkVersion {
    /// Residency the chunk belongs to, assigned by the store on generation.
    pub epoch: u64,
    /// Edit counter within that residency.
    pub revision: u64,
}

impl fmt::Display for ChunkVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.epoch, self.revision)
    }
}

/// Index of a voxel inside the chunk's block array.
#[inline]
pub fn voxel_index(x: usize, y: usize, z: usize) -> usize {
    x + z * CHUNK_DIMENSION + y * CHUNK_AREA
}

#[inline]
fn column_index(x: usize, z: usize) -> usize {
    x + z * CHUNK_DIMENSION
}

/// A 16 x 256 x 16 column of voxels plus its per-column caches.
#[derive(Clone, Debug)]
pub struct Chunk {
    /// The position of this chunk in chunk coordinates (not block coordinates).
    pub position: ChunkKey,
    blocks: Vec<BlockType>,
    metadata: HashMap<usize, BlockMetadata>,
    height_map: Vec<Option<u16>>,
    biome_map: Vec<Biome>,
    is_dirty: bool,
    is_generated: bool,
    last_accessed: Instant,
    epoch: u64,
    revision: u64,
}

impl PartialEq for Chunk {
    /// Chunks are equal when their contents are. Bookkeeping (dirty flag,
    /// version, access time) is ignored.
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
            && self.blocks == other.blocks
            && self.height_map == other.height_map
            && self.biome_map == other.biome_map
            && self.metadata == other.metadata
    }
}

impl Chunk {
    /// Creates a new, completely empty chunk (all blocks are air).
    ///
    /// # Arguments
    /// * `position` - The chunk coordinates of the new chunk
    pub fn empty(position: ChunkKey) -> Self {
        Self {
            position,
            blocks: vec![BlockType::AIR; CHUNK_VOLUME],
            metadata: HashMap::new(),
            height_map: vec![None; CHUNK_AREA],
            biome_map: vec![Biome::Plains; CHUNK_AREA],
            is_dirty: false,
            is_generated: false,
            last_accessed: Instant::now(),
            epoch: 0,
            revision: 0,
        }
    }

    /// Gets the type of the block at chunk-relative coordinates.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    #[inline]
    pub fn block_type_at(&self, x: usize, y: usize, z: usize) -> BlockType {
        self.blocks[voxel_index(x, y, z)]
    }

    /// Like [`Chunk::block_type_at`], but `None` outside the chunk.
    pub fn get_block_type(&self, x: i32, y: i32, z: i32) -> Option<BlockType> {
        let in_range = (0..CHUNK_SIZE).contains(&x)
            && (0..WORLD_HEIGHT).contains(&y)
            && (0..CHUNK_SIZE).contains(&z);
        in_range.then(|| self.block_type_at(x as usize, y as usize, z as usize))
    }

    /// Builds the world-facing `Block` value for chunk-relative coordinates.
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> Block {
        let origin = self.position.world_origin();
        Block {
            block_type: self.block_type_at(x, y, z),
            position: Point3::new(origin.x + x as i32, y as i32, origin.z + z as i32),
            metadata: self.metadata.get(&voxel_index(x, y, z)).copied(),
        }
    }

    /// Raw block slice in y-major order.
    pub fn blocks(&self) -> &[BlockType] {
        &self.blocks
    }

    /// Writes a voxel during generation. Leaves the height map, dirty flag and
    /// revision alone; call [`Chunk::recompute_height_map`] once generation is done.
    pub(crate) fn place_generated(&mut self, x: usize, y: usize, z: usize, block_type: BlockType) {
        self.blocks[voxel_index(x, y, z)] = block_type;
    }

    /// Replaces the block at chunk-relative coordinates.
    ///
    /// Existing metadata of the voxel is kept. The chunk is marked dirty and the
    /// height map of the column is updated incrementally:
    /// - a non-air block above the current top becomes the new top
    /// - clearing the current top scans down from there for the next non-air block
    ///
    /// # Returns
    /// The block type that was replaced.
    pub fn replace_block(&mut self, x: usize, y: usize, z: usize, block_type: BlockType) -> BlockType {
        let index = voxel_index(x, y, z);
        let previous = std::mem::replace(&mut self.blocks[index], block_type);
        self.mark_dirty();

        let column = column_index(x, z);
        let top = self.height_map[column].map(usize::from);
        if block_type.is_solid() {
            if top.map_or(true, |top| y > top) {
                self.height_map[column] = Some(y as u16);
            }
        } else if top == Some(y) {
            self.height_map[column] = self.scan_down(x, z, y);
        }

        previous
    }

    /// First non-air y strictly below `from` in the column.
    fn scan_down(&self, x: usize, z: usize, from: usize) -> Option<u16> {
        (0..from)
            .rev()
            .find(|&y| self.block_type_at(x, y, z).is_solid())
            .map(|y| y as u16)
    }

    /// Rebuilds every column's height from the voxels.
    pub fn recompute_height_map(&mut self) {
        for z in 0..CHUNK_DIMENSION {
            for x in 0..CHUNK_DIMENSION {
                self.height_map[column_index(x, z)] = self.scan_down(x, z, CHUNK_HEIGHT);
            }
        }
    }

    /// Cached y of the topmost non-air block in column `(x, z)`.
    pub fn height_at(&self, x: usize, z: usize) -> Option<i32> {
        self.height_map[column_index(x, z)].map(i32::from)
    }

    pub fn biome_at(&self, x: usize, z: usize) -> Biome {
        self.biome_map[column_index(x, z)]
    }

    pub(crate) fn set_biome(&mut self, x: usize, z: usize, biome: Biome) {
        self.biome_map[column_index(x, z)] = biome;
    }

    pub fn metadata_at(&self, x: usize, y: usize, z: usize) -> Option<BlockMetadata> {
        self.metadata.get(&voxel_index(x, y, z)).copied()
    }

    pub(crate) fn set_metadata(&mut self, x: usize, y: usize, z: usize, metadata: BlockMetadata) {
        self.metadata.insert(voxel_index(x, y, z), metadata);
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_generated(&self) -> bool {
        self.is_generated
    }

    pub(crate) fn mark_generated(&mut self) {
        self.is_generated = true;
    }

    /// Flags the chunk's mesh as stale.
    pub fn mark_dirty(&mut self) {
        self.is_dirty = true;
        self.revision += 1;
    }

    /// Clears the dirty flag if nothing changed since `revision` was observed.
    ///
    /// # Returns
    /// Whether the flag was cleared.
    pub fn mark_clean_if(&mut self, revision: u64) -> bool {
        if self.revision == revision {
            self.is_dirty = false;
            true
        } else {
            false
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn set_epoch(&mut self, epoch: u64) {
        self.epoch = epoch;
    }

    pub fn version(&self) -> ChunkVersion {
        ChunkVersion {
            epoch: self.epoch,
            revision: self.revision,
        }
    }

    pub fn last_accessed(&self) -> Instant {
        self.last_accessed
    }

    pub(crate) fn touch(&mut self, now: Instant) {
        self.last_accessed = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_height_map_exact(chunk: &Chunk) {
        for z in 0..CHUNK_DIMENSION {
            for x in 0..CHUNK_DIMENSION {
                let expected = (0..CHUNK_HEIGHT)
                    .rev()
                    .find(|&y| chunk.block_type_at(x, y, z).is_solid())
                    .map(|y| y as i32);
                assert_eq!(chunk.height_at(x, z), expected, "column ({x}, {z})");
            }
        }
    }

    #[test]
    fn keys_floor_negative_coordinates() {
        assert_eq!(ChunkKey::containing(0, 15), ChunkKey::new(0, 0));
        assert_eq!(ChunkKey::containing(-1, -16), ChunkKey::new(-1, -1));
        assert_eq!(ChunkKey::containing(-17, 16), ChunkKey::new(-2, 1));
    }

    #[test]
    fn keys_display_and_parse() {
        let key = ChunkKey::new(-3, 12);
        assert_eq!(key.to_string(), "-3,12");
        assert_eq!("-3,12".parse::<ChunkKey>(), Ok(key));
        assert!("3;12".parse::<ChunkKey>().is_err());
    }

    #[test]
    fn placing_above_the_top_raises_the_height() {
        let mut chunk = Chunk::empty(ChunkKey::new(0, 0));
        chunk.replace_block(3, 10, 4, BlockType::STONE);
        assert_eq!(chunk.height_at(3, 4), Some(10));

        chunk.replace_block(3, 5, 4, BlockType::DIRT);
        assert_eq!(chunk.height_at(3, 4), Some(10));

        chunk.replace_block(3, 20, 4, BlockType::WOOD);
        assert_eq!(chunk.height_at(3, 4), Some(20));
        assert_height_map_exact(&chunk);
    }

    #[test]
    fn clearing_the_top_scans_down() {
        let mut chunk = Chunk::empty(ChunkKey::new(0, 0));
        chunk.replace_block(1, 2, 1, BlockType::STONE);
        chunk.replace_block(1, 7, 1, BlockType::STONE);

        chunk.replace_block(1, 7, 1, BlockType::AIR);
        assert_eq!(chunk.height_at(1, 1), Some(2));

        chunk.replace_block(1, 2, 1, BlockType::AIR);
        assert_eq!(chunk.height_at(1, 1), None);
        assert_height_map_exact(&chunk);
    }

    #[test]
    fn clearing_below_the_top_keeps_the_height() {
        let mut chunk = Chunk::empty(ChunkKey::new(0, 0));
        chunk.replace_block(0, 3, 0, BlockType::STONE);
        chunk.replace_block(0, 9, 0, BlockType::STONE);
        chunk.replace_block(0, 3, 0, BlockType::AIR);
        assert_eq!(chunk.height_at(0, 0), Some(9));
    }

    #[test]
    fn edits_keep_metadata_and_bump_revision() {
        let mut chunk = Chunk::empty(ChunkKey::new(1, 1));
        let metadata = BlockMetadata {
            moisture: 0.4,
            temperature: 0.6,
            hardness: 0.6,
        };
        chunk.set_metadata(2, 40, 2, metadata);
        let revision = chunk.revision();

        let previous = chunk.replace_block(2, 40, 2, BlockType::SAND);

        assert_eq!(previous, BlockType::AIR);
        assert_eq!(chunk.metadata_at(2, 40, 2), Some(metadata));
        assert!(chunk.is_dirty());
        assert!(chunk.revision() > revision);
        let block = chunk.block_at(2, 40, 2);
        assert_eq!(block.position, Point3::new(18, 40, 18));
        assert_eq!(block.block_type, BlockType::SAND);
    }

    #[test]
    fn stale_revision_does_not_clear_dirty() {
        let mut chunk = Chunk::empty(ChunkKey::new(0, 0));
        chunk.mark_dirty();
        let observed = chunk.revision();
        chunk.replace_block(0, 0, 0, BlockType::STONE);

        assert!(!chunk.mark_clean_if(observed));
        assert!(chunk.is_dirty());
        assert!(chunk.mark_clean_if(chunk.revision()));
        assert!(!chunk.is_dirty());
    }

    #[test]
    fn out_of_range_lookups_are_none() {
        let chunk = Chunk::empty(ChunkKey::new(0, 0));
        assert_eq!(chunk.get_block_type(0, -1, 0), None);
        assert_eq!(chunk.get_block_type(0, WORLD_HEIGHT, 0), None);
        assert_eq!(chunk.get_block_type(16, 0, 0), None);
        assert_eq!(chunk.get_block_type(15, 255, 15), Some(BlockType::AIR));
    }
}
