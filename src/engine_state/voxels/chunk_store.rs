//! # Chunk Store
//!
//! This module provides the `ChunkStore`, the owner of all resident voxel data.
//! It maps chunk coordinates to generated chunks through a bounded cache and is
//! the only place chunks are created or destroyed.
//!
//! ## Cache Discipline
//!
//! - A miss generates the chunk synchronously and caches it.
//! - A hit refreshes the chunk's recency.
//! - Every generated chunk gets a new epoch, so a chunk regenerated after
//!   leaving the store is distinguishable from its earlier residency.
//! - Inserting into a full cache evicts the least recently used chunk.
//! - Chunks idle for longer than the TTL are purged at the start of every
//!   operation, independently of capacity.
//!
//! Chunks leaving the store are released by a hook that only logs and counts.
//! Releasing never fails and never aborts the caller.
//!
//! ## Coordinates
//!
//! World block coordinates are split into a chunk key and local coordinates
//! with floored division, so negative coordinates map to the chunk on their
//! negative side (x = -1 lives in chunk -1 at local x = 15).

use cgmath::Point3;
use log::debug;
use web_time::Instant;

use crate::{
    config::EngineConfig,
    core::LruTtlCache,
    engine_state::voxels::{
        block::{block_type::BlockType, Block},
        chunk::{Chunk, ChunkKey, ChunkVersion, CHUNK_SIZE, WORLD_HEIGHT},
        terrain::TerrainSynthesizer,
    },
};

/// Why a chunk left the store.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReleaseReason {
    Evicted,
    Expired,
    Cleared,
}

/// Counters describing the store since it was created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkStoreStats {
    pub resident: usize,
    pub capacity: usize,
    pub generated: u64,
    pub evicted: u64,
    pub expired: u64,
}

/// The outcome of a `set_block` that touched the world.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BlockEdit {
    /// The chunk that owns the edited voxel.
    pub key: ChunkKey,
    /// Chunk-relative coordinates of the voxel.
    pub local: Point3<usize>,
    /// The block type that was replaced.
    pub previous: BlockType,
}

/// Bounded, generate-on-miss cache of voxel chunks.
pub struct ChunkStore {
    chunks: LruTtlCache<ChunkKey, Chunk>,
    synthesizer: TerrainSynthesizer,
    stats: ChunkStoreStats,
    next_epoch: u64,
}

/// Splits world coordinates into the owning chunk and local coordinates.
///
/// # Returns
/// `None` when `y` is outside `[0, WORLD_HEIGHT)`.
pub fn split_world_position(x: i32, y: i32, z: i32) -> Option<(ChunkKey, Point3<usize>)> {
    if !(0..WORLD_HEIGHT).contains(&y) {
        return None;
    }
    let key = ChunkKey::containing(x, z);
    let local = Point3::new(
        x.rem_euclid(CHUNK_SIZE) as usize,
        y as usize,
        z.rem_euclid(CHUNK_SIZE) as usize,
    );
    Some((key, local))
}

impl ChunkStore {
    /// Creates a store sized from the engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_capacity(
            TerrainSynthesizer::new(config.seed),
            config.chunk_cache_capacity,
            config.chunk_cache_ttl(),
        )
    }

    /// Creates a store with an explicit generator and cache bounds.
    pub fn with_capacity(
        synthesizer: TerrainSynthesizer,
        capacity: usize,
        ttl: web_time::Duration,
    ) -> Self {
        let chunks = LruTtlCache::new(capacity, ttl);
        let stats = ChunkStoreStats {
            capacity: chunks.capacity(),
            ..ChunkStoreStats::default()
        };
        Self {
            chunks,
            synthesizer,
            stats,
            next_epoch: 1,
        }
    }

    pub fn synthesizer(&self) -> &TerrainSynthesizer {
        &self.synthesizer
    }

    /// Returns the chunk at chunk coordinates, generating it on a miss.
    ///
    /// The chunk becomes the most recently used one.
    pub fn get_chunk(&mut self, chunk_x: i32, chunk_z: i32) -> &Chunk {
        let now = Instant::now();
        self.purge_expired_at(now);
        self.resolve_mut(ChunkKey::new(chunk_x, chunk_z), now)
    }

    /// Looks up a block by world coordinates.
    ///
    /// # Returns
    /// `None` when `y` is out of range or the owning chunk is not resident.
    /// `None` means "unknown", not air.
    pub fn get_block(&mut self, x: i32, y: i32, z: i32) -> Option<Block> {
        let (key, local) = split_world_position(x, y, z)?;
        let now = Instant::now();
        self.purge_expired_at(now);

        let chunk = self.chunks.get(&key, now)?;
        chunk.touch(now);
        Some(chunk.block_at(local.x, local.y, local.z))
    }

    /// Writes a block by world coordinates.
    ///
    /// Out-of-range `y` is a no-op. Otherwise the owning chunk is generated if
    /// needed, the block is replaced (metadata kept), the chunk is marked dirty
    /// and its height map is updated incrementally.
    ///
    /// # Returns
    /// Where the edit landed, or `None` for a no-op.
    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block_type: BlockType) -> Option<BlockEdit> {
        let (key, local) = split_world_position(x, y, z)?;
        let now = Instant::now();
        self.purge_expired_at(now);

        let chunk = self.resolve_mut(key, now);
        let previous = chunk.replace_block(local.x, local.y, local.z, block_type);
        Some(BlockEdit {
            key,
            local,
            previous,
        })
    }

    /// Returns a resident chunk without generating it or refreshing its recency.
    pub fn peek_chunk(&self, key: &ChunkKey) -> Option<&Chunk> {
        self.chunks.peek(key)
    }

    pub fn contains(&self, key: &ChunkKey) -> bool {
        self.chunks.contains(key)
    }

    /// Marks a resident chunk dirty.
    ///
    /// # Returns
    /// `false` if the chunk is not resident.
    pub fn mark_dirty(&mut self, key: &ChunkKey) -> bool {
        match self.chunks.peek_mut(key) {
            Some(chunk) => {
                chunk.mark_dirty();
                true
            }
            None => false,
        }
    }

    /// Refreshes the recency of a resident chunk without generating it.
    ///
    /// # Returns
    /// `false` if the chunk is not resident.
    pub fn touch_chunk(&mut self, key: &ChunkKey, now: Instant) -> bool {
        match self.chunks.get(key, now) {
            Some(chunk) => {
                chunk.touch(now);
                true
            }
            None => false,
        }
    }

    /// Clears a resident chunk's dirty flag if it is still at `version`.
    pub fn mark_clean_if(&mut self, key: &ChunkKey, version: ChunkVersion) -> bool {
        self.chunks
            .peek_mut(key)
            .filter(|chunk| chunk.epoch() == version.epoch)
            .is_some_and(|chunk| chunk.mark_clean_if(version.revision))
    }

    /// Drops every chunk idle for longer than the TTL.
    pub fn purge_expired(&mut self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    /// Like [`ChunkStore::purge_expired`] with an explicit clock reading.
    pub fn purge_expired_at(&mut self, now: Instant) -> usize {
        let expired = self.chunks.purge_expired(now);
        let count = expired.len();
        for (key, chunk) in expired {
            self.release_chunk(key, chunk, ReleaseReason::Expired);
        }
        count
    }

    /// Drops every resident chunk.
    pub fn clear(&mut self) {
        for (key, chunk) in self.chunks.drain() {
            self.release_chunk(key, chunk, ReleaseReason::Cleared);
        }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.chunks.capacity()
    }

    /// Resident keys from most to least recently used.
    pub fn resident_keys(&self) -> Vec<ChunkKey> {
        self.chunks.keys()
    }

    pub fn stats(&self) -> ChunkStoreStats {
        ChunkStoreStats {
            resident: self.chunks.len(),
            ..self.stats
        }
    }

    /// Finds or generates the chunk for `key` and marks it as just used.
    fn resolve_mut(&mut self, key: ChunkKey, now: Instant) -> &mut Chunk {
        let synthesizer = &self.synthesizer;
        let stats = &mut self.stats;
        let next_epoch = &mut self.next_epoch;
        let (chunk, evicted) = self.chunks.get_or_insert_with(key, now, || {
            stats.generated += 1;
            let mut chunk = synthesizer.generate_chunk(key.x, key.z);
            chunk.set_epoch(*next_epoch);
            *next_epoch += 1;
            chunk
        });
        for (evicted_key, evicted_chunk) in evicted {
            Self::release(&mut self.stats, evicted_key, evicted_chunk, ReleaseReason::Evicted);
        }
        chunk.touch(now);
        chunk
    }

    /// Releases whatever a chunk holds once it leaves the store.
    fn release_chunk(&mut self, key: ChunkKey, chunk: Chunk, reason: ReleaseReason) {
        Self::release(&mut self.stats, key, chunk, reason);
    }

    fn release(stats: &mut ChunkStoreStats, key: ChunkKey, chunk: Chunk, reason: ReleaseReason) {
        match reason {
            ReleaseReason::Evicted => stats.evicted += 1,
            ReleaseReason::Expired => stats.expired += 1,
            ReleaseReason::Cleared => {}
        }
        debug!(
            "Released chunk {} ({:?}, dirty: {}, version: {})",
            key,
            reason,
            chunk.is_dirty(),
            chunk.version()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::WATER_LEVEL;
    use web_time::Duration;

    fn store(capacity: usize) -> ChunkStore {
        ChunkStore::with_capacity(
            TerrainSynthesizer::new(4242),
            capacity,
            Duration::from_secs(300),
        )
    }

    #[test]
    fn misses_generate_once() {
        let mut store = store(8);
        let first = store.get_chunk(1, 2).clone();
        let second = store.get_chunk(1, 2).clone();

        assert_eq!(first, second);
        assert_eq!(store.stats().generated, 1);
        assert!(first.is_generated());
    }

    #[test]
    fn resident_count_is_bounded_and_lru_is_evicted() {
        let mut store = store(3);
        store.get_chunk(0, 0);
        store.get_chunk(1, 0);
        store.get_chunk(2, 0);
        store.get_chunk(0, 0);
        store.get_chunk(3, 0);

        assert_eq!(store.len(), 3);
        assert!(!store.contains(&ChunkKey::new(1, 0)));
        assert_eq!(
            store.resident_keys(),
            vec![ChunkKey::new(3, 0), ChunkKey::new(0, 0), ChunkKey::new(2, 0)]
        );
        assert_eq!(store.stats().evicted, 1);
    }

    #[test]
    fn set_then_get_round_trips_every_block_type() {
        let mut store = store(8);
        for (i, block_type) in BlockType::ALL.into_iter().enumerate() {
            let (x, y, z) = (-5 - i as i32, 100 + i as i32, 37);
            store.set_block(x, y, z, block_type);
            let block = store.get_block(x, y, z).map(|b| b.block_type);
            assert_eq!(block, Some(block_type));
        }
    }

    #[test]
    fn out_of_range_heights_are_ignored() {
        let mut store = store(8);
        let below = store.get_block(4, 0, 4);
        assert!(below.is_none(), "chunk is not resident yet");

        assert_eq!(store.set_block(4, -1, 4, BlockType::STONE), None);
        assert_eq!(store.set_block(4, WORLD_HEIGHT, 4, BlockType::STONE), None);
        assert!(store.is_empty());

        store.get_chunk(0, 0);
        assert!(store.get_block(4, -1, 4).is_none());
        assert!(store.get_block(4, WORLD_HEIGHT, 4).is_none());
        assert_eq!(
            store.get_block(4, 0, 4).map(|b| b.block_type),
            Some(BlockType::STONE)
        );
    }

    #[test]
    fn negative_coordinates_resolve_with_floored_division() {
        assert_eq!(
            split_world_position(-1, 10, -17),
            Some((ChunkKey::new(-1, -2), Point3::new(15, 10, 15)))
        );
        let mut store = store(8);
        let edit = store.set_block(-16, 200, 0, BlockType::WOOD);
        assert_eq!(
            edit.map(|e| (e.key, e.local)),
            Some((ChunkKey::new(-1, 0), Point3::new(0, 200, 0)))
        );
        let block = store.get_block(-16, 200, 0);
        assert_eq!(block.map(|b| b.position), Some(Point3::new(-16, 200, 0)));
    }

    #[test]
    fn clearing_the_surface_lowers_the_height_map() {
        let mut store = store(8);
        let top = store.get_chunk(0, 0).height_at(8, 8).unwrap_or(0);
        assert!(top >= WATER_LEVEL);

        let edit = store.set_block(8, top, 8, BlockType::AIR);

        assert!(edit.is_some());
        let chunk = store.get_chunk(0, 0);
        assert!(chunk.is_dirty());
        let new_top = chunk.height_at(8, 8).unwrap_or(-1);
        assert!(new_top < top);
        assert!(chunk.block_type_at(8, new_top as usize, 8).is_solid());
        for y in (new_top + 1)..WORLD_HEIGHT {
            assert!(chunk.block_type_at(8, y as usize, 8).is_air());
        }
    }

    #[test]
    fn edits_keep_surface_metadata() {
        let mut store = store(8);
        let chunk = store.get_chunk(0, 0);
        let (x, z) = (3, 3);
        let top = chunk.height_at(x, z).unwrap_or(0) as usize;
        let metadata = (0..=top).rev().find_map(|y| chunk.metadata_at(x, y, z).map(|m| (y, m)));
        let Some((y, metadata)) = metadata else {
            return;
        };

        store.set_block(x as i32, y as i32, z as i32, BlockType::STONE);

        let block = store.get_block(x as i32, y as i32, z as i32);
        assert_eq!(block.and_then(|b| b.metadata), Some(metadata));
    }

    #[test]
    fn idle_chunks_expire() {
        let mut store = ChunkStore::with_capacity(
            TerrainSynthesizer::new(1),
            8,
            Duration::from_secs(10),
        );
        store.get_chunk(0, 0);

        let purged = store.purge_expired_at(Instant::now() + Duration::from_secs(11));

        assert_eq!(purged, 1);
        assert!(store.is_empty());
        assert_eq!(store.stats().expired, 1);
    }

    #[test]
    fn mark_clean_respects_revisions() {
        let mut store = store(8);
        store.set_block(1, 90, 1, BlockType::DIRT);
        let key = ChunkKey::new(0, 0);
        let version = store.peek_chunk(&key).map(Chunk::version).unwrap_or_default();

        store.set_block(2, 90, 1, BlockType::DIRT);
        assert!(!store.mark_clean_if(&key, version));

        let version = store.peek_chunk(&key).map(Chunk::version).unwrap_or_default();
        assert!(store.mark_clean_if(&key, version));
        assert_eq!(store.peek_chunk(&key).map(Chunk::is_dirty), Some(false));
        assert!(!store.mark_dirty(&ChunkKey::new(50, 50)));
    }

    #[test]
    fn regenerated_chunks_get_a_new_epoch() {
        let mut store = store(1);
        let key = ChunkKey::new(0, 0);
        store.set_block(3, 120, 3, BlockType::STONE);
        let before = store.peek_chunk(&key).map(Chunk::version).unwrap_or_default();

        store.get_chunk(1, 0);
        assert!(!store.contains(&key));
        let after = store.get_chunk(0, 0).version();

        assert_ne!(before.epoch, after.epoch);
        assert_eq!(after.revision, 0);
        store.set_block(3, 120, 3, BlockType::STONE);
        assert!(!store.mark_clean_if(&key, before));
        assert_eq!(store.peek_chunk(&key).map(Chunk::is_dirty), Some(true));
    }

    #[test]
    fn touch_keeps_resident_chunks_alive_without_generating() {
        let mut store = ChunkStore::with_capacity(
            TerrainSynthesizer::new(4242),
            4,
            Duration::from_secs(10),
        );
        let start = Instant::now();
        store.get_chunk(0, 0);

        assert!(store.touch_chunk(&ChunkKey::new(0, 0), start + Duration::from_secs(8)));
        assert!(!store.touch_chunk(&ChunkKey::new(5, 5), start));
        assert_eq!(store.purge_expired_at(start + Duration::from_secs(15)), 0);
        assert!(store.contains(&ChunkKey::new(0, 0)));
        assert_eq!(store.stats().generated, 1);
    }
}
