//! # Chunk Meshing
//!
//! Converts chunk voxels into renderable buffers.
//!
//! - [`snapshot`]: copies a chunk so it can be meshed off-thread
//! - [`mesh`]: visible-face culling, face merging and the buffer layout
//!
//! Finished meshes are cached by the chunk manager as [`ChunkMeshData`].

pub mod mesh;
pub mod snapshot;

use std::sync::Arc;

use web_time::Instant;

use crate::engine_state::voxels::chunk::{Chunk, ChunkVersion};

pub use mesh::{generate_mesh, MeshBuffers};
pub use snapshot::MeshSnapshot;

/// Turns snapshots into buffers on a mesh worker.
pub trait ChunkMesher: Send + Sync + 'static {
    fn mesh(&self, snapshot: &MeshSnapshot, lod_level: usize) -> MeshBuffers;
}

/// Face culling, with coplanar faces merged from LOD 1 up.
#[derive(Copy, Clone, Debug, Default)]
pub struct GreedyMesher;

impl ChunkMesher for GreedyMesher {
    fn mesh(&self, snapshot: &MeshSnapshot, lod_level: usize) -> MeshBuffers {
        generate_mesh(snapshot, lod_level)
    }
}

/// A cached chunk mesh.
#[derive(Clone, Debug)]
pub struct ChunkMeshData {
    /// The buffers, shared with whoever is rendering them.
    pub geometry: Arc<MeshBuffers>,
    pub lod_level: usize,
    pub last_used: Instant,
    /// Chunk version the mesh was built from.
    pub version: ChunkVersion,
}

impl ChunkMeshData {
    pub fn new(geometry: MeshBuffers, lod_level: usize, version: ChunkVersion, now: Instant) -> Self {
        Self {
            geometry: Arc::new(geometry),
            lod_level,
            last_used: now,
            version,
        }
    }

    /// Whether the mesh still shows `chunk` at `lod_level`.
    ///
    /// A dirty chunk, a different LOD, or a chunk that was edited or
    /// regenerated since the mesh was built all make it stale.
    pub fn is_current_for(&self, chunk: &Chunk, lod_level: usize) -> bool {
        self.lod_level == lod_level && self.version == chunk.version() && !chunk.is_dirty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::{block::block_type::BlockType, chunk::ChunkKey};

    #[test]
    fn meshes_go_stale_on_edits_and_lod_changes() {
        let mut chunk = Chunk::empty(ChunkKey::new(0, 0));
        let mesh = ChunkMeshData::new(MeshBuffers::default(), 0, chunk.version(), Instant::now());

        assert!(mesh.is_current_for(&chunk, 0));
        assert!(!mesh.is_current_for(&chunk, 1));

        chunk.replace_block(1, 1, 1, BlockType::STONE);
        let revision = chunk.revision();
        chunk.mark_clean_if(revision);
        assert!(!chunk.is_dirty());
        assert!(!mesh.is_current_for(&chunk, 0));
    }

    #[test]
    fn meshes_go_stale_when_the_chunk_is_regenerated() {
        let chunk = Chunk::empty(ChunkKey::new(0, 0));
        let mesh = ChunkMeshData::new(MeshBuffers::default(), 0, chunk.version(), Instant::now());

        let mut regenerated = chunk.clone();
        regenerated.set_epoch(chunk.epoch() + 1);
        assert_eq!(regenerated.revision(), chunk.revision());
        assert!(!mesh.is_current_for(&regenerated, 0));
    }
}
