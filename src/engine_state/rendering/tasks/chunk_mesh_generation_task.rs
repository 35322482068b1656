//! Task for generating mesh data for chunks in a background thread.
//!
//! This module contains the `ChunkMeshGenerationTask`, which turns a chunk
//! snapshot into mesh buffers on a worker so the coordinating thread stays
//! responsive while faces are culled and merged.

use std::sync::Arc;

use futures::channel::oneshot;

use crate::engine_state::{
    rendering::meshing::{mesh::MeshBuffers, snapshot::MeshSnapshot, ChunkMesher},
    task_management::task::{Task, TaskResult},
};

/// Generates the mesh for one chunk snapshot at a given LOD.
pub struct ChunkMeshGenerationTask {
    snapshot: MeshSnapshot,
    lod_level: usize,
    mesher: Arc<dyn ChunkMesher>,
    /// Receives the finished mesh.
    result_sender: oneshot::Sender<MeshBuffers>,
}

impl ChunkMeshGenerationTask {
    /// Creates a new chunk mesh generation task.
    ///
    /// # Arguments
    /// * `snapshot` - Copy of the chunk's voxels, already in world space
    /// * `lod_level` - Target level of detail
    /// * `mesher` - Builds the buffers
    /// * `result_sender` - Channel the mesh is delivered on
    pub fn new(
        snapshot: MeshSnapshot,
        lod_level: usize,
        mesher: Arc<dyn ChunkMesher>,
        result_sender: oneshot::Sender<MeshBuffers>,
    ) -> Self {
        ChunkMeshGenerationTask {
            snapshot,
            lod_level,
            mesher,
            result_sender,
        }
    }
}

impl Task for ChunkMeshGenerationTask {
    fn name(&self) -> String {
        format!("mesh chunk {} at LOD {}", self.snapshot.key, self.lod_level)
    }

    fn process(self: Box<Self>) -> Box<dyn TaskResult> {
        let mesh = self.mesher.mesh(&self.snapshot, self.lod_level);
        log::trace!(
            "Meshed chunk {} at LOD {}: {} quads",
            self.snapshot.key,
            self.lod_level,
            mesh.face_count()
        );
        Box::new(ChunkMeshGenerationTaskResult {
            mesh,
            result_sender: self.result_sender,
        })
    }
}

/// A finished chunk mesh on its way to the submitter.
pub struct ChunkMeshGenerationTaskResult {
    mesh: MeshBuffers,
    result_sender: oneshot::Sender<MeshBuffers>,
}

impl TaskResult for ChunkMeshGenerationTaskResult {
    fn handle_result(self: Box<Self>) {
        // The submitter may have stopped waiting; the mesh is then discarded.
        let _ = self.result_sender.send(self.mesh);
    }
}
