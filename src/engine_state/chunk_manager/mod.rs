//! # Chunk Manager
//!
//! Decides which chunks get meshed, at which level of detail, and in which
//! order. Once per tick [`ChunkManager::update_chunks`]:
//!
//! 1. Extracts the view frustum from the viewer pose
//! 2. Collects the chunks within `view_distance` that intersect it
//! 3. Ranks them by distance and view direction ([`priority`])
//! 4. Walks the ranking, resolving each chunk through the store, and submits
//!    meshing jobs for chunks whose mesh is missing, at the wrong LOD, or built
//!    from another version of the chunk, up to the per-tick submission cap.
//!    Visible chunks past the cap are only kept resident
//! 5. Awaits that batch and stores the results in the mesh cache
//!
//! The voxel store and the mesh cache live behind separate [`MtResource`]
//! handles and are never locked together.
//!
//! Mesh buffers handed to a renderer are released through a
//! [`GeometryReleaser`] when they leave the cache. Release failures are logged
//! and counted; the entry is dropped regardless.

pub mod priority;

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use cgmath::{Point3, SquareMatrix};
use futures::future::join_all;
use log::{debug, info, warn};
use web_time::Instant;

use crate::{
    config::EngineConfig,
    core::{LruTtlCache, MtResource},
    engine_state::{
        camera_state::{camera::ViewerPose, frustum::Frustum},
        rendering::meshing::{ChunkMeshData, ChunkMesher, GreedyMesher, MeshSnapshot},
        task_management::{MeshWorkerPool, WorkerPoolStats},
        voxels::{
            block::{block_type::BlockType, Block},
            chunk::{Chunk, ChunkKey, ChunkVersion, CHUNK_DIMENSION},
            chunk_store::{BlockEdit, ChunkStore, ChunkStoreStats},
        },
    },
    error::EngineResult,
};

use priority::{sort_by_priority, ChunkPriority};

/// Frees the renderer-side resources of a chunk mesh.
pub trait GeometryReleaser: Send + Sync {
    /// Called once for every mesh leaving the cache.
    fn release(&self, key: ChunkKey, mesh: &ChunkMeshData) -> EngineResult<()>;
}

/// Releaser for meshes that own nothing outside their buffers.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopReleaser;

impl GeometryReleaser for NoopReleaser {
    fn release(&self, _key: ChunkKey, _mesh: &ChunkMeshData) -> EngineResult<()> {
        Ok(())
    }
}

/// What one call to `update_chunks` did.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Chunks within the view distance.
    pub candidates: usize,
    /// Candidates intersecting the frustum.
    pub visible: usize,
    pub submitted: usize,
    pub completed: usize,
    pub failed: usize,
    /// The visibility pass was skipped because the pose was unusable.
    pub skipped: bool,
}

/// Counters describing the manager since it was created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkManagerStats {
    pub ticks: u64,
    pub last_tick: TickSummary,
    pub meshes_resident: usize,
    pub mesh_capacity: usize,
    pub meshes_built: u64,
    pub meshes_released: u64,
    pub release_failures: u64,
    pub chunks: ChunkStoreStats,
    pub workers: WorkerPoolStats,
}

#[derive(Default)]
struct Counters {
    ticks: u64,
    last_tick: TickSummary,
    meshes_built: u64,
    meshes_released: u64,
    release_failures: u64,
}

/// A meshing job issued during a tick.
struct Submission {
    key: ChunkKey,
    lod_level: usize,
    version: ChunkVersion,
}

/// Coordinates chunk visibility, LOD and meshing for one world session.
pub struct ChunkManager {
    config: EngineConfig,
    store: MtResource<ChunkStore>,
    meshes: MtResource<LruTtlCache<ChunkKey, ChunkMeshData>>,
    pool: MeshWorkerPool,
    releaser: Arc<dyn GeometryReleaser>,
    counters: MtResource<Counters>,
    disposed: AtomicBool,
}

impl ChunkManager {
    /// Creates a manager, its chunk store and its worker pool.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_releaser(config, Arc::new(NoopReleaser))
    }

    /// Like [`ChunkManager::new`] with a renderer-specific releaser.
    pub fn with_releaser(config: EngineConfig, releaser: Arc<dyn GeometryReleaser>) -> Self {
        Self::with_hooks(config, releaser, Arc::new(GreedyMesher))
    }

    /// Like [`ChunkManager::with_releaser`], also choosing how the workers
    /// build meshes.
    pub fn with_hooks(
        config: EngineConfig,
        releaser: Arc<dyn GeometryReleaser>,
        mesher: Arc<dyn ChunkMesher>,
    ) -> Self {
        let store = MtResource::new(ChunkStore::new(&config));
        let meshes = MtResource::new(LruTtlCache::new(
            config.mesh_cache_capacity,
            config.mesh_cache_ttl(),
        ));
        let pool = MeshWorkerPool::with_mesher(config.worker_pool_size, mesher);
        Self {
            config,
            store,
            meshes,
            pool,
            releaser,
            counters: MtResource::new(Counters::default()),
            disposed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Shared handle to the voxel store.
    pub fn store(&self) -> MtResource<ChunkStore> {
        self.store.clone()
    }

    /// Runs one streaming tick and waits for the meshes it submitted.
    ///
    /// # Arguments
    /// * `pose` - Camera matrices and view direction for this tick
    /// * `player_position` - Position LOD distances are measured from
    ///
    /// # Returns
    /// A summary of the tick. Failed jobs are counted there; their chunks stay
    /// dirty or unmeshed and are retried on a later tick.
    pub async fn update_chunks(&self, pose: &ViewerPose, player_position: Point3<f32>) -> TickSummary {
        if self.is_disposed() {
            return TickSummary::default();
        }
        let now = Instant::now();
        self.purge_expired_meshes(now);

        let mut summary = TickSummary::default();
        let Some(view) = pose.camera_world.invert() else {
            warn!("Camera world matrix is not invertible; skipping visibility pass");
            summary.skipped = true;
            self.record_tick(summary);
            return summary;
        };
        let frustum = Frustum::from_view_projection(&(pose.projection * view));

        let mut ranked = self.visible_candidates(&frustum, pose, player_position, &mut summary);
        sort_by_priority(&mut ranked);

        let mut submissions = Vec::new();
        let mut jobs = Vec::new();
        for candidate in &ranked {
            if submissions.len() >= self.config.max_submissions_per_tick {
                // Still on screen, so keep its voxels resident.
                self.store.get_mut().touch_chunk(&candidate.key, now);
                continue;
            }
            let cached = self.cached_mesh(candidate.key, now);
            let snapshot = {
                let mut store = self.store.get_mut();
                let chunk = store.get_chunk(candidate.key.x, candidate.key.z);
                if cached.is_some_and(|mesh| mesh.is_current_for(chunk, candidate.lod_level)) {
                    continue;
                }
                MeshSnapshot::capture(chunk)
            };

            self.release_mesh(candidate.key);
            submissions.push(Submission {
                key: candidate.key,
                lod_level: candidate.lod_level,
                version: snapshot.version,
            });
            jobs.push(self.pool.submit(snapshot, candidate.lod_level));
        }
        summary.submitted = submissions.len();

        let results = join_all(jobs).await;
        let finished = Instant::now();
        for (submission, result) in submissions.into_iter().zip(results) {
            match result {
                Ok(geometry) => {
                    let mesh = ChunkMeshData::new(
                        geometry,
                        submission.lod_level,
                        submission.version,
                        finished,
                    );
                    self.store_mesh(submission.key, mesh, finished);
                    self.store
                        .get_mut()
                        .mark_clean_if(&submission.key, submission.version);
                    summary.completed += 1;
                }
                Err(error) => {
                    warn!("Meshing chunk {} failed: {}", submission.key, error);
                    summary.failed += 1;
                }
            }
        }

        debug!(
            "Tick: {} candidates, {} visible, {} submitted, {} completed, {} failed",
            summary.candidates, summary.visible, summary.submitted, summary.completed, summary.failed
        );
        self.record_tick(summary);
        summary
    }

    /// Latest mesh of a chunk, if one has been built.
    pub fn get_chunk_mesh(&self, chunk_x: i32, chunk_z: i32) -> Option<ChunkMeshData> {
        self.cached_mesh(ChunkKey::new(chunk_x, chunk_z), Instant::now())
    }

    /// Copy of the chunk at chunk coordinates, generating it on a miss.
    pub fn get_chunk(&self, chunk_x: i32, chunk_z: i32) -> Chunk {
        self.store.get_mut().get_chunk(chunk_x, chunk_z).clone()
    }

    /// The block at world coordinates, or `None` when unknown.
    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<Block> {
        self.store.get_mut().get_block(x, y, z)
    }

    /// Writes a block and dirties the neighbours sharing the edited face.
    ///
    /// Only the owning chunk and the chunks across the boundary faces the
    /// voxel touches are dirtied; diagonal neighbours are left alone.
    pub fn set_block(&self, x: i32, y: i32, z: i32, block_type: BlockType) -> Option<BlockEdit> {
        let mut store = self.store.get_mut();
        let edit = store.set_block(x, y, z, block_type)?;
        for neighbour in boundary_neighbours(&edit) {
            if store.mark_dirty(&neighbour) {
                debug!("Edit in chunk {} dirtied neighbour {}", edit.key, neighbour);
            }
        }
        Some(edit)
    }

    /// Drops idle chunks and meshes.
    ///
    /// # Returns
    /// The number of (chunks, meshes) removed.
    pub fn purge_expired(&self) -> (usize, usize) {
        let now = Instant::now();
        let chunks = self.store.get_mut().purge_expired_at(now);
        let meshes = self.purge_expired_meshes(now);
        (chunks, meshes)
    }

    pub fn stats(&self) -> ChunkManagerStats {
        let (meshes_resident, mesh_capacity) = {
            let meshes = self.meshes.get();
            (meshes.len(), meshes.capacity())
        };
        let chunks = self.store.get().stats();
        let counters = self.counters.get();
        ChunkManagerStats {
            ticks: counters.ticks,
            last_tick: counters.last_tick,
            meshes_resident,
            mesh_capacity,
            meshes_built: counters.meshes_built,
            meshes_released: counters.meshes_released,
            release_failures: counters.release_failures,
            chunks,
            workers: self.pool.stats(),
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Stops the workers and releases every mesh and chunk. Calling it again
    /// does nothing.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.pool.dispose();
        let meshes = self.meshes.get_mut().drain();
        for (key, mesh) in meshes {
            self.release_geometry(key, &mesh);
        }
        self.store.get_mut().clear();
        info!("Chunk manager disposed");
    }

    fn visible_candidates(
        &self,
        frustum: &Frustum,
        pose: &ViewerPose,
        player_position: Point3<f32>,
        summary: &mut TickSummary,
    ) -> Vec<ChunkPriority> {
        let center = ChunkKey::containing(
            player_position.x.floor() as i32,
            player_position.z.floor() as i32,
        );
        let radius = self.config.view_distance;
        let mut ranked = Vec::new();
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let key = center.offset(dx, dz);
                summary.candidates += 1;
                if !frustum.intersects_chunk(key) {
                    continue;
                }
                summary.visible += 1;
                ranked.push(ChunkPriority::compute(
                    key,
                    player_position,
                    pose.position,
                    pose.forward,
                    &self.config,
                ));
            }
        }
        ranked
    }

    /// The cached mesh of a chunk, refreshed as just used.
    fn cached_mesh(&self, key: ChunkKey, now: Instant) -> Option<ChunkMeshData> {
        let mut meshes = self.meshes.get_mut();
        let mesh = meshes.get(&key, now)?;
        mesh.last_used = now;
        Some(mesh.clone())
    }

    fn store_mesh(&self, key: ChunkKey, mesh: ChunkMeshData, now: Instant) {
        let displaced = self.meshes.get_mut().insert(key, mesh, now);
        self.counters.get_mut().meshes_built += 1;
        for (displaced_key, displaced_mesh) in displaced {
            self.release_geometry(displaced_key, &displaced_mesh);
        }
    }

    fn release_mesh(&self, key: ChunkKey) {
        let stale = self.meshes.get_mut().remove(&key);
        if let Some(mesh) = stale {
            self.release_geometry(key, &mesh);
        }
    }

    fn purge_expired_meshes(&self, now: Instant) -> usize {
        let expired = self.meshes.get_mut().purge_expired(now);
        let count = expired.len();
        for (key, mesh) in expired {
            self.release_geometry(key, &mesh);
        }
        count
    }

    fn release_geometry(&self, key: ChunkKey, mesh: &ChunkMeshData) {
        let result = self.releaser.release(key, mesh);
        let mut counters = self.counters.get_mut();
        counters.meshes_released += 1;
        if let Err(error) = result {
            counters.release_failures += 1;
            warn!("{}", error);
        }
    }

    fn record_tick(&self, summary: TickSummary) {
        let mut counters = self.counters.get_mut();
        counters.ticks += 1;
        counters.last_tick = summary;
    }
}

impl Drop for ChunkManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Neighbouring chunks across the boundary faces an edit touches.
pub fn boundary_neighbours(edit: &BlockEdit) -> Vec<ChunkKey> {
    let last = CHUNK_DIMENSION - 1;
    let mut neighbours = Vec::with_capacity(2);
    if edit.local.x == 0 {
        neighbours.push(edit.key.offset(-1, 0));
    }
    if edit.local.x == last {
        neighbours.push(edit.key.offset(1, 0));
    }
    if edit.local.z == 0 {
        neighbours.push(edit.key.offset(0, -1));
    }
    if edit.local.z == last {
        neighbours.push(edit.key.offset(0, 1));
    }
    neighbours
}

#[cfg(test)]
mod tests {
    use cgmath::{Deg, Matrix4, Zero};

    use super::*;
    use crate::engine_state::camera_state::camera::{Camera, Projection};

    fn small_config() -> EngineConfig {
        EngineConfig {
            seed: 21,
            view_distance: 1,
            worker_pool_size: 2,
            max_submissions_per_tick: 16,
            ..EngineConfig::default()
        }
    }

    fn pose_at(position: Point3<f32>, yaw: f32) -> ViewerPose {
        let projection = Projection::new(800, 600, Deg(70.0), 0.1, 1000.0);
        Camera::new(position, Deg(yaw), Deg(-10.0)).viewer_pose(&projection)
    }

    #[test]
    fn boundary_edits_name_face_neighbours_only() {
        let edit = |x, z| BlockEdit {
            key: ChunkKey::new(2, 3),
            local: Point3::new(x, 10, z),
            previous: BlockType::AIR,
        };
        assert_eq!(boundary_neighbours(&edit(0, 5)), vec![ChunkKey::new(1, 3)]);
        assert_eq!(boundary_neighbours(&edit(15, 5)), vec![ChunkKey::new(3, 3)]);
        assert!(boundary_neighbours(&edit(7, 7)).is_empty());
        assert_eq!(
            boundary_neighbours(&edit(0, 15)),
            vec![ChunkKey::new(1, 3), ChunkKey::new(2, 4)]
        );
    }

    #[test]
    fn first_tick_meshes_the_chunk_under_the_viewer() {
        let manager = ChunkManager::new(small_config());
        let position = Point3::new(8.0, 90.0, 8.0);

        let summary = pollster::block_on(manager.update_chunks(&pose_at(position, 0.0), position));

        assert!(summary.visible >= 1);
        assert_eq!(summary.completed, summary.submitted);
        let mesh = manager.get_chunk_mesh(0, 0).expect("mesh for the viewer's chunk");
        assert_eq!(mesh.lod_level, 0);
        assert!(!mesh.geometry.is_empty());
    }

    #[test]
    fn second_tick_without_changes_submits_nothing() {
        let manager = ChunkManager::new(small_config());
        let position = Point3::new(8.0, 90.0, 8.0);
        let pose = pose_at(position, 0.0);

        pollster::block_on(manager.update_chunks(&pose, position));
        let second = pollster::block_on(manager.update_chunks(&pose, position));

        assert_eq!(second.submitted, 0);
    }

    #[test]
    fn edits_trigger_a_remesh() {
        let manager = ChunkManager::new(small_config());
        let position = Point3::new(8.0, 90.0, 8.0);
        let pose = pose_at(position, 0.0);
        pollster::block_on(manager.update_chunks(&pose, position));

        manager.set_block(8, 120, 8, BlockType::STONE);
        let tick = pollster::block_on(manager.update_chunks(&pose, position));

        assert_eq!(tick.submitted, 1);
        assert!(!manager.get_chunk(0, 0).is_dirty());
    }

    #[test]
    fn singular_camera_skips_the_tick() {
        let manager = ChunkManager::new(small_config());
        let position = Point3::new(8.0, 90.0, 8.0);
        let mut pose = pose_at(position, 0.0);
        pose.camera_world = Matrix4::zero();

        let summary = pollster::block_on(manager.update_chunks(&pose, position));

        assert!(summary.skipped);
        assert_eq!(summary.submitted, 0);
        assert_eq!(manager.stats().ticks, 1);
    }

    #[test]
    fn dispose_is_idempotent() {
        let manager = ChunkManager::new(small_config());
        let position = Point3::new(8.0, 90.0, 8.0);
        pollster::block_on(manager.update_chunks(&pose_at(position, 0.0), position));

        manager.dispose();
        manager.dispose();

        let stats = manager.stats();
        assert_eq!(stats.meshes_resident, 0);
        assert_eq!(stats.chunks.resident, 0);
        assert!(manager.get_chunk_mesh(0, 0).is_none());
        let after = pollster::block_on(manager.update_chunks(&pose_at(position, 0.0), position));
        assert_eq!(after, TickSummary::default());
    }
}
