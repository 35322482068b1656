//! # Engine State Module
//!
//! The terrain engine's subsystems and the session state that ties them together.
//!
//! ## Key Components
//!
//! * `EngineState` - One world session: a camera and the chunk manager it drives
//! * `camera_state` - Camera, projection and frustum math
//! * `chunk_manager` - Visibility, LOD and meshing orchestration
//! * `rendering` - Chunk snapshots, mesh generation and the meshing task
//! * `task_management` - The mesh worker pool
//! * `voxels` - Blocks, chunks, terrain generation and the chunk store
//!
//! ## Architecture
//!
//! Terrain generation runs synchronously on the coordinating thread, inside the
//! chunk store. Meshing runs on the worker pool. `EngineState` owns one of each
//! and is the only thing an embedding application needs to construct.

use cgmath::{Deg, Point3};

use crate::config::EngineConfig;

use camera_state::camera::{Camera, Projection};
use chunk_manager::{ChunkManager, TickSummary};
use voxels::chunk::CHUNK_SIZE;

pub mod camera_state;
pub mod chunk_manager;
pub mod rendering;
pub mod task_management;
pub mod voxels;

/// Height of the camera above the ground at spawn.
const SPAWN_EYE_HEIGHT: f32 = 2.0;

/// The state of one world session.
///
/// # Examples
///
/// ```no_run
/// use voxel_terrain::{config::EngineConfig, engine_state::EngineState};
///
/// let mut engine_state = EngineState::new(EngineConfig::default());
/// let summary = pollster::block_on(engine_state.update());
/// println!("meshed {} chunks", summary.completed);
/// engine_state.chunk_manager.dispose();
/// ```
pub struct EngineState {
    /// The viewer; it is also the player position used for LOD.
    pub camera: Camera,
    pub projection: Projection,
    pub chunk_manager: ChunkManager,
}

impl EngineState {
    /// Creates a session with the camera standing on the terrain at the
    /// centre of chunk (0, 0).
    pub fn new(config: EngineConfig) -> Self {
        let chunk_manager = ChunkManager::new(config);
        let spawn = CHUNK_SIZE / 2;
        let ground = chunk_manager
            .store()
            .get()
            .synthesizer()
            .height(spawn, spawn);
        let camera = Camera::new(
            Point3::new(spawn as f32, ground as f32 + 1.0 + SPAWN_EYE_HEIGHT, spawn as f32),
            Deg(0.0),
            Deg(-15.0),
        );
        let projection = Projection::new(1280, 720, Deg(70.0), 0.1, 1000.0);
        Self {
            camera,
            projection,
            chunk_manager,
        }
    }

    /// Resizes the viewport the projection is built for.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.resize(width, height);
    }

    /// Runs one streaming tick from the current camera.
    pub async fn update(&mut self) -> TickSummary {
        let pose = self.camera.viewer_pose(&self.projection);
        self.chunk_manager
            .update_chunks(&pose, self.camera.position)
            .await
    }
}
