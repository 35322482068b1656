//! # Engine Configuration
//!
//! Runtime tunables for chunk streaming. The dimensions that size voxel storage
//! (`CHUNK_SIZE`, `WORLD_HEIGHT`, `WATER_LEVEL`) are compile-time constants in
//! [`crate::engine_state::voxels::chunk`]; everything else lives here.
//!
//! Configuration is plain JSON. Missing fields fall back to their defaults, so an
//! empty object `{}` is a valid configuration:
//!
//! ```
//! use voxel_terrain::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "seed": 7, "view_distance": 4 }"#).unwrap();
//! assert_eq!(config.seed, 7);
//! assert_eq!(config.chunk_cache_capacity, 512);
//! ```

use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::error::{EngineError, EngineResult};

/// Environment variable pointing at a JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "VOXEL_CONFIG";

/// All runtime tunables of the terrain engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base seed; every noise generator derives its own seed from it.
    pub seed: u32,
    /// Maximum number of resident voxel chunks.
    pub chunk_cache_capacity: usize,
    /// Idle time after which a voxel chunk is dropped, in seconds.
    pub chunk_cache_ttl_secs: u64,
    /// Maximum number of cached chunk meshes.
    pub mesh_cache_capacity: usize,
    /// Idle time after which a chunk mesh is dropped, in seconds.
    pub mesh_cache_ttl_secs: u64,
    /// Radius, in chunks, of the square of candidate chunks around the player.
    pub view_distance: i32,
    /// Ascending distance thresholds in world units. The LOD level of a chunk is
    /// the index of the first threshold its distance does not exceed.
    pub lod_thresholds: Vec<f32>,
    /// Chunks closer than this (world units) get the close-distance multiplier.
    pub close_distance: f32,
    pub close_priority_multiplier: f32,
    /// Half-angle, in degrees, of the forward view cone.
    pub view_cone_half_angle_deg: f32,
    pub forward_priority_boost: f32,
    /// Number of mesh worker threads; also the ceiling on in-flight jobs.
    pub worker_pool_size: usize,
    /// Maximum number of meshing jobs issued by a single `update_chunks` call.
    pub max_submissions_per_tick: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seed: 1337,
            chunk_cache_capacity: 512,
            chunk_cache_ttl_secs: 300,
            mesh_cache_capacity: 256,
            mesh_cache_ttl_secs: 120,
            view_distance: 8,
            lod_thresholds: vec![32.0, 64.0, 128.0, 256.0],
            close_distance: 48.0,
            close_priority_multiplier: 2.0,
            view_cone_half_angle_deg: 60.0,
            forward_priority_boost: 1.5,
            worker_pool_size: 4,
            max_submissions_per_tick: 4,
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| EngineError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Loads the file named by `VOXEL_CONFIG`, or the defaults when it is unset.
    pub fn load() -> EngineResult<Self> {
        match env::var_os(CONFIG_PATH_ENV) {
            Some(path) => {
                log::info!("Loading engine configuration from {:?}", path);
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> EngineResult<()> {
        if self.chunk_cache_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "chunk_cache_capacity must be at least 1".into(),
            ));
        }
        if self.mesh_cache_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "mesh_cache_capacity must be at least 1".into(),
            ));
        }
        if self.worker_pool_size == 0 {
            return Err(EngineError::InvalidConfig(
                "worker_pool_size must be at least 1".into(),
            ));
        }
        if self.max_submissions_per_tick == 0 {
            return Err(EngineError::InvalidConfig(
                "max_submissions_per_tick must be at least 1".into(),
            ));
        }
        if self.view_distance <= 0 {
            return Err(EngineError::InvalidConfig(
                "view_distance must be positive".into(),
            ));
        }
        if self.lod_thresholds.is_empty() {
            return Err(EngineError::InvalidConfig(
                "lod_thresholds must not be empty".into(),
            ));
        }
        if self
            .lod_thresholds
            .windows(2)
            .any(|pair| !(pair[0] < pair[1]))
        {
            return Err(EngineError::InvalidConfig(format!(
                "lod_thresholds must be strictly ascending, got {:?}",
                self.lod_thresholds
            )));
        }
        if !(0.0..=180.0).contains(&self.view_cone_half_angle_deg) {
            return Err(EngineError::InvalidConfig(format!(
                "view_cone_half_angle_deg must be within [0, 180], got {}",
                self.view_cone_half_angle_deg
            )));
        }
        Ok(())
    }

    pub fn chunk_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.chunk_cache_ttl_secs)
    }

    pub fn mesh_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.mesh_cache_ttl_secs)
    }
}
