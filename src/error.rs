//! # Engine Errors
//!
//! The core has no fatal error class. Out-of-range block access yields `None` or a
//! no-op, missing chunks are generated, and disposal failures are logged at the
//! eviction site. What remains is surfaced through [`EngineError`]: configuration
//! problems at startup, and per-job failures from the mesh worker pool.

use std::path::PathBuf;

use thiserror::Error;

use crate::engine_state::voxels::chunk::ChunkKey;

/// Errors produced by the terrain engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A configuration value is out of its accepted range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configuration file could not be read.
    #[error("failed to read configuration file {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::config::EngineConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// A meshing job panicked or dropped its result channel.
    #[error("mesh worker failed: {0}")]
    WorkerFailed(String),

    /// A job was submitted after the worker pool was disposed.
    #[error("mesh worker pool has been disposed")]
    PoolDisposed,

    /// The renderer failed to release the GPU-side buffers of a chunk mesh.
    #[error("failed to release geometry for chunk {key}: {reason}")]
    GeometryRelease { key: ChunkKey, reason: String },
}

/// Convenience alias used across the crate.
pub type EngineResult<T> = Result<T, EngineError>;
