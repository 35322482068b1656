#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Terrain
//!
//! Deterministic terrain generation and chunk streaming for a voxel world.
//!
//! ## Key Modules
//!
//! * `config` - Runtime tunables, loadable from JSON
//! * `core` - Shared primitives: the LRU/TTL cache and the shared resource handle
//! * `engine_state` - Terrain synthesis, the chunk store, meshing, and the chunk
//!   manager that drives them
//! * `error` - The crate's error type
//!
//! ## Architecture
//!
//! * Terrain is a pure function of the seed and chunk coordinates
//! * Chunks and meshes live in two independent bounded caches
//! * Meshing runs on a fixed pool of worker threads (web workers on WASM)
//! * Rendering is left to the embedding application, which pulls finished
//!   mesh buffers by chunk key
//!
//! ## Usage
//!
//! ```no_run
//! fn main() {
//!     voxel_terrain::run();
//! }
//! ```

use cgmath::Deg;
#[cfg(target_family = "wasm")]
use wasm_bindgen::prelude::wasm_bindgen;

use config::EngineConfig;
use engine_state::EngineState;
use log::{error, info};

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

/// Number of ticks `run` drives before shutting down.
pub const SESSION_TICKS: usize = 24;

/// Degrees the camera turns between ticks in `run`.
const SWEEP_STEP_DEGREES: f32 = 15.0;

/// Initialises logging. Safe to call more than once.
#[cfg(not(target_family = "wasm"))]
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    let _ = log_builder
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .try_init();
}

/// Initialises logging. Safe to call more than once.
#[cfg(target_family = "wasm")]
pub fn init_logging() {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    let _ = console_log::init_with_level(log::Level::Info);
}

/// Runs a headless session: loads the configuration, sweeps the camera around
/// the spawn point for [`SESSION_TICKS`] ticks and logs what was streamed.
pub fn run() {
    init_logging();
    info!("Logger initialized");

    let config = match EngineConfig::load() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            return;
        }
    };
    info!("Seed {}, view distance {} chunks", config.seed, config.view_distance);

    let mut engine_state = EngineState::new(config);
    for tick in 0..SESSION_TICKS {
        let summary = pollster::block_on(engine_state.update());
        info!(
            "Tick {}: {} visible, {} meshed, {} failed",
            tick, summary.visible, summary.completed, summary.failed
        );
        engine_state.camera.rotate(Deg(SWEEP_STEP_DEGREES), Deg(0.0));
    }

    let stats = engine_state.chunk_manager.stats();
    info!(
        "Chunks: {} resident, {} generated, {} evicted, {} expired",
        stats.chunks.resident, stats.chunks.generated, stats.chunks.evicted, stats.chunks.expired
    );
    info!(
        "Meshes: {} resident, {} built, {} released ({} failed releases)",
        stats.meshes_resident, stats.meshes_built, stats.meshes_released, stats.release_failures
    );
    info!(
        "Workers: {} threads, peak {} active, {} completed, {} failed",
        stats.workers.workers, stats.workers.peak_active, stats.workers.completed, stats.workers.failed
    );
    engine_state.chunk_manager.dispose();
}

/// Entry point for web builds.
#[cfg(target_family = "wasm")]
#[wasm_bindgen]
pub fn run_web() {
    run();
}
