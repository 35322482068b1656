//! # Voxel Terrain Entry Point
//!
//! Runs a headless streaming session through the library's `run()` function.
//! Set `VOXEL_CONFIG` to a JSON file to override the defaults and `RUST_LOG`
//! to change verbosity.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --release
//! ```

fn main() {
    #[cfg(not(target_family = "wasm"))]
    voxel_terrain::run();
}
