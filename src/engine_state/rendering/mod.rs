//! Rendering-side data of the voxel engine.
//!
//! This module produces everything a renderer needs to draw chunks: mesh
//! buffers, the snapshot and meshing logic behind them, and the background task
//! that builds them. Drawing itself is left to the embedding application.

pub mod meshing;
pub mod tasks;
