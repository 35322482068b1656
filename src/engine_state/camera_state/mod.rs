//! # Camera State
//!
//! Camera and projection math plus frustum extraction, used to decide which
//! chunks are worth meshing.
//!
//! ## Core Components
//! - `Camera`: position and orientation in 3D space
//! - `Projection`: perspective projection settings
//! - `ViewerPose`: snapshot of the camera handed to the chunk manager each tick
//! - `Frustum`: plane set used to cull chunk columns

pub mod camera;
pub mod frustum;

pub use camera::{Camera, Projection, ViewerPose};
pub use frustum::Frustum;
