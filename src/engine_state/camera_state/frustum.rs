//! View frustum culling for chunk columns.
//!
//! Planes are extracted from the combined view-projection matrix. Each plane
//! `(a, b, c, d)` keeps the points where `a*x + b*y + c*z + d >= 0`. Depth is
//! expected in the `[0, 1]` range produced by [`super::camera::Projection`].

use cgmath::{Matrix, Matrix4, Point3, Vector4};

use crate::engine_state::voxels::chunk::{ChunkKey, CHUNK_DIMENSION, CHUNK_HEIGHT};

/// Six clipping planes: left, right, bottom, top, near, far.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frustum {
    planes: [Vector4<f32>; 6],
}

impl Frustum {
    /// Extracts the planes of a view-projection matrix.
    pub fn from_view_projection(view_projection: &Matrix4<f32>) -> Self {
        let row = |i: usize| view_projection.row(i);
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));
        Self {
            planes: [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2],
        }
    }

    /// Whether the axis-aligned box `[min, max]` is at least partly inside.
    ///
    /// Tests the corner furthest along each plane normal; the box is rejected
    /// only if that corner is outside some plane.
    pub fn intersects_aabb(&self, min: Point3<f32>, max: Point3<f32>) -> bool {
        self.planes.iter().all(|plane| {
            let x = if plane.x >= 0.0 { max.x } else { min.x };
            let y = if plane.y >= 0.0 { max.y } else { min.y };
            let z = if plane.z >= 0.0 { max.z } else { min.z };
            plane.x * x + plane.y * y + plane.z * z + plane.w >= 0.0
        })
    }

    /// Whether any part of the full-height column of `key` is inside.
    pub fn intersects_chunk(&self, key: ChunkKey) -> bool {
        let (min, max) = chunk_bounds(key);
        self.intersects_aabb(min, max)
    }
}

/// World-space bounds of a chunk column.
pub fn chunk_bounds(key: ChunkKey) -> (Point3<f32>, Point3<f32>) {
    let origin = key.world_origin();
    let size = CHUNK_DIMENSION as f32;
    let min = Point3::new(origin.x as f32, 0.0, origin.z as f32);
    let max = Point3::new(min.x + size, CHUNK_HEIGHT as f32, min.z + size);
    (min, max)
}
