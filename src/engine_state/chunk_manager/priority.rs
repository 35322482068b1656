//! Per-tick chunk ranking: LOD selection and meshing priority.

use std::cmp::Ordering;

use cgmath::{InnerSpace, Point3, Vector3};

use crate::{
    config::EngineConfig,
    engine_state::voxels::chunk::{ChunkKey, CHUNK_SIZE, WORLD_HEIGHT},
};

/// Transient ranking record computed once per tick for each visible chunk.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChunkPriority {
    pub key: ChunkKey,
    /// Horizontal distance from the player to the chunk centre, in world units.
    pub distance: f32,
    /// Angle between the view direction and the direction to the chunk's
    /// vertical axis, aimed at the height the line of sight reaches there.
    pub angle_to_view: f32,
    pub lod_level: usize,
    pub priority: f32,
}

impl ChunkPriority {
    /// Ranks a chunk relative to the player and the camera.
    ///
    /// # Arguments
    /// * `key` - The chunk to rank
    /// * `player_position` - Position distances are measured from
    /// * `eye` - Camera position, the origin of the view cone
    /// * `forward` - Normalized view direction
    /// * `config` - LOD thresholds and priority tunables
    pub fn compute(
        key: ChunkKey,
        player_position: Point3<f32>,
        eye: Point3<f32>,
        forward: Vector3<f32>,
        config: &EngineConfig,
    ) -> Self {
        let center = chunk_center(key);
        let distance = horizontal_distance(player_position, center);
        let lod_level = lod_for_distance(distance, &config.lod_thresholds);

        let to_chunk = sight_point(center, eye, forward) - eye;
        let angle_to_view = if to_chunk.magnitude2() > f32::EPSILON {
            forward.angle(to_chunk).0
        } else {
            0.0
        };

        let mut priority = 1.0;
        if distance < config.close_distance {
            priority *= config.close_priority_multiplier;
        }
        if angle_to_view <= config.view_cone_half_angle_deg.to_radians() {
            priority *= config.forward_priority_boost;
        }

        Self {
            key,
            distance,
            angle_to_view,
            lod_level,
            priority,
        }
    }
}

/// Level of detail for a chunk at `distance`.
///
/// The index of the first threshold the distance does not exceed, or one past
/// the last threshold beyond the farthest one.
pub fn lod_for_distance(distance: f32, thresholds: &[f32]) -> usize {
    thresholds
        .iter()
        .position(|&threshold| distance <= threshold)
        .unwrap_or(thresholds.len())
}

/// Centre of a chunk column at ground level.
pub fn chunk_center(key: ChunkKey) -> Point3<f32> {
    let origin = key.world_origin();
    let half = CHUNK_SIZE as f32 / 2.0;
    Point3::new(origin.x as f32 + half, 0.0, origin.z as f32 + half)
}

/// Where the line of sight crosses the chunk's vertical axis, at the chunk's
/// horizontal distance and clamped to the world's height. Looking steeply up
/// or down thereby still aims at nearby columns.
fn sight_point(center: Point3<f32>, eye: Point3<f32>, forward: Vector3<f32>) -> Point3<f32> {
    let top = WORLD_HEIGHT as f32;
    let level = forward.x.hypot(forward.z);
    let y = if level > f32::EPSILON {
        eye.y + forward.y * horizontal_distance(eye, center) / level
    } else if forward.y < 0.0 {
        0.0
    } else {
        top
    };
    Point3::new(center.x, y.clamp(0.0, top), center.z)
}

fn horizontal_distance(a: Point3<f32>, b: Point3<f32>) -> f32 {
    (a.x - b.x).hypot(a.z - b.z)
}

/// Sorts candidates by descending priority, nearest first on ties.
pub fn sort_by_priority(candidates: &mut [ChunkPriority]) {
    candidates.sort_by(|a, b| {
        b.priority
            .partial_cmp(&a.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal))
            .then_with(|| a.key.cmp(&b.key))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    #[test]
    fn lod_buckets_follow_the_thresholds() {
        let thresholds = [32.0, 64.0, 128.0, 256.0];
        assert_eq!(lod_for_distance(0.0, &thresholds), 0);
        assert_eq!(lod_for_distance(32.0, &thresholds), 0);
        assert_eq!(lod_for_distance(32.5, &thresholds), 1);
        assert_eq!(lod_for_distance(200.0, &thresholds), 3);
        assert_eq!(lod_for_distance(1000.0, &thresholds), 4);
    }

    #[test]
    fn lod_is_monotonic_in_distance() {
        let thresholds = config().lod_thresholds;
        let mut previous = 0;
        for step in 0..400 {
            let lod = lod_for_distance(step as f32, &thresholds);
            assert!(lod >= previous);
            previous = lod;
        }
    }

    #[test]
    fn close_chunks_in_the_view_cone_rank_highest() {
        let config = config();
        let eye = Point3::new(8.0, 70.0, 8.0);
        let forward = Vector3::unit_x();

        let ahead = ChunkPriority::compute(ChunkKey::new(1, 0), eye, eye, forward, &config);
        let behind = ChunkPriority::compute(ChunkKey::new(-1, 0), eye, eye, forward, &config);
        let far_ahead = ChunkPriority::compute(ChunkKey::new(6, 0), eye, eye, forward, &config);

        assert_eq!(ahead.priority, 3.0);
        assert_eq!(behind.priority, 2.0);
        assert_eq!(far_ahead.priority, 1.5);

        let mut ranked = vec![far_ahead, behind, ahead];
        sort_by_priority(&mut ranked);
        let keys: Vec<_> = ranked.iter().map(|p| p.key).collect();
        assert_eq!(keys, vec![ahead.key, behind.key, far_ahead.key]);
    }

    #[test]
    fn own_chunk_counts_as_in_view() {
        let eye = Point3::new(8.0, 70.0, 8.0);
        let own = ChunkPriority::compute(ChunkKey::new(0, 0), eye, eye, -Vector3::unit_x(), &config());
        assert_eq!(own.distance, 0.0);
        assert_eq!(own.angle_to_view, 0.0);
        assert_eq!(own.lod_level, 0);
    }

    #[test]
    fn looking_down_still_boosts_nearby_chunks() {
        let config = config();
        let eye = Point3::new(8.0, 70.0, 8.0);
        let pitch = 80f32.to_radians();
        let forward = Vector3::new(pitch.cos(), -pitch.sin(), 0.0);

        let below = ChunkPriority::compute(ChunkKey::new(1, 0), eye, eye, forward, &config);
        let far_behind = ChunkPriority::compute(ChunkKey::new(-6, 0), eye, eye, forward, &config);

        assert!(below.angle_to_view < 5f32.to_radians());
        assert_eq!(below.priority, 3.0);
        assert!(far_behind.angle_to_view > config.view_cone_half_angle_deg.to_radians());
        assert_eq!(far_behind.priority, 1.0);
    }
}
