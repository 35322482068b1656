//! Secondary terrain features: trees, rocks and flowers.
//!
//! Features are scattered after the base terrain pass. Every placement is
//! additive (it only fills air) and stays at least [`EDGE_MARGIN`] voxels away
//! from the chunk edge, so a feature never depends on a neighbouring chunk.

use crate::engine_state::voxels::{
    block::block_type::BlockType,
    chunk::{Chunk, CHUNK_DIMENSION, CHUNK_HEIGHT, WATER_LEVEL},
};

use super::{noise_field::NoiseField, ColumnSample};

/// Columns closer than this to the chunk edge never get features.
pub const EDGE_MARGIN: usize = 2;
pub const MIN_TRUNK_HEIGHT: usize = 4;
pub const MAX_TRUNK_HEIGHT: usize = 6;
/// Number of leaf layers, counted from two below the trunk top.
const CANOPY_LAYERS: usize = 4;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Feature {
    Tree,
    Rock,
    Flower,
}

/// Scatters features over the interior columns of a freshly filled chunk.
///
/// `columns` holds the samples the chunk was filled from, indexed `x + z * 16`.
pub(super) fn place_features(chunk: &mut Chunk, noise: &NoiseField, columns: &[ColumnSample]) {
    let origin = chunk.position.world_origin();

    for z in EDGE_MARGIN..CHUNK_DIMENSION - EDGE_MARGIN {
        for x in EDGE_MARGIN..CHUNK_DIMENSION - EDGE_MARGIN {
            let column = &columns[x + z * CHUNK_DIMENSION];
            if column.height < WATER_LEVEL {
                continue;
            }

            let surface_y = column.height as usize;
            let surface = chunk.block_type_at(x, surface_y, z);
            if !matches!(surface, BlockType::GRASS | BlockType::SAND) {
                continue;
            }

            let (wx, wz) = (origin.x + x as i32, origin.z + z as i32);
            let roll = noise.feature(wx as f64, column.height as f64, wz as f64);
            let Some(feature) = pick_feature(roll, column) else {
                continue;
            };

            let mut rng = fastrand::Rng::with_seed(column_seed(noise.seed(), wx, wz));
            match feature {
                Feature::Tree if surface == BlockType::GRASS => {
                    let trunk_height = rng.usize(MIN_TRUNK_HEIGHT..=MAX_TRUNK_HEIGHT);
                    place_tree(chunk, x, surface_y + 1, z, trunk_height);
                }
                Feature::Rock => {
                    place_if_air(chunk, x, surface_y + 1, z, BlockType::STONE);
                    if rng.bool() {
                        place_if_air(chunk, x + 1, surface_y + 1, z, BlockType::STONE);
                    }
                }
                Feature::Flower if surface == BlockType::GRASS => {
                    place_if_air(chunk, x, surface_y + 1, z, BlockType::LEAVES);
                }
                _ => {}
            }
        }
    }
}

/// Maps a roll in `[0, 1)` onto the column's feature densities.
fn pick_feature(roll: f64, column: &ColumnSample) -> Option<Feature> {
    let densities = column.biome.properties().feature_densities;
    if roll < densities.trees {
        Some(Feature::Tree)
    } else if roll < densities.trees + densities.rocks {
        Some(Feature::Rock)
    } else if roll < densities.trees + densities.rocks + densities.flowers {
        Some(Feature::Flower)
    } else {
        None
    }
}

/// Deterministic per-column seed for the feature's random details.
fn column_seed(seed: u32, x: i32, z: i32) -> u64 {
    let mut h = u64::from(seed) ^ 0x9E37_79B9_7F4A_7C15;
    h = (h ^ u64::from(x as u32)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    h = (h ^ u64::from(z as u32)).wrapping_mul(0x94D0_49BB_1331_11EB);
    h ^ (h >> 31)
}

/// Places a trunk starting at `base_y` and a canopy that narrows towards the top.
fn place_tree(chunk: &mut Chunk, x: usize, base_y: usize, z: usize, trunk_height: usize) {
    for y in base_y..base_y + trunk_height {
        place_if_air(chunk, x, y, z, BlockType::WOOD);
    }

    let trunk_top = base_y + trunk_height - 1;
    let canopy_bottom = trunk_top - 2;
    for layer in 0..CANOPY_LAYERS {
        let y = canopy_bottom + layer;
        let radius: i32 = if layer < 2 { 2 } else { 1 };
        for dz in -radius..=radius {
            for dx in -radius..=radius {
                let distance = ((dx * dx + dz * dz) as f64).sqrt();
                if distance > radius as f64 + 0.5 {
                    continue;
                }
                let lx = (x as i32 + dx) as usize;
                let lz = (z as i32 + dz) as usize;
                place_if_air(chunk, lx, y, lz, BlockType::LEAVES);
            }
        }
    }
}

fn place_if_air(chunk: &mut Chunk, x: usize, y: usize, z: usize, block_type: BlockType) {
    if x < CHUNK_DIMENSION
        && z < CHUNK_DIMENSION
        && y < CHUNK_HEIGHT
        && chunk.block_type_at(x, y, z).is_air()
    {
        chunk.place_generated(x, y, z, block_type);
    }
}
