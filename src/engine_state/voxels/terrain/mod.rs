//! # Terrain Synthesis
//!
//! Turns a seed into chunks. Generation runs in three passes per chunk:
//!
//! 1. **Columns**: every column gets climate values, an unshaped height, a slope
//!    and from those a biome. The biome then shapes the final height. Both the
//!    voxel fill and the feature pass reuse this one sample.
//! 2. **Voxels**: each column is filled bottom to top with bedrock, stone, dirt,
//!    the biome's surface block and water, then carved by 3D cave noise.
//! 3. **Features**: trees, rocks and flowers are scattered over interior columns.
//!
//! Everything is a pure function of the seed and the world coordinates, so a
//! chunk regenerates identically no matter when or in which order it is asked for.

use log::debug;
use web_time::Instant;

use super::{
    block::{block_type::BlockType, BlockMetadata},
    chunk::{Chunk, ChunkKey, CHUNK_DIMENSION, CHUNK_AREA, WATER_LEVEL, WORLD_HEIGHT},
};
use biome::Biome;
use noise_field::NoiseField;

pub mod biome;
mod features;
pub mod noise_field;

/// Height of the terrain where every term is neutral.
pub const BASE_HEIGHT: f64 = 36.0;
pub const BASE_AMPLITUDE: f64 = 24.0;
pub const MOUNTAIN_AMPLITUDE: f64 = 48.0;
pub const PLATEAU_AMPLITUDE: f64 = 14.0;
/// River noise magnitudes below this carve a river bed.
pub const RIVER_THRESHOLD: f64 = 0.04;
/// Largest relative height change the erosion term can cause at roughness 1.
pub const EROSION_STRENGTH: f64 = 0.08;
/// Lowest possible surface height.
pub const MIN_TERRAIN_HEIGHT: i32 = 4;
/// Headroom kept above the highest surface for trees.
pub const FEATURE_HEADROOM: i32 = 12;
/// Number of dirt blocks between the stone and the surface block.
pub const DIRT_DEPTH: i32 = 3;
/// Cave density above which solid voxels are carved out.
pub const CAVE_THRESHOLD: f64 = 0.45;

/// Everything the generator decides about a single column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColumnSample {
    /// Final surface height.
    pub height: i32,
    pub biome: Biome,
    pub temperature: f64,
    pub moisture: f64,
}

/// Deterministic world generator.
#[derive(Clone, Debug)]
pub struct TerrainSynthesizer {
    noise: NoiseField,
}

impl TerrainSynthesizer {
    pub fn new(seed: u32) -> Self {
        Self {
            noise: NoiseField::new(seed),
        }
    }

    pub fn seed(&self) -> u32 {
        self.noise.seed()
    }

    pub fn noise(&self) -> &NoiseField {
        &self.noise
    }

    /// Final surface height of the world column `(x, z)`.
    pub fn height(&self, x: i32, z: i32) -> i32 {
        self.sample_column(x, z).height
    }

    /// Classifies a column; see [`Biome::classify`].
    pub fn biome(&self, temperature: f64, moisture: f64, height: f64, slope: f64) -> Biome {
        Biome::classify(temperature, moisture, height, slope)
    }

    /// Computes climate, biome and final height of a world column.
    pub fn sample_column(&self, x: i32, z: i32) -> ColumnSample {
        let (fx, fz) = (x as f64, z as f64);
        let temperature = self.noise.temperature(fx, fz);
        let moisture = self.noise.moisture(fx, fz);
        let raw_height = self.raw_height(fx, fz);
        let slope = self.slope(fx, fz);
        let biome = self.biome(temperature, moisture, raw_height, slope);

        ColumnSample {
            height: self.shaped_height(fx, fz, biome),
            biome,
            temperature,
            moisture,
        }
    }

    /// Height with all biome modifiers at one, used to classify the column.
    fn raw_height(&self, x: f64, z: f64) -> f64 {
        BASE_HEIGHT
            + self.noise.base(x, z) * BASE_AMPLITUDE
            + self.noise.mountain(x, z) * MOUNTAIN_AMPLITUDE
            + self.noise.plateau(x, z) * PLATEAU_AMPLITUDE
    }

    /// Largest central difference of the raw height along X or Z.
    fn slope(&self, x: f64, z: f64) -> f64 {
        let dx = self.raw_height(x + 1.0, z) - self.raw_height(x - 1.0, z);
        let dz = self.raw_height(x, z + 1.0) - self.raw_height(x, z - 1.0);
        dx.abs().max(dz.abs()) * 0.5
    }

    fn shaped_height(&self, x: f64, z: f64, biome: Biome) -> i32 {
        let properties = biome.properties();
        let modifier = properties.height_modifier;

        let mut height = BASE_HEIGHT
            + self.noise.base(x, z) * BASE_AMPLITUDE * modifier.base
            + self.noise.mountain(x, z) * MOUNTAIN_AMPLITUDE * modifier.mountain
            + self.noise.plateau(x, z) * PLATEAU_AMPLITUDE * modifier.plateau;

        if self.noise.river(x, z).abs() < RIVER_THRESHOLD {
            height = height.min((WATER_LEVEL + 1) as f64);
        }

        height *= 1.0 + self.noise.erosion(x, z) * properties.roughness * EROSION_STRENGTH;

        (height.floor() as i32).clamp(MIN_TERRAIN_HEIGHT, WORLD_HEIGHT - FEATURE_HEADROOM)
    }

    /// Layer rule for a voxel before caves are carved.
    fn layer_block(y: i32, column: &ColumnSample) -> BlockType {
        if y == 0 || y < column.height - DIRT_DEPTH {
            BlockType::STONE
        } else if y < column.height {
            BlockType::DIRT
        } else if y == column.height {
            column.biome.surface_block(column.height)
        } else if y <= WATER_LEVEL {
            BlockType::WATER
        } else {
            BlockType::AIR
        }
    }

    fn is_cave(&self, x: i32, y: i32, z: i32) -> bool {
        self.noise.cave_density(x as f64, y as f64, z as f64) > CAVE_THRESHOLD
    }

    /// Fills one column of `chunk` from its sample.
    fn fill_column(&self, chunk: &mut Chunk, x: usize, z: usize, column: &ColumnSample) {
        let origin = chunk.position.world_origin();
        let (wx, wz) = (origin.x + x as i32, origin.z + z as i32);
        let top = column.height.max(WATER_LEVEL).min(WORLD_HEIGHT - 1);

        for y in 0..=top {
            let mut block_type = Self::layer_block(y, column);
            let carvable = y >= 1 && !matches!(block_type, BlockType::AIR | BlockType::WATER);
            if carvable && self.is_cave(wx, y, wz) {
                block_type = BlockType::AIR;
            }
            if !block_type.is_air() {
                chunk.place_generated(x, y as usize, z, block_type);
            }
        }

        let surface_y = column.height as usize;
        let surface = chunk.block_type_at(x, surface_y, z);
        if !surface.is_air() {
            chunk.set_metadata(
                x,
                surface_y,
                z,
                BlockMetadata {
                    moisture: column.moisture as f32,
                    temperature: column.temperature as f32,
                    hardness: surface.hardness(),
                },
            );
        }
    }

    /// Generates the chunk at chunk coordinates `(chunk_x, chunk_z)`.
    ///
    /// # Returns
    /// A chunk with `is_generated` set, clean, and with an exact height map.
    pub fn generate_chunk(&self, chunk_x: i32, chunk_z: i32) -> Chunk {
        let start = Instant::now();
        let key = ChunkKey::new(chunk_x, chunk_z);
        let origin = key.world_origin();
        let mut chunk = Chunk::empty(key);
        let mut columns = Vec::with_capacity(CHUNK_AREA);

        for z in 0..CHUNK_DIMENSION {
            for x in 0..CHUNK_DIMENSION {
                let column = self.sample_column(origin.x + x as i32, origin.z + z as i32);
                chunk.set_biome(x, z, column.biome);
                self.fill_column(&mut chunk, x, z, &column);
                columns.push(column);
            }
        }

        features::place_features(&mut chunk, &self.noise, &columns);
        chunk.recompute_height_map();
        chunk.mark_generated();

        debug!("Generated chunk {} in {:?}", key, start.elapsed());
        chunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::CHUNK_HEIGHT;

    #[test]
    fn generation_is_deterministic() {
        let first = TerrainSynthesizer::new(2024).generate_chunk(3, -2);
        let second = TerrainSynthesizer::new(2024).generate_chunk(3, -2);
        assert_eq!(first, second);
    }

    #[test]
    fn generation_does_not_depend_on_call_order() {
        let synthesizer = TerrainSynthesizer::new(5);
        let direct = synthesizer.generate_chunk(0, 0);
        let _ = synthesizer.generate_chunk(1, 0);
        let _ = synthesizer.generate_chunk(-1, 7);
        assert_eq!(synthesizer.generate_chunk(0, 0), direct);
    }

    #[test]
    fn different_seeds_give_different_worlds() {
        let a = TerrainSynthesizer::new(1).generate_chunk(0, 0);
        let b = TerrainSynthesizer::new(2).generate_chunk(0, 0);
        assert_ne!(a.blocks(), b.blocks());
    }

    #[test]
    fn generated_chunks_respect_the_column_layout() {
        let synthesizer = TerrainSynthesizer::new(77);
        let chunk = synthesizer.generate_chunk(-4, 9);
        assert!(chunk.is_generated());
        assert!(!chunk.is_dirty());

        let origin = chunk.position.world_origin();
        for z in 0..CHUNK_DIMENSION {
            for x in 0..CHUNK_DIMENSION {
                let column = synthesizer.sample_column(origin.x + x as i32, origin.z + z as i32);
                assert_eq!(chunk.biome_at(x, z), column.biome);
                assert_eq!(chunk.block_type_at(x, 0, z), BlockType::STONE);
                assert!((MIN_TERRAIN_HEIGHT..=WORLD_HEIGHT - FEATURE_HEADROOM)
                    .contains(&column.height));

                for y in (column.height + 1)..=WATER_LEVEL {
                    assert_eq!(chunk.block_type_at(x, y as usize, z), BlockType::WATER);
                }

                let expected_top = (0..CHUNK_HEIGHT)
                    .rev()
                    .find(|&y| chunk.block_type_at(x, y, z).is_solid())
                    .map(|y| y as i32);
                assert_eq!(chunk.height_at(x, z), expected_top);
            }
        }
    }

    #[test]
    fn bedrock_is_never_carved() {
        let synthesizer = TerrainSynthesizer::new(31);
        for (cx, cz) in [(0, 0), (5, 5), (-3, 2)] {
            let chunk = synthesizer.generate_chunk(cx, cz);
            for z in 0..CHUNK_DIMENSION {
                for x in 0..CHUNK_DIMENSION {
                    assert_eq!(chunk.block_type_at(x, 0, z), BlockType::STONE);
                }
            }
        }
    }

    #[test]
    fn rivers_keep_the_surface_low() {
        let synthesizer = TerrainSynthesizer::new(9);
        let noise = synthesizer.noise();
        let mut checked = 0;
        for i in 0..4000 {
            let (x, z) = (i * 7 - 14_000, i * 3 + 500);
            if noise.river(x as f64, z as f64).abs() >= RIVER_THRESHOLD {
                continue;
            }
            let column = synthesizer.sample_column(x, z);
            let roughness = column.biome.properties().roughness;
            let ceiling = ((WATER_LEVEL + 1) as f64 * (1.0 + roughness * EROSION_STRENGTH)).floor();
            assert!(column.height as f64 <= ceiling, "({x}, {z}) -> {}", column.height);
            checked += 1;
        }
        assert!(checked > 0);
    }

    #[test]
    fn caves_only_carve_solid_voxels() {
        let synthesizer = TerrainSynthesizer::new(404);
        for (cx, cz) in [(0, 0), (2, -3), (-6, 1), (11, 11)] {
            let chunk = synthesizer.generate_chunk(cx, cz);
            let origin = chunk.position.world_origin();
            for z in 0..CHUNK_DIMENSION {
                for x in 0..CHUNK_DIMENSION {
                    let (wx, wz) = (origin.x + x as i32, origin.z + z as i32);
                    let column = synthesizer.sample_column(wx, wz);
                    for y in 1..=column.height.max(WATER_LEVEL) {
                        let layered = TerrainSynthesizer::layer_block(y, &column);
                        let actual = chunk.block_type_at(x, y as usize, z);
                        match layered {
                            BlockType::WATER => {
                                assert_eq!(actual, BlockType::WATER, "({wx}, {y}, {wz})")
                            }
                            BlockType::AIR => {}
                            _ if actual.is_air() => {
                                assert!(synthesizer.is_cave(wx, y, wz), "({wx}, {y}, {wz})")
                            }
                            _ => assert_eq!(actual, layered, "({wx}, {y}, {wz})"),
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn no_trunks_grow_in_the_edge_columns() {
        let synthesizer = TerrainSynthesizer::new(12);
        let margin = features::EDGE_MARGIN;
        let in_edge_band = |i: usize| i < margin || i >= CHUNK_DIMENSION - margin;
        for cz in -3..3 {
            for cx in -3..3 {
                let chunk = synthesizer.generate_chunk(cx, cz);
                for z in 0..CHUNK_DIMENSION {
                    for x in (0..CHUNK_DIMENSION).filter(|&x| in_edge_band(x) || in_edge_band(z)) {
                        let has_trunk = (0..CHUNK_HEIGHT)
                            .any(|y| chunk.block_type_at(x, y, z) == BlockType::WOOD);
                        assert!(!has_trunk, "chunk ({cx}, {cz}) column ({x}, {z})");
                    }
                }
            }
        }
    }
}
