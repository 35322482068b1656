//! # Biome Table
//!
//! Biomes are chosen per column from climate and shape: temperature and moisture
//! in `[0, 1]`, the unshaped terrain height, and the local slope. The decision is
//! a fixed-priority table, so the same inputs always yield the same biome.
//!
//! Each biome carries the parameters that shape the rest of the column: how
//! strongly each height term contributes, how rough the erosion pass is, and how
//! densely features are scattered on its surface.

use serde::{Deserialize, Serialize};

use crate::engine_state::voxels::{block::block_type::BlockType, chunk::WATER_LEVEL};

/// Columns within this many blocks below the water level count as beach.
pub const BEACH_DEPTH: i32 = 1;
/// Columns up to this many blocks above the water level count as beach.
pub const BEACH_HEIGHT: i32 = 2;
/// Unshaped heights above this are always mountains.
pub const MOUNTAIN_HEIGHT: f64 = 100.0;
/// Height change per block beyond which a column is a cliff.
pub const CLIFF_SLOPE: f64 = 2.5;
/// Cold columns above this height are snowy mountains rather than tundra.
pub const SNOW_LINE: f64 = 72.0;

pub const HOT_TEMPERATURE: f64 = 0.7;
pub const COLD_TEMPERATURE: f64 = 0.25;
pub const ARID_MOISTURE: f64 = 0.4;
pub const SWAMP_MOISTURE: f64 = 0.8;
pub const RAINFOREST_MOISTURE: f64 = 0.7;
pub const FOREST_MOISTURE: f64 = 0.55;
/// Swamps only form in columns this close to the water level.
pub const SWAMP_MAX_ELEVATION: f64 = 6.0;
/// Rainforests need at least this much warmth.
pub const RAINFOREST_TEMPERATURE: f64 = 0.55;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Plains,
    Beach,
    Mountains,
    SnowyMountains,
    Desert,
    Savanna,
    Tundra,
    Rainforest,
    Forest,
    Swamp,
}

/// Multipliers applied to the three height terms.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HeightModifier {
    pub base: f64,
    pub mountain: f64,
    pub plateau: f64,
}

/// Per-column probabilities of each surface feature. Their sum stays below one.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FeatureDensities {
    pub trees: f64,
    pub rocks: f64,
    pub flowers: f64,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BiomeProperties {
    /// Characteristic temperature of the biome.
    pub temperature: f64,
    /// Characteristic moisture of the biome.
    pub moisture: f64,
    pub height_modifier: HeightModifier,
    /// Scales the erosion perturbation of the final height.
    pub roughness: f64,
    pub feature_densities: FeatureDensities,
}

const fn properties(
    temperature: f64,
    moisture: f64,
    (base, mountain, plateau): (f64, f64, f64),
    roughness: f64,
    (trees, rocks, flowers): (f64, f64, f64),
) -> BiomeProperties {
    BiomeProperties {
        temperature,
        moisture,
        height_modifier: HeightModifier {
            base,
            mountain,
            plateau,
        },
        roughness,
        feature_densities: FeatureDensities {
            trees,
            rocks,
            flowers,
        },
    }
}

static PLAINS: BiomeProperties = properties(0.5, 0.4, (1.0, 0.3, 0.5), 0.3, (0.01, 0.005, 0.06));
static BEACH: BiomeProperties = properties(0.6, 0.5, (0.4, 0.0, 0.2), 0.1, (0.0, 0.01, 0.0));
static MOUNTAINS: BiomeProperties = properties(0.4, 0.4, (1.4, 1.6, 0.6), 1.0, (0.01, 0.04, 0.01));
static SNOWY_MOUNTAINS: BiomeProperties =
    properties(0.1, 0.5, (1.3, 1.4, 0.5), 0.8, (0.005, 0.03, 0.0));
static DESERT: BiomeProperties = properties(0.9, 0.1, (0.6, 0.2, 1.4), 0.4, (0.0, 0.02, 0.0));
static SAVANNA: BiomeProperties = properties(0.8, 0.5, (0.8, 0.3, 1.0), 0.4, (0.015, 0.01, 0.03));
static TUNDRA: BiomeProperties = properties(0.1, 0.3, (0.8, 0.2, 0.6), 0.3, (0.002, 0.02, 0.01));
static RAINFOREST: BiomeProperties =
    properties(0.8, 0.9, (1.1, 0.4, 0.4), 0.6, (0.08, 0.005, 0.08));
static FOREST: BiomeProperties = properties(0.5, 0.7, (1.0, 0.4, 0.5), 0.5, (0.05, 0.01, 0.05));
static SWAMP: BiomeProperties = properties(0.6, 0.9, (0.5, 0.1, 0.2), 0.2, (0.03, 0.0, 0.04));

impl Biome {
    pub const ALL: [Biome; 10] = [
        Biome::Plains,
        Biome::Beach,
        Biome::Mountains,
        Biome::SnowyMountains,
        Biome::Desert,
        Biome::Savanna,
        Biome::Tundra,
        Biome::Rainforest,
        Biome::Forest,
        Biome::Swamp,
    ];

    /// Classifies a column.
    ///
    /// Rules are checked in order and the first match wins:
    /// 1. near the water level: beach
    /// 2. steep or very high: mountains
    /// 3. hot: desert when dry, savanna otherwise
    /// 4. cold: snowy mountains above the snow line, tundra below
    /// 5. wet: swamp in low wet ground, rainforest when warm, forest otherwise
    /// 6. plains
    ///
    /// # Arguments
    /// * `temperature` - Column temperature in `[0, 1]`
    /// * `moisture` - Column moisture in `[0, 1]`
    /// * `height` - Unshaped terrain height of the column
    /// * `slope` - Largest height change per block around the column
    pub fn classify(temperature: f64, moisture: f64, height: f64, slope: f64) -> Biome {
        let water = WATER_LEVEL as f64;
        if height >= water - BEACH_DEPTH as f64 && height <= water + BEACH_HEIGHT as f64 {
            return Biome::Beach;
        }
        if slope > CLIFF_SLOPE || height > MOUNTAIN_HEIGHT {
            return Biome::Mountains;
        }
        if temperature > HOT_TEMPERATURE {
            return if moisture < ARID_MOISTURE {
                Biome::Desert
            } else {
                Biome::Savanna
            };
        }
        if temperature < COLD_TEMPERATURE {
            return if height > SNOW_LINE {
                Biome::SnowyMountains
            } else {
                Biome::Tundra
            };
        }
        if moisture > SWAMP_MOISTURE && height <= water + SWAMP_MAX_ELEVATION {
            return Biome::Swamp;
        }
        if moisture > RAINFOREST_MOISTURE && temperature > RAINFOREST_TEMPERATURE {
            return Biome::Rainforest;
        }
        if moisture > FOREST_MOISTURE {
            return Biome::Forest;
        }
        Biome::Plains
    }

    pub fn properties(self) -> &'static BiomeProperties {
        match self {
            Biome::Plains => &PLAINS,
            Biome::Beach => &BEACH,
            Biome::Mountains => &MOUNTAINS,
            Biome::SnowyMountains => &SNOWY_MOUNTAINS,
            Biome::Desert => &DESERT,
            Biome::Savanna => &SAVANNA,
            Biome::Tundra => &TUNDRA,
            Biome::Rainforest => &RAINFOREST,
            Biome::Forest => &FOREST,
            Biome::Swamp => &SWAMP,
        }
    }

    /// Block placed at the top of a column of the given final height.
    pub fn surface_block(self, height: i32) -> BlockType {
        match self {
            Biome::Desert | Biome::Beach => BlockType::SAND,
            _ if height <= WATER_LEVEL + 1 => BlockType::SAND,
            _ => BlockType::GRASS,
        }
    }
}
