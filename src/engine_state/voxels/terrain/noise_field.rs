//! # Noise Field
//!
//! Independent coherent-noise generators, one per purpose. Each generator gets
//! its own seed derived from the world seed, so the height field, the climate
//! maps and the caves are uncorrelated while still fully determined by one
//! number.
//!
//! All samplers take world block coordinates and are pure functions of them.

use noise::{NoiseFn, Perlin};

/// Horizontal scale of the base height term.
pub const BASE_SCALE: f64 = 0.008;
pub const BASE_OCTAVES: u32 = 4;
/// Horizontal scale of the ridged mountain term.
pub const MOUNTAIN_SCALE: f64 = 0.004;
pub const MOUNTAIN_OCTAVES: u32 = 3;
pub const PLATEAU_SCALE: f64 = 0.003;
pub const RIVER_SCALE: f64 = 0.0025;
pub const EROSION_SCALE: f64 = 0.02;
/// Climate varies slowly so biomes span many chunks.
pub const CLIMATE_SCALE: f64 = 0.0015;
pub const CAVE_SCALE: f64 = 0.045;
/// Vertical stretch of caves; below one flattens them into tunnels.
pub const CAVE_VERTICAL_SQUASH: f64 = 0.6;
pub const FEATURE_SCALE: f64 = 0.37;

const HEIGHT_SEED_OFFSET: u32 = 0;
const MOUNTAIN_SEED_OFFSET: u32 = 1;
const PLATEAU_SEED_OFFSET: u32 = 2;
const TEMPERATURE_SEED_OFFSET: u32 = 3;
const MOISTURE_SEED_OFFSET: u32 = 4;
const TREE_SEED_OFFSET: u32 = 5;
const CAVE_SEED_OFFSET: u32 = 6;
const RIVER_SEED_OFFSET: u32 = 7;
const EROSION_SEED_OFFSET: u32 = 8;

/// The set of noise generators a world is built from.
#[derive(Clone, Debug)]
pub struct NoiseField {
    seed: u32,
    height: Perlin,
    mountain: Perlin,
    plateau: Perlin,
    temperature: Perlin,
    moisture: Perlin,
    tree: Perlin,
    cave: Perlin,
    river: Perlin,
    erosion: Perlin,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            height: Perlin::new(seed.wrapping_add(HEIGHT_SEED_OFFSET)),
            mountain: Perlin::new(seed.wrapping_add(MOUNTAIN_SEED_OFFSET)),
            plateau: Perlin::new(seed.wrapping_add(PLATEAU_SEED_OFFSET)),
            temperature: Perlin::new(seed.wrapping_add(TEMPERATURE_SEED_OFFSET)),
            moisture: Perlin::new(seed.wrapping_add(MOISTURE_SEED_OFFSET)),
            tree: Perlin::new(seed.wrapping_add(TREE_SEED_OFFSET)),
            cave: Perlin::new(seed.wrapping_add(CAVE_SEED_OFFSET)),
            river: Perlin::new(seed.wrapping_add(RIVER_SEED_OFFSET)),
            erosion: Perlin::new(seed.wrapping_add(EROSION_SEED_OFFSET)),
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Multi-octave base height in `[-1, 1]`.
    ///
    /// Each octave doubles the frequency and halves the amplitude.
    pub fn base(&self, x: f64, z: f64) -> f64 {
        fbm(&self.height, x * BASE_SCALE, z * BASE_SCALE, BASE_OCTAVES)
    }

    /// Ridged mountain term in `[0, 1]`, peaking along the zero lines of the noise.
    pub fn mountain(&self, x: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = MOUNTAIN_SCALE;
        let mut max_amplitude = 0.0;
        for _ in 0..MOUNTAIN_OCTAVES {
            let ridge = 1.0 - self.mountain.get([x * frequency, z * frequency]).abs();
            total += ridge * ridge * amplitude;
            max_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        (total / max_amplitude).clamp(0.0, 1.0)
    }

    /// Plateau term in `[0, 1]`: mostly flat at either end with a smooth step between.
    pub fn plateau(&self, x: f64, z: f64) -> f64 {
        let n = self.plateau.get([x * PLATEAU_SCALE, z * PLATEAU_SCALE]);
        let t = (n * 1.5 + 0.5).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }

    /// Raw river noise in `[-1, 1]`. Rivers run where its magnitude is small.
    pub fn river(&self, x: f64, z: f64) -> f64 {
        self.river.get([x * RIVER_SCALE, z * RIVER_SCALE])
    }

    /// Erosion perturbation in `[-1, 1]`.
    pub fn erosion(&self, x: f64, z: f64) -> f64 {
        fbm(&self.erosion, x * EROSION_SCALE, z * EROSION_SCALE, 2)
    }

    /// Temperature in `[0, 1]`.
    pub fn temperature(&self, x: f64, z: f64) -> f64 {
        unit(fbm(&self.temperature, x * CLIMATE_SCALE, z * CLIMATE_SCALE, 2))
    }

    /// Moisture in `[0, 1]`.
    pub fn moisture(&self, x: f64, z: f64) -> f64 {
        unit(fbm(&self.moisture, x * CLIMATE_SCALE, z * CLIMATE_SCALE, 2))
    }

    /// Feature roll in `[0, 1)` for a surface voxel.
    ///
    /// The raw noise is smooth, so its scaled fractional part is used to break up
    /// neighbouring columns.
    pub fn feature(&self, x: f64, y: f64, z: f64) -> f64 {
        let n = self
            .tree
            .get([x * FEATURE_SCALE, y * FEATURE_SCALE, z * FEATURE_SCALE]);
        (n.abs() * 1000.0).fract()
    }

    /// Cave density in `[-1, 1]`. Voxels above the cave threshold are carved.
    pub fn cave_density(&self, x: f64, y: f64, z: f64) -> f64 {
        self.cave.get([
            x * CAVE_SCALE,
            y * CAVE_SCALE / CAVE_VERTICAL_SQUASH,
            z * CAVE_SCALE,
        ])
    }
}

/// Fractal Brownian motion normalized back into `[-1, 1]`.
fn fbm(noise: &Perlin, x: f64, z: f64, octaves: u32) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_amplitude = 0.0;
    for _ in 0..octaves {
        total += noise.get([x * frequency, z * frequency]) * amplitude;
        max_amplitude += amplitude;
        amplitude *= 0.5;
        frequency *= 2.0;
    }
    (total / max_amplitude).clamp(-1.0, 1.0)
}

fn unit(value: f64) -> f64 {
    ((value + 1.0) * 0.5).clamp(0.0, 1.0)
}
