//! Procedural island heightmaps, for running without a source image.
//!
//! Fractal noise shaped by a radial falloff: high in the middle, sinking to
//! zero toward the rim so the island meets the sea on every side. The same
//! seed always yields the same field.

use noise::{NoiseFn, Perlin, Simplex};

use crate::error::{require_positive, Result, TerrainError};
use crate::heightmap::HeightField;

/// Derive a u32 noise seed from a world seed and a per-layer offset.
#[inline]
fn layer_seed(seed: u64, offset: u64) -> u32 {
    ((seed.wrapping_add(offset))
        .wrapping_mul(0x9e3779b97f4a7c15_u64)
        .wrapping_add(offset.wrapping_mul(0x6c078965_u64))
        >> 32) as u32
}

/// Parameters for [`IslandNoise::generate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IslandNoise {
    /// Output field resolution (samples per side).
    pub resolution: usize,
    /// Base frequency in cycles per field width.
    pub frequency: f64,
    pub octaves: u32,
    /// Frequency multiplier per octave.
    pub lacunarity: f64,
    /// Amplitude multiplier per octave.
    pub persistence: f64,
    /// Fraction of the half-width (0–1] where the falloff reaches zero.
    pub island_radius: f64,
    pub seed: u64,
}

impl Default for IslandNoise {
    fn default() -> Self {
        Self {
            resolution: 129,
            frequency: 3.0,
            octaves: 5,
            lacunarity: 2.0,
            persistence: 0.5,
            island_radius: 0.9,
            seed: 0,
        }
    }
}

impl IslandNoise {
    pub fn generate(&self) -> Result<HeightField> {
        if self.resolution == 0 {
            return Err(TerrainError::config("synth.resolution", "must be at least 1"));
        }
        if self.octaves == 0 {
            return Err(TerrainError::config("synth.octaves", "must be at least 1"));
        }
        require_positive("synth.frequency", self.frequency)?;
        require_positive("synth.lacunarity", self.lacunarity)?;
        require_positive("synth.persistence", self.persistence)?;
        require_positive("synth.island_radius", self.island_radius)?;

        let perlin = Perlin::new(layer_seed(self.seed, 0));
        let simplex = Simplex::new(layer_seed(self.seed, 1));

        let res = self.resolution;
        let denom = (res.max(2) - 1) as f64;
        let mut samples = Vec::with_capacity(res * res);
        for y in 0..res {
            for x in 0..res {
                let u = x as f64 / denom;
                let v = y as f64 / denom;
                let height = self.fractal(&perlin, &simplex, u, v) * self.falloff(u, v);
                samples.push(height.clamp(0.0, 1.0) as f32);
            }
        }

        log::debug!("Synthesized {}x{} island heightmap (seed {})", res, res, self.seed);
        HeightField::from_samples(res, samples)
    }

    /// Normalized fractal noise in `[0, 1]`.
    fn fractal(&self, perlin: &Perlin, simplex: &Simplex, u: f64, v: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut max_value = 0.0;

        for _ in 0..self.octaves {
            let p = perlin.get([u * frequency, v * frequency]);
            let s = simplex.get([u * frequency + 1000.0, v * frequency + 1000.0]);
            value += (p * 0.7 + s * 0.3) * amplitude;
            max_value += amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }

        (value / max_value + 1.0) * 0.5
    }

    /// 1 at the center, smoothstep down to 0 at `island_radius`.
    fn falloff(&self, u: f64, v: f64) -> f64 {
        let dx = u * 2.0 - 1.0;
        let dy = v * 2.0 - 1.0;
        let d = (dx * dx + dy * dy).sqrt() / self.island_radius;
        let t = (1.0 - d).clamp(0.0, 1.0);
        t * t * (3.0 - 2.0 * t)
    }
}
