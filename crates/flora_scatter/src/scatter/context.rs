//! Per-run generation state: seed, RNG and the two noise-domain offsets.
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::noise::NoiseSettings;
use crate::sampling::rand01;

/// Range of the random per-run offset applied to the noise domain, in world units.
const SEED_OFFSET_RANGE: f32 = 10_000.0;

/// Which placement pass a candidate belongs to.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementPass {
    Initial,
    Regeneration,
}

impl PlacementPass {
    #[inline]
    pub fn is_regeneration(self) -> bool {
        matches!(self, PlacementPass::Regeneration)
    }
}

/// Explicit generation state threaded through every placement call.
///
/// Owns the only RNG of a run. Two contexts built from the same seed and noise
/// settings produce identical runs.
#[derive(Debug, Clone)]
pub struct GenerationContext {
    seed: u64,
    rng: StdRng,
    initial_offset: Vec2,
    regeneration_offset: Vec2,
}

impl GenerationContext {
    pub fn new(seed: u64, noise: &NoiseSettings) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let seed_offset = Vec2::new(
            (rand01(&mut rng) * 2.0 - 1.0) * SEED_OFFSET_RANGE,
            (rand01(&mut rng) * 2.0 - 1.0) * SEED_OFFSET_RANGE,
        );
        let initial_offset = seed_offset + noise.offset;
        Self {
            seed,
            rng,
            initial_offset,
            regeneration_offset: initial_offset + noise.regeneration_offset,
        }
    }

    /// Builds a context from a fresh seed drawn from the operating system entropy.
    pub fn from_entropy(noise: &NoiseSettings) -> Self {
        Self::new(rand::random::<u64>(), noise)
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Noise-domain offset for the given pass.
    pub fn noise_offset(&self, pass: PlacementPass) -> Vec2 {
        match pass {
            PlacementPass::Initial => self.initial_offset,
            PlacementPass::Regeneration => self.regeneration_offset,
        }
    }

    /// Uniform draw in `[0, 1)`.
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        rand01(&mut self.rng)
    }

    /// Uniform draw in `[min, max)`; returns `min` when the range is empty.
    #[inline]
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + rand01(&mut self.rng) * (max - min)
    }

    /// Uniform integer draw in `[min, max]` (inclusive).
    pub fn range_u32_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if max <= min {
            return min;
        }
        let span = (max - min) as u64 + 1;
        min + (self.rng.next_u64() % span) as u32
    }
}
