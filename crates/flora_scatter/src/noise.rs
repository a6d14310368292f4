//! Fractal coherent noise used as the scatter density field.
//!
//! [`NoiseField`] layers Perlin octaves (fBm) and remaps the result to `[0, 1]`.
//! The per-run seed offset and both pass offsets live in
//! [`crate::scatter::context::GenerationContext`]; the field itself only holds the
//! immutable noise parameters, so evaluation is pure.
//!
//! Perlin lattices repeat every 256 units, so an offset alone cannot keep the
//! regeneration domain apart from the initial one. A nonzero regeneration offset
//! therefore also switches to a second permutation table derived from the seed.
use ::noise::{NoiseFn, Perlin};
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scatter::context::{GenerationContext, PlacementPass};

/// Parameters of the fractal noise field.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseSettings {
    /// Base frequency applied to world positions.
    pub scale: f32,
    /// Static offset added to every sample position (world units).
    pub offset: Vec2,
    /// Number of octaves, at least 1.
    pub octaves: u32,
    /// Amplitude factor between octaves.
    pub persistence: f32,
    /// Frequency factor between octaves.
    pub lacunarity: f32,
    /// Extra offset applied on the regeneration pass (world units).
    pub regeneration_offset: Vec2,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 0.05,
            offset: Vec2::ZERO,
            octaves: 3,
            persistence: 0.5,
            lacunarity: 2.0,
            regeneration_offset: Vec2::splat(1000.0),
        }
    }
}

impl NoiseSettings {
    /// Sets the base frequency.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the static sample offset.
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    /// Sets the octave count.
    pub fn with_octaves(mut self, octaves: u32) -> Self {
        self.octaves = octaves;
        self
    }

    /// Sets the amplitude falloff between octaves.
    pub fn with_persistence(mut self, persistence: f32) -> Self {
        self.persistence = persistence;
        self
    }

    /// Sets the frequency growth between octaves.
    pub fn with_lacunarity(mut self, lacunarity: f32) -> Self {
        self.lacunarity = lacunarity;
        self
    }

    /// Sets the regeneration domain offset.
    pub fn with_regeneration_offset(mut self, regeneration_offset: Vec2) -> Self {
        self.regeneration_offset = regeneration_offset;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::InvalidConfig("noise scale must be > 0".into()));
        }
        if self.octaves == 0 {
            return Err(Error::InvalidConfig("noise octaves must be >= 1".into()));
        }
        if !self.persistence.is_finite() || self.persistence <= 0.0 {
            return Err(Error::InvalidConfig("noise persistence must be > 0".into()));
        }
        if !self.lacunarity.is_finite() || self.lacunarity <= 0.0 {
            return Err(Error::InvalidConfig("noise lacunarity must be > 0".into()));
        }
        Ok(())
    }
}

/// Salt mixed into the folded seed for the regeneration permutation table.
const REGENERATION_SEED_SALT: u32 = 0x9E37_79B9;

/// Seeded fractal Brownian motion over Perlin noise.
#[derive(Debug, Clone)]
pub struct NoiseField {
    perlin: Perlin,
    regeneration: Perlin,
    settings: NoiseSettings,
}

impl NoiseField {
    pub fn new(settings: NoiseSettings, seed: u64) -> Self {
        let folded = (seed as u32) ^ ((seed >> 32) as u32);
        Self {
            perlin: Perlin::new(folded),
            regeneration: Perlin::new(folded ^ REGENERATION_SEED_SALT),
            settings,
        }
    }

    pub fn settings(&self) -> &NoiseSettings {
        &self.settings
    }

    /// Evaluates the field at `position` in the noise domain of `pass`.
    pub fn evaluate(&self, ctx: &GenerationContext, position: Vec2, pass: PlacementPass) -> f32 {
        let separate = pass.is_regeneration() && self.settings.regeneration_offset != Vec2::ZERO;
        let perlin = if separate { &self.regeneration } else { &self.perlin };
        fbm(perlin, &self.settings, position + ctx.noise_offset(pass))
    }

    /// Samples the initial-pass field at an already offset world position.
    pub fn sample(&self, position: Vec2) -> f32 {
        fbm(&self.perlin, &self.settings, position)
    }
}

fn fbm(perlin: &Perlin, s: &NoiseSettings, position: Vec2) -> f32 {
    let base = position * s.scale;

    if s.octaves <= 1 {
        return remap(perlin.get([base.x as f64, base.y as f64]));
    }

    let mut total = 0.0f64;
    let mut amplitude = 1.0f64;
    let mut frequency = 1.0f64;
    let mut amplitude_sum = 0.0f64;

    for _ in 0..s.octaves {
        let p = [base.x as f64 * frequency, base.y as f64 * frequency];
        total += perlin.get(p) * amplitude;
        amplitude_sum += amplitude;
        amplitude *= s.persistence as f64;
        frequency *= s.lacunarity as f64;
    }

    if amplitude_sum <= 0.0 {
        return 0.5;
    }
    remap(total / amplitude_sum)
}

#[inline]
fn remap(value: f64) -> f32 {
    ((value * 0.5 + 0.5) as f32).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions() -> Vec<Vec2> {
        (0..64)
            .map(|i| Vec2::new(i as f32 * 3.17 - 50.3, (i * 7 % 23) as f32 * 2.41 - 20.9))
            .collect()
    }

    #[test]
    fn evaluation_is_deterministic_for_seed_position_and_pass() {
        let settings = NoiseSettings::default();
        for seed in [0u64, 7, 0xDEAD_BEEF] {
            let a = NoiseField::new(settings.clone(), seed);
            let b = NoiseField::new(settings.clone(), seed);
            let ctx_a = GenerationContext::new(seed, &settings);
            let ctx_b = GenerationContext::new(seed, &settings);
            for p in positions() {
                for pass in [PlacementPass::Initial, PlacementPass::Regeneration] {
                    assert_eq!(a.evaluate(&ctx_a, p, pass), b.evaluate(&ctx_b, p, pass));
                }
            }
        }
    }

    #[test]
    fn values_stay_in_unit_range() {
        let settings = NoiseSettings::default().with_octaves(5);
        let field = NoiseField::new(settings.clone(), 3);
        let ctx = GenerationContext::new(3, &settings);
        for p in positions() {
            let v = field.evaluate(&ctx, p, PlacementPass::Initial);
            assert!((0.0..=1.0).contains(&v), "{v} out of range");
        }
    }

    #[test]
    fn regeneration_domain_differs_from_initial() {
        let settings = NoiseSettings::default().with_octaves(4);
        for seed in [1u64, 99, 4242] {
            let field = NoiseField::new(settings.clone(), seed);
            let ctx = GenerationContext::new(seed, &settings);
            for p in positions() {
                let initial = field.evaluate(&ctx, p, PlacementPass::Initial);
                let regen = field.evaluate(&ctx, p, PlacementPass::Regeneration);
                assert_ne!(initial, regen, "pass domains coincide at {p:?}");
            }
        }
    }

    #[test]
    fn lattice_period_offset_still_separates_domains() {
        // 5120 * 0.05 = 256 lattice units, one full Perlin period on every octave.
        let settings = NoiseSettings::default()
            .with_octaves(3)
            .with_regeneration_offset(Vec2::new(5120.0, 0.0));
        for seed in [0u64, 42, 0xFEED] {
            let field = NoiseField::new(settings.clone(), seed);
            let ctx = GenerationContext::new(seed, &settings);
            let mut distinct = 0;
            for p in positions() {
                let initial = field.evaluate(&ctx, p, PlacementPass::Initial);
                let regen = field.evaluate(&ctx, p, PlacementPass::Regeneration);
                assert_ne!(initial, regen, "pass domains coincide at {p:?}");
                if (initial - regen).abs() > 1e-3 {
                    distinct += 1;
                }
            }
            assert!(distinct > 48, "only {distinct}/64 positions differ noticeably");
        }
    }

    #[test]
    fn zero_regeneration_offset_shares_domain() {
        let settings = NoiseSettings::default().with_regeneration_offset(Vec2::ZERO);
        let field = NoiseField::new(settings.clone(), 11);
        let ctx = GenerationContext::new(11, &settings);
        let p = Vec2::new(12.5, -3.25);
        assert_eq!(
            field.evaluate(&ctx, p, PlacementPass::Initial),
            field.evaluate(&ctx, p, PlacementPass::Regeneration)
        );
    }

    #[test]
    fn single_octave_matches_plain_perlin() {
        let settings = NoiseSettings::default().with_octaves(1);
        let field = NoiseField::new(settings.clone(), 5);
        let p = Vec2::new(4.3, 8.9);
        let base = p * settings.scale;
        let expected = remap(Perlin::new(5).get([base.x as f64, base.y as f64]));
        assert_eq!(field.sample(p), expected);
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        assert!(NoiseSettings::default().validate().is_ok());
        assert!(NoiseSettings::default().with_octaves(0).validate().is_err());
        assert!(NoiseSettings::default().with_scale(0.0).validate().is_err());
        assert!(NoiseSettings::default()
            .with_lacunarity(f32::NAN)
            .validate()
            .is_err());
    }
}
