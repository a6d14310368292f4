//! Generation settings: area, noise, density, candidate strategy, terrain and regeneration.
use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::noise::NoiseSettings;
use crate::sampling::PointStrategy;
use crate::surface::{GroundMask, SurfaceProbe};

/// Axis-aligned generation area on the horizontal plane.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationArea {
    pub center: Vec2,
    pub size: Vec2,
}

impl GenerationArea {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    /// Half-open containment: `[min, max)` on both axes.
    pub fn contains(&self, position: Vec2) -> bool {
        let half = self.size * 0.5;
        let rel = position - self.center;
        rel.x >= -half.x && rel.x < half.x && rel.y >= -half.y && rel.y < half.y
    }

    pub fn area(&self) -> f32 {
        self.size.x * self.size.y
    }
}

impl Default for GenerationArea {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::splat(100.0))
    }
}

/// Response curve applied to the raw noise value before it drives density.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DensityCurve {
    #[default]
    Linear,
    SmoothStep,
    /// `x^exponent`.
    Power(f32),
    /// Piecewise-linear curve through `(input, output)` keys sorted by input.
    Keys(Vec<(f32, f32)>),
}

impl DensityCurve {
    pub fn apply(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        let y = match self {
            DensityCurve::Linear => x,
            DensityCurve::SmoothStep => x * x * (3.0 - 2.0 * x),
            DensityCurve::Power(e) => x.powf(*e),
            DensityCurve::Keys(keys) => evaluate_keys(keys, x),
        };
        y.clamp(0.0, 1.0)
    }
}

fn evaluate_keys(keys: &[(f32, f32)], x: f32) -> f32 {
    let Some(first) = keys.first() else {
        return x;
    };
    if x <= first.0 {
        return first.1;
    }
    for pair in keys.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if x <= b.0 {
            let span = b.0 - a.0;
            if span <= 0.0 {
                return b.1;
            }
            return a.1 + (b.1 - a.1) * (x - a.0) / span;
        }
    }
    keys[keys.len() - 1].1
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct DensitySettings {
    /// Acceptance probability at full noise, before multipliers.
    pub base_density: f32,
    pub curve: DensityCurve,
    /// 0 ignores noise, 1 lets the curved noise fully scale the density.
    pub noise_influence: f32,
    /// Raw noise values outside `[min_threshold, max_threshold]` are rejected.
    pub min_threshold: f32,
    pub max_threshold: f32,
}

impl Default for DensitySettings {
    fn default() -> Self {
        Self {
            base_density: 0.5,
            curve: DensityCurve::Linear,
            noise_influence: 1.0,
            min_threshold: 0.0,
            max_threshold: 1.0,
        }
    }
}

impl DensitySettings {
    /// Acceptance probability for a curved noise value and an effective density.
    pub fn acceptance(&self, curved_noise: f32, effective_density: f32) -> f32 {
        let influence = self.noise_influence.clamp(0.0, 1.0);
        let blend = curved_noise + (1.0 - curved_noise) * (1.0 - influence);
        effective_density * blend
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainSettings {
    pub ground_mask: GroundMask,
    /// Height the downward probe starts from.
    pub probe_height: f32,
    pub probe_distance: f32,
    /// Tilt plants to the surface normal instead of keeping them upright.
    pub align_to_normal: bool,
}

impl Default for TerrainSettings {
    fn default() -> Self {
        Self {
            ground_mask: GroundMask::ALL,
            probe_height: 500.0,
            probe_distance: 1000.0,
            align_to_normal: false,
        }
    }
}

impl TerrainSettings {
    pub fn probe(&self) -> SurfaceProbe {
        SurfaceProbe {
            origin_height: self.probe_height,
            max_distance: self.probe_distance,
            ground_mask: self.ground_mask,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct RegenerationSettings {
    pub enabled: bool,
    /// Seconds between regeneration cycles.
    pub check_interval: f32,
    /// Upper bound of attempts per species per cycle.
    pub attempts_per_cycle: u32,
    /// Multiplier on the base density during regeneration.
    pub density_multiplier: f32,
    /// Minimum distance between a regenerated plant and any live plant.
    pub minimum_spacing: f32,
}

impl Default for RegenerationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval: 5.0,
            attempts_per_cycle: 50,
            density_multiplier: 1.0,
            minimum_spacing: 1.0,
        }
    }
}

/// Complete configuration of a generator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Identity used to look up external density multipliers.
    pub id: String,
    /// Fixed seed; a random one is drawn per generation when `None`.
    pub seed: Option<u64>,
    pub area: GenerationArea,
    pub noise: NoiseSettings,
    pub density: DensitySettings,
    pub strategy: PointStrategy,
    pub terrain: TerrainSettings,
    pub regeneration: RegenerationSettings,
    /// Successful placements after which a stepped pass yields to the host.
    pub max_plants_per_frame: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            id: "default".into(),
            seed: None,
            area: GenerationArea::default(),
            noise: NoiseSettings::default(),
            density: DensitySettings::default(),
            strategy: PointStrategy::default(),
            terrain: TerrainSettings::default(),
            regeneration: RegenerationSettings::default(),
            max_plants_per_frame: 32,
        }
    }
}

impl GenerationSettings {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Sets a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the generation area from its center and size.
    pub fn with_area(mut self, center: Vec2, size: Vec2) -> Self {
        self.area = GenerationArea::new(center, size);
        self
    }

    /// Sets the noise field parameters.
    pub fn with_noise(mut self, noise: NoiseSettings) -> Self {
        self.noise = noise;
        self
    }

    /// Sets the density response.
    pub fn with_density(mut self, density: DensitySettings) -> Self {
        self.density = density;
        self
    }

    /// Sets the candidate point strategy.
    pub fn with_strategy(mut self, strategy: PointStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the terrain probe and ground constraints.
    pub fn with_terrain(mut self, terrain: TerrainSettings) -> Self {
        self.terrain = terrain;
        self
    }

    /// Sets the regeneration schedule.
    pub fn with_regeneration(mut self, regeneration: RegenerationSettings) -> Self {
        self.regeneration = regeneration;
        self
    }

    /// Sets the placement budget per stepped frame.
    pub fn with_max_plants_per_frame(mut self, max: u32) -> Self {
        self.max_plants_per_frame = max;
        self
    }

    /// Validates the configuration, returning an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if !(self.area.size.x > 0.0 && self.area.size.y > 0.0) {
            return Err(Error::InvalidConfig(
                "area size must be > 0 in both components".into(),
            ));
        }
        self.noise.validate()?;
        self.strategy.validate()?;

        let d = &self.density;
        if !d.base_density.is_finite() || d.base_density < 0.0 {
            return Err(Error::InvalidConfig("base_density must be >= 0".into()));
        }
        if !(0.0..=1.0).contains(&d.noise_influence) {
            return Err(Error::InvalidConfig(
                "noise_influence must be in [0, 1]".into(),
            ));
        }
        if d.max_threshold < d.min_threshold {
            return Err(Error::InvalidConfig(
                "max_threshold must be >= min_threshold".into(),
            ));
        }

        if self.terrain.ground_mask.is_empty() {
            return Err(Error::MissingGroundClassification);
        }
        if self.terrain.probe_distance <= 0.0 {
            return Err(Error::InvalidConfig("probe_distance must be > 0".into()));
        }

        let r = &self.regeneration;
        if !(r.check_interval.is_finite() && r.check_interval > 0.0) {
            return Err(Error::InvalidConfig("check_interval must be > 0".into()));
        }
        if r.minimum_spacing < 0.0 || r.density_multiplier < 0.0 {
            return Err(Error::InvalidConfig(
                "regeneration spacing and multiplier must be >= 0".into(),
            ));
        }
        if self.max_plants_per_frame == 0 {
            return Err(Error::InvalidConfig("max_plants_per_frame must be >= 1".into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        assert!(GenerationSettings::default().validate().is_ok());
    }

    #[test]
    fn empty_ground_mask_is_a_config_error() {
        let settings = GenerationSettings::default().with_terrain(TerrainSettings {
            ground_mask: GroundMask::NONE,
            ..Default::default()
        });
        assert!(matches!(
            settings.validate(),
            Err(Error::MissingGroundClassification)
        ));
    }

    #[test]
    fn check_interval_is_validated_while_disabled() {
        for interval in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let settings = GenerationSettings::default().with_regeneration(RegenerationSettings {
                enabled: false,
                check_interval: interval,
                ..Default::default()
            });
            assert!(
                matches!(settings.validate(), Err(Error::InvalidConfig(_))),
                "interval {interval} accepted"
            );
        }
    }

    #[test]
    fn degenerate_area_is_rejected() {
        let settings = GenerationSettings::default().with_area(Vec2::ZERO, Vec2::new(0.0, 10.0));
        assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn area_contains_is_half_open() {
        let area = GenerationArea::new(Vec2::new(10.0, 0.0), Vec2::new(4.0, 4.0));
        assert!(area.contains(Vec2::new(8.0, -2.0)));
        assert!(!area.contains(Vec2::new(12.0, 0.0)));
        assert!(!area.contains(Vec2::new(10.0, 2.0)));
    }

    #[test]
    fn curves_map_unit_interval() {
        assert_eq!(DensityCurve::Linear.apply(0.3), 0.3);
        assert_eq!(DensityCurve::SmoothStep.apply(0.5), 0.5);
        assert!((DensityCurve::Power(2.0).apply(0.5) - 0.25).abs() < 1e-6);
        let keys = DensityCurve::Keys(vec![(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]);
        assert!((keys.apply(0.25) - 0.5).abs() < 1e-6);
        assert!((keys.apply(0.75) - 0.5).abs() < 1e-6);
        assert_eq!(DensityCurve::Keys(Vec::new()).apply(0.4), 0.4);
    }

    #[test]
    fn acceptance_blends_noise_by_influence() {
        let full = DensitySettings::default();
        assert!((full.acceptance(0.4, 0.5) - 0.2).abs() < 1e-6);

        let none = DensitySettings {
            noise_influence: 0.0,
            ..Default::default()
        };
        assert!((none.acceptance(0.4, 0.5) - 0.5).abs() < 1e-6);
    }
}
