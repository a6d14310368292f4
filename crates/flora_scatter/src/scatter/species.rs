//! Species definitions: what can be placed and under which constraints.
use std::ops::RangeInclusive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier resolved by the host to a spawnable asset.
pub type SpeciesId = String;

/// Cluster size range. The size counts the primary plant, so a cluster of size
/// `n` adds `n - 1` secondary plants around it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSettings {
    pub min_size: u32,
    pub max_size: u32,
    /// Maximum distance of secondary plants from the primary one.
    pub radius: f32,
}

impl ClusterSettings {
    pub fn new(min_size: u32, max_size: u32, radius: f32) -> Self {
        Self {
            min_size,
            max_size,
            radius,
        }
    }
}

/// A configured spawnable with placement constraints and an optional population target.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub struct SpeciesDef {
    pub id: SpeciesId,
    /// Base selection weight.
    pub spawn_probability: f32,
    pub scale_range: (f32, f32),
    /// Valid ground heights (inclusive).
    pub height_range: (f32, f32),
    /// Steepest accepted ground slope in degrees.
    pub max_slope: f32,
    /// Preferred noise window (inclusive).
    pub noise_window: (f32, f32),
    pub cluster: Option<ClusterSettings>,
    pub allow_regeneration: bool,
    /// Weight multiplier applied during regeneration.
    pub regeneration_multiplier: f32,
    /// Live population the regeneration loop aims for; 0 disables it.
    pub target_count: u32,
}

impl Default for SpeciesDef {
    fn default() -> Self {
        Self {
            id: SpeciesId::new(),
            spawn_probability: 1.0,
            scale_range: (1.0, 1.0),
            height_range: (f32::MIN, f32::MAX),
            max_slope: 90.0,
            noise_window: (0.0, 1.0),
            cluster: None,
            allow_regeneration: true,
            regeneration_multiplier: 1.0,
            target_count: 0,
        }
    }
}

impl SpeciesDef {
    pub fn new(id: impl Into<SpeciesId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Sets the selection weight.
    pub fn with_spawn_probability(mut self, p: f32) -> Self {
        self.spawn_probability = p;
        self
    }

    /// Sets the uniform scale range.
    pub fn with_scale_range(mut self, min: f32, max: f32) -> Self {
        self.scale_range = (min, max);
        self
    }

    /// Sets the allowed surface height range.
    pub fn with_height_range(mut self, min: f32, max: f32) -> Self {
        self.height_range = (min, max);
        self
    }

    /// Sets the steepest allowed slope in degrees.
    pub fn with_max_slope(mut self, degrees: f32) -> Self {
        self.max_slope = degrees;
        self
    }

    /// Sets the noise window the species grows in.
    pub fn with_noise_window(mut self, min: f32, max: f32) -> Self {
        self.noise_window = (min, max);
        self
    }

    /// Enables clustering around each primary plant.
    pub fn with_cluster(mut self, cluster: ClusterSettings) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Sets whether the species regrows and its regeneration weight multiplier.
    pub fn with_regeneration(mut self, allow: bool, multiplier: f32) -> Self {
        self.allow_regeneration = allow;
        self.regeneration_multiplier = multiplier;
        self
    }

    /// Sets the population target; 0 leaves the species unconstrained.
    pub fn with_target_count(mut self, target: u32) -> Self {
        self.target_count = target;
        self
    }

    #[inline]
    pub fn accepts_height(&self, height: f32) -> bool {
        height >= self.height_range.0 && height <= self.height_range.1
    }

    #[inline]
    pub fn accepts_slope(&self, slope_degrees: f32) -> bool {
        slope_degrees <= self.max_slope
    }

    #[inline]
    pub fn accepts_noise(&self, noise: f32) -> bool {
        noise >= self.noise_window.0 && noise <= self.noise_window.1
    }

    /// Inclusive range of cluster sizes, or `1..=1` when clustering is off.
    pub fn cluster_sizes(&self) -> RangeInclusive<u32> {
        match &self.cluster {
            Some(c) => c.min_size.max(1)..=c.max_size.max(c.min_size.max(1)),
            None => 1..=1,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(Error::InvalidConfig(format!("species '{}': {msg}", self.id)));
        if self.id.is_empty() {
            return Err(Error::InvalidConfig("species id must not be empty".into()));
        }
        if !self.spawn_probability.is_finite() || self.spawn_probability < 0.0 {
            return fail("spawn_probability must be >= 0");
        }
        if self.scale_range.0 <= 0.0 || self.scale_range.1 < self.scale_range.0 {
            return fail("scale_range must be positive and ordered");
        }
        if self.height_range.1 < self.height_range.0 {
            return fail("height_range must be ordered");
        }
        if self.noise_window.1 < self.noise_window.0 {
            return fail("noise_window must be ordered");
        }
        if !self.regeneration_multiplier.is_finite() || self.regeneration_multiplier < 0.0 {
            return fail("regeneration_multiplier must be >= 0");
        }
        if let Some(c) = &self.cluster {
            if c.min_size == 0 || c.max_size < c.min_size {
                return fail("cluster sizes must satisfy 1 <= min <= max");
            }
            if !c.radius.is_finite() || c.radius <= 0.0 {
                return fail("cluster radius must be > 0");
            }
        }
        Ok(())
    }
}
