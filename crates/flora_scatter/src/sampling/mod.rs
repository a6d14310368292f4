//! Sampling strategies for generating candidate positions in a 2D domain.
//!
//! Every strategy generates points in a domain centered at the origin; callers
//! translate them to the generation area. Only [`PoissonDiskSampling`] guarantees a
//! minimum distance between points.
use mint::Vector2;
use rand::RngCore;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod jitter_grid;
pub mod poisson_disk;
pub mod random_grid;
pub mod uniform_random;

pub use jitter_grid::JitterGridSampling;
pub use poisson_disk::PoissonDiskSampling;
pub use random_grid::RandomGridSampling;
pub use uniform_random::UniformRandomSampling;

/// Trait for position sampling.
pub trait PositionSampling: Send + Sync {
    fn generate(&self, domain_extent: Vector2<f32>, rng: &mut dyn RngCore) -> Vec<Vector2<f32>>;
}

/// Configured choice of candidate strategy, as stored in settings.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum PointStrategy {
    /// Regular lattice with per-axis jitter.
    JitterGrid { spacing: f32, jitter: f32 },
    /// Independent uniform points, count derived from area and points per 100 square units.
    RandomGrid { points_per_100_units: f32 },
    /// Independent uniform points, count derived from area and density.
    Uniform { density: f32 },
    /// Bridson Poisson-disc sampling.
    PoissonDisk { radius: f32, sample_attempts: u32 },
}

impl Default for PointStrategy {
    fn default() -> Self {
        PointStrategy::JitterGrid {
            spacing: 2.0,
            jitter: 0.5,
        }
    }
}

impl PointStrategy {
    pub fn validate(&self) -> Result<()> {
        match *self {
            PointStrategy::JitterGrid { spacing, jitter } => {
                if !spacing.is_finite() || spacing <= 0.0 {
                    return Err(Error::InvalidConfig("grid spacing must be > 0".into()));
                }
                if !(0.0..=1.0).contains(&jitter) {
                    return Err(Error::InvalidConfig("grid jitter must be in [0, 1]".into()));
                }
            }
            PointStrategy::RandomGrid {
                points_per_100_units,
            } => {
                if !points_per_100_units.is_finite() || points_per_100_units < 0.0 {
                    return Err(Error::InvalidConfig(
                        "points_per_100_units must be >= 0".into(),
                    ));
                }
            }
            PointStrategy::Uniform { density } => {
                if !density.is_finite() || density < 0.0 {
                    return Err(Error::InvalidConfig("uniform density must be >= 0".into()));
                }
            }
            PointStrategy::PoissonDisk {
                radius,
                sample_attempts,
            } => {
                if !radius.is_finite() || radius <= 0.0 {
                    return Err(Error::InvalidConfig("poisson radius must be > 0".into()));
                }
                if sample_attempts == 0 {
                    return Err(Error::InvalidConfig(
                        "poisson sample_attempts must be >= 1".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// Convert into a boxed runtime sampler.
    pub fn sampler(&self) -> Box<dyn PositionSampling> {
        match *self {
            PointStrategy::JitterGrid { spacing, jitter } => {
                Box::new(JitterGridSampling::new(jitter, spacing))
            }
            PointStrategy::RandomGrid {
                points_per_100_units,
            } => Box::new(RandomGridSampling::new(points_per_100_units)),
            PointStrategy::Uniform { density } => Box::new(UniformRandomSampling::new(density)),
            PointStrategy::PoissonDisk {
                radius,
                sample_attempts,
            } => Box::new(PoissonDiskSampling::new(radius).with_sample_attempts(sample_attempts)),
        }
    }
}

/// Generate a random float in the range [0, 1].
#[inline]
pub(crate) fn rand01(rng: &mut dyn RngCore) -> f32 {
    (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0)
}

/// Compute the next smaller representable float value.
///
/// Returns a value that is strictly less than the input, useful for
/// ensuring bounds are strictly inside a domain.
#[inline]
pub(crate) fn next_down(val: f32) -> f32 {
    if val.is_nan() {
        return f32::NAN;
    }

    if val == f32::NEG_INFINITY {
        return f32::NEG_INFINITY;
    }

    if val == f32::INFINITY {
        return f32::MAX;
    }

    if val == 0.0 {
        return -f32::MIN_POSITIVE;
    }

    let bits = val.to_bits();
    if val > 0.0 {
        f32::from_bits(bits.saturating_sub(1))
    } else {
        f32::from_bits(bits.saturating_add(1))
    }
}
