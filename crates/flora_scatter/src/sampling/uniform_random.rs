//! Uniform random position sampling strategy.
use mint::Vector2;
use rand::RngCore;

use crate::sampling::{next_down, rand01, PositionSampling};

/// Uniform i.i.d. random sampling; the point count is `area * density`.
#[derive(Debug, Clone)]
pub struct UniformRandomSampling {
    /// Expected points per square world unit.
    pub density: f32,
}

impl UniformRandomSampling {
    pub fn new(density: f32) -> Self {
        Self { density }
    }

    /// Number of points generated for a domain of `w` x `h`.
    pub fn count_for(&self, w: f32, h: f32) -> usize {
        if !self.density.is_finite() || self.density <= 0.0 || w <= 0.0 || h <= 0.0 {
            return 0;
        }
        (w * h * self.density).round() as usize
    }
}

impl PositionSampling for UniformRandomSampling {
    fn generate(&self, domain_extent: Vector2<f32>, rng: &mut dyn RngCore) -> Vec<Vector2<f32>> {
        let w = domain_extent.x;
        let h = domain_extent.y;

        let count = self.count_for(w, h);
        if count == 0 {
            return Vec::new();
        }

        let half_w = w * 0.5;
        let half_h = h * 0.5;
        // Next representable floats below the right/top edges to enforce strict < comparisons
        let max_x = next_down(half_w);
        let max_y = next_down(half_h);

        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let x = (rand01(rng) * w - half_w).clamp(-half_w, max_x);
            let y = (rand01(rng) * h - half_h).clamp(-half_h, max_y);
            out.push(Vector2 { x, y });
        }

        out
    }
}
