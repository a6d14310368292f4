//! Jittered-grid position sampling strategy.
use glam::Vec2;
use mint::Vector2;
use rand::RngCore;

use crate::sampling::{rand01, PositionSampling};

/// Regular lattice at `spacing` with each vertex displaced by up to
/// `spacing * jitter` per axis. Displaced points that leave the domain are dropped.
#[derive(Debug, Clone)]
pub struct JitterGridSampling {
    /// Jitter amount in [0, 1], relative to `spacing`.
    pub jitter: f32,
    /// Lattice spacing in world units.
    pub spacing: f32,
}

impl JitterGridSampling {
    /// Create a new JitterGridSampling with specified jitter (0.0 to 1.0).
    pub fn new(jitter: f32, spacing: f32) -> Self {
        Self {
            jitter: jitter.clamp(0.0, 1.0),
            spacing,
        }
    }

    /// Lattice vertices along one axis of length `len`, centered on the origin.
    fn axis_vertices(&self, len: f32) -> impl Iterator<Item = f32> + '_ {
        let half = len * 0.5;
        let count = (len / self.spacing).ceil().max(1.0) as usize;
        (0..count)
            .map(move |i| -half + self.spacing * (i as f32 + 0.5))
            .filter(move |v| *v < half)
    }
}

impl PositionSampling for JitterGridSampling {
    fn generate(&self, domain_extent: Vector2<f32>, rng: &mut dyn RngCore) -> Vec<Vector2<f32>> {
        let domain_extent = Vec2::from(domain_extent);
        if domain_extent.x <= 0.0 || domain_extent.y <= 0.0 {
            return Vec::new();
        }
        if !self.spacing.is_finite() || self.spacing <= 0.0 {
            return Vec::new();
        }

        let half = domain_extent * 0.5;
        let amplitude = self.spacing * self.jitter;
        let xs: Vec<f32> = self.axis_vertices(domain_extent.x).collect();
        let ys: Vec<f32> = self.axis_vertices(domain_extent.y).collect();

        let mut points = Vec::with_capacity(xs.len() * ys.len());
        for &y in &ys {
            for &x in &xs {
                let mut p = Vec2::new(x, y);
                if amplitude > 0.0 {
                    p.x += (rand01(rng) * 2.0 - 1.0) * amplitude;
                    p.y += (rand01(rng) * 2.0 - 1.0) * amplitude;
                }
                if p.x < -half.x || p.x >= half.x || p.y < -half.y || p.y >= half.y {
                    continue;
                }
                points.push(p.into());
            }
        }

        points
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn jitter_is_clamped_to_unit_range() {
        assert_eq!(JitterGridSampling::new(2.0, 1.0).jitter, 1.0);
        assert_eq!(JitterGridSampling::new(-0.5, 1.0).jitter, 0.0);
    }

    #[test]
    fn generate_returns_lattice_without_jitter() {
        let strategy = JitterGridSampling::new(0.0, 2.0);
        let mut rng = StdRng::seed_from_u64(1);
        let points = strategy.generate(Vec2::new(4.0, 4.0).into(), &mut rng);

        assert_eq!(points.len(), 4);
        let mut xs: Vec<_> = points.iter().map(|p| p.x).collect();
        xs.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(xs, vec![-1.0, -1.0, 1.0, 1.0]);
    }

    #[test]
    fn points_stay_near_lattice_and_inside_area() {
        for seed in 0..8u64 {
            let spacing = 3.0 + seed as f32 * 0.5;
            let jitter = 0.1 * seed as f32;
            let extent = Vec2::new(37.0, 22.0);
            let strategy = JitterGridSampling::new(jitter, spacing);
            let mut rng = StdRng::seed_from_u64(seed);
            let points = strategy.generate(extent.into(), &mut rng);
            assert!(!points.is_empty());

            let half = extent * 0.5;
            let xs: Vec<f32> = strategy.axis_vertices(extent.x).collect();
            let ys: Vec<f32> = strategy.axis_vertices(extent.y).collect();
            for p in points {
                assert!(p.x >= -half.x && p.x < half.x);
                assert!(p.y >= -half.y && p.y < half.y);
                let near = xs.iter().any(|x| (p.x - x).abs() <= spacing * jitter + 1e-4)
                    && ys.iter().any(|y| (p.y - y).abs() <= spacing * jitter + 1e-4);
                assert!(near, "{p:?} too far from lattice");
            }
        }
    }

    #[test]
    fn degenerate_extents_yield_nothing() {
        let strategy = JitterGridSampling::new(0.0, 1.0);
        let mut rng = StdRng::seed_from_u64(42);
        for extent in [Vec2::new(0.0, 5.0), Vec2::new(5.0, -1.0)] {
            assert!(strategy.generate(extent.into(), &mut rng).is_empty());
        }
    }
}
