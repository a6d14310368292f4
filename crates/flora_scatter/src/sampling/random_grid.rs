//! Density-per-area sampling expressed in points per 100 square units.
use mint::Vector2;
use rand::RngCore;

use crate::sampling::uniform_random::UniformRandomSampling;
use crate::sampling::PositionSampling;

/// Area covered by one unit of `points_per_100_units`.
pub const DENSITY_UNIT_AREA: f32 = 100.0;

/// Draws `round(w * h / 100 * points_per_100_units)` independent uniform points
/// over the whole domain.
#[derive(Debug, Clone)]
pub struct RandomGridSampling {
    pub points_per_100_units: f32,
}

impl RandomGridSampling {
    pub fn new(points_per_100_units: f32) -> Self {
        Self {
            points_per_100_units,
        }
    }

    fn uniform(&self) -> UniformRandomSampling {
        UniformRandomSampling::new(self.points_per_100_units / DENSITY_UNIT_AREA)
    }

    /// Number of points generated for a domain of `w` x `h`.
    pub fn count_for(&self, w: f32, h: f32) -> usize {
        self.uniform().count_for(w, h)
    }
}

impl PositionSampling for RandomGridSampling {
    fn generate(&self, domain_extent: Vector2<f32>, rng: &mut dyn RngCore) -> Vec<Vector2<f32>> {
        self.uniform().generate(domain_extent, rng)
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn count_follows_points_per_hundred_units() {
        let s = RandomGridSampling::new(3.0);
        assert_eq!(s.count_for(40.0, 20.0), 24);
        assert_eq!(s.count_for(25.0, 13.0), 10);
        assert_eq!(RandomGridSampling::new(f32::INFINITY).count_for(10.0, 10.0), 0);

        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(s.generate(Vec2::new(40.0, 20.0).into(), &mut rng).len(), 24);
    }

    #[test]
    fn draws_are_independent_not_per_cell_quotas() {
        let mut rng = StdRng::seed_from_u64(17);
        let pts = RandomGridSampling::new(4.0).generate(Vec2::new(100.0, 100.0).into(), &mut rng);
        assert_eq!(pts.len(), 400);

        let mut per_cell = [0usize; 100];
        for p in &pts {
            assert!(p.x >= -50.0 && p.x < 50.0);
            assert!(p.y >= -50.0 && p.y < 50.0);
            let cx = ((p.x + 50.0) / 10.0).floor() as usize;
            let cy = ((p.y + 50.0) / 10.0).floor() as usize;
            per_cell[cy * 10 + cx] += 1;
        }
        let min = per_cell.iter().min().copied().unwrap_or(0);
        let max = per_cell.iter().max().copied().unwrap_or(0);
        assert!(max > min, "every cell received exactly {min} points");
    }

    #[test]
    fn zero_density_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(RandomGridSampling::new(0.0)
            .generate(Vec2::new(10.0, 10.0).into(), &mut rng)
            .is_empty());
    }
}
