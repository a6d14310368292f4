//! Poisson disc sampling (Bridson) with a minimum distance between points.
use std::f32::consts::{SQRT_2, TAU};

use glam::Vec2;
use mint::Vector2;
use rand::RngCore;

use crate::sampling::{rand01, PositionSampling};

/// Default number of candidates tried around an active point before it is retired.
pub const DEFAULT_SAMPLE_ATTEMPTS: u32 = 30;

/// Blue-noise candidates: no two points closer than `radius`.
#[derive(Debug, Clone)]
pub struct PoissonDiskSampling {
    pub radius: f32,
    /// Candidates tried around an active point before it is deactivated.
    pub sample_attempts: u32,
    /// Hard cap on generated points; derived from the area when `None`.
    pub max_points: Option<usize>,
}

impl PositionSampling for PoissonDiskSampling {
    fn generate(&self, domain_extent: Vector2<f32>, rng: &mut dyn RngCore) -> Vec<Vector2<f32>> {
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Vec::new();
        }
        let extent = Vec2::from(domain_extent);
        if extent.x <= 0.0 || extent.y <= 0.0 {
            return Vec::new();
        }

        let budget = self
            .max_points
            .unwrap_or_else(|| area_budget(extent, self.radius));
        Bridson::new(self.radius, extent)
            .run(rng, self.sample_attempts.max(1), budget)
            .into_iter()
            .map(Into::into)
            .collect()
    }
}

impl PoissonDiskSampling {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            sample_attempts: DEFAULT_SAMPLE_ATTEMPTS,
            max_points: None,
        }
    }

    pub fn with_sample_attempts(mut self, sample_attempts: u32) -> Self {
        self.sample_attempts = sample_attempts;
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = Some(max_points);
        self
    }
}

/// Upper bound on the number of points a disc packing with spacing `radius` can hold.
fn area_budget(extent: Vec2, radius: f32) -> usize {
    let area = extent.x * extent.y;
    (2.0 * area / (radius * radius)).ceil() as usize + 1
}

/// Bridson state: accepted points, the acceleration grid indexing them and the active set.
struct Bridson {
    min_dist: f32,
    min_dist_sq: f32,
    extent: Vec2,
    cell: f32,
    cols: usize,
    rows: usize,
    /// Index into `points` per cell; a cell of size `min_dist / sqrt(2)` holds at most one.
    cells: Vec<Option<u32>>,
    points: Vec<Vec2>,
    active: Vec<u32>,
}

impl Bridson {
    fn new(min_dist: f32, extent: Vec2) -> Self {
        let cell = min_dist / SQRT_2;
        let cols = (extent.x / cell).ceil() as usize + 1;
        let rows = (extent.y / cell).ceil() as usize + 1;
        Self {
            min_dist,
            min_dist_sq: min_dist * min_dist,
            extent,
            cell,
            cols,
            rows,
            cells: vec![None; cols * rows],
            points: Vec::new(),
            active: Vec::new(),
        }
    }

    fn cell_of(&self, p: Vec2) -> (usize, usize) {
        let local = (p + self.extent * 0.5) / self.cell;
        let col = (local.x.floor().max(0.0) as usize).min(self.cols - 1);
        let row = (local.y.floor().max(0.0) as usize).min(self.rows - 1);
        (col, row)
    }

    fn inside(&self, p: Vec2) -> bool {
        let half = self.extent * 0.5;
        (-half.x..half.x).contains(&p.x) && (-half.y..half.y).contains(&p.y)
    }

    /// True when `p` lies in the domain and no accepted point is closer than `min_dist`.
    fn accepts(&self, p: Vec2) -> bool {
        if !self.inside(p) {
            return false;
        }
        let (col, row) = self.cell_of(p);
        let cols = col.saturating_sub(2)..(col + 3).min(self.cols);
        for r in row.saturating_sub(2)..(row + 3).min(self.rows) {
            let occupied = self.cells[r * self.cols + cols.start..r * self.cols + cols.end]
                .iter()
                .flatten();
            for &index in occupied {
                if self.points[index as usize].distance_squared(p) < self.min_dist_sq {
                    return false;
                }
            }
        }
        true
    }

    fn insert(&mut self, p: Vec2) {
        let (col, row) = self.cell_of(p);
        let index = self.points.len() as u32;
        self.cells[row * self.cols + col] = Some(index);
        self.points.push(p);
        self.active.push(index);
    }

    /// Tries `attempts` candidates in the annulus `[min_dist, 2 * min_dist)` around `origin`.
    fn spawn_near(&self, rng: &mut dyn RngCore, origin: Vec2, attempts: u32) -> Option<Vec2> {
        (0..attempts).find_map(|_| {
            let direction = Vec2::from_angle(rand01(rng) * TAU);
            let candidate = origin + direction * self.min_dist * (1.0 + rand01(rng));
            self.accepts(candidate).then_some(candidate)
        })
    }

    fn run(mut self, rng: &mut dyn RngCore, attempts: u32, budget: usize) -> Vec<Vec2> {
        let seed = (Vec2::new(rand01(rng), rand01(rng)) - Vec2::splat(0.5)) * self.extent;
        if !self.accepts(seed) {
            return Vec::new();
        }
        self.insert(seed);

        while !self.active.is_empty() && self.points.len() < budget {
            let slot = ((rand01(rng) * self.active.len() as f32) as usize).min(self.active.len() - 1);
            let origin = self.points[self.active[slot] as usize];
            match self.spawn_near(rng, origin, attempts) {
                Some(p) => self.insert(p),
                None => {
                    self.active.swap_remove(slot);
                }
            }
        }
        self.points
    }
}
