//! Terrain probing interface consumed by the placement engine.
//!
//! The host world implements [`SurfaceSampler`] (usually as a downward ray cast).
//! [`FlatSurface`] and [`HeightFieldSurface`] cover headless use and tests.
use std::sync::Arc;

use glam::{Vec2, Vec3};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bit mask of ground classifications a probe may hit.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroundMask(pub u32);

impl GroundMask {
    pub const NONE: GroundMask = GroundMask(0);
    pub const ALL: GroundMask = GroundMask(u32::MAX);

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn intersects(self, other: GroundMask) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for GroundMask {
    fn default() -> Self {
        GroundMask::ALL
    }
}

/// Parameters of a downward probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceProbe {
    /// World height the probe starts from.
    pub origin_height: f32,
    /// Maximum distance travelled downwards.
    pub max_distance: f32,
    /// Ground classifications that count as a hit.
    pub ground_mask: GroundMask,
}

impl SurfaceProbe {
    /// Whether a surface at `height` lies inside the probed interval.
    #[inline]
    pub fn reaches(&self, height: f32) -> bool {
        height <= self.origin_height && height >= self.origin_height - self.max_distance
    }
}

/// Result of a successful probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub height: f32,
    /// Unit surface normal.
    pub normal: Vec3,
    /// Angle between `normal` and +Y in degrees.
    pub slope_degrees: f32,
}

impl SurfaceHit {
    pub fn new(height: f32, normal: Vec3) -> Self {
        let normal = normal.try_normalize().unwrap_or(Vec3::Y);
        Self {
            height,
            normal,
            slope_degrees: slope_degrees(normal),
        }
    }
}

/// Angle between a unit normal and the up axis, in degrees.
#[inline]
pub fn slope_degrees(normal: Vec3) -> f32 {
    normal.dot(Vec3::Y).clamp(-1.0, 1.0).acos().to_degrees()
}

/// Ground query service. `position` is the horizontal (x, z) coordinate.
pub trait SurfaceSampler: Send + Sync {
    fn sample(&self, position: Vec2, probe: &SurfaceProbe) -> Option<SurfaceHit>;
}

impl<S: SurfaceSampler + ?Sized> SurfaceSampler for Arc<S> {
    fn sample(&self, position: Vec2, probe: &SurfaceProbe) -> Option<SurfaceHit> {
        (**self).sample(position, probe)
    }
}

impl<S: SurfaceSampler + ?Sized> SurfaceSampler for Box<S> {
    fn sample(&self, position: Vec2, probe: &SurfaceProbe) -> Option<SurfaceHit> {
        (**self).sample(position, probe)
    }
}

/// Horizontal plane at a fixed height.
#[derive(Debug, Clone, Copy)]
pub struct FlatSurface {
    pub height: f32,
    pub ground: GroundMask,
}

impl FlatSurface {
    pub fn new(height: f32) -> Self {
        Self {
            height,
            ground: GroundMask(1),
        }
    }

    pub fn with_ground(mut self, ground: GroundMask) -> Self {
        self.ground = ground;
        self
    }
}

impl Default for FlatSurface {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl SurfaceSampler for FlatSurface {
    fn sample(&self, _position: Vec2, probe: &SurfaceProbe) -> Option<SurfaceHit> {
        if !probe.ground_mask.intersects(self.ground) || !probe.reaches(self.height) {
            return None;
        }
        Some(SurfaceHit::new(self.height, Vec3::Y))
    }
}

type HeightFn = dyn Fn(Vec2) -> Option<f32> + Send + Sync;
type GroundFn = dyn Fn(Vec2) -> GroundMask + Send + Sync;

/// Terrain described by a height function; normals come from central differences.
///
/// The height function returns `None` where there is no ground (holes, water).
pub struct HeightFieldSurface {
    height: Box<HeightFn>,
    ground: Box<GroundFn>,
    step: f32,
}

impl HeightFieldSurface {
    pub fn new(height: impl Fn(Vec2) -> Option<f32> + Send + Sync + 'static) -> Self {
        Self {
            height: Box::new(height),
            ground: Box::new(|_| GroundMask(1)),
            step: 0.25,
        }
    }

    /// Classify ground per position; probes whose mask does not intersect it miss.
    pub fn with_ground(mut self, ground: impl Fn(Vec2) -> GroundMask + Send + Sync + 'static) -> Self {
        self.ground = Box::new(ground);
        self
    }

    /// Finite-difference step used for normals.
    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step.max(1e-4);
        self
    }

    fn normal_at(&self, position: Vec2, center: f32) -> Vec3 {
        let h = self.step;
        let at = |p: Vec2| (self.height)(p).unwrap_or(center);
        let dx = at(position + Vec2::X * h) - at(position - Vec2::X * h);
        let dz = at(position + Vec2::Y * h) - at(position - Vec2::Y * h);
        Vec3::new(-dx, 2.0 * h, -dz).normalize()
    }
}

impl SurfaceSampler for HeightFieldSurface {
    fn sample(&self, position: Vec2, probe: &SurfaceProbe) -> Option<SurfaceHit> {
        if !probe.ground_mask.intersects((self.ground)(position)) {
            return None;
        }
        let height = (self.height)(position)?;
        if !probe.reaches(height) {
            return None;
        }
        Some(SurfaceHit::new(height, self.normal_at(position, height)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe() -> SurfaceProbe {
        SurfaceProbe {
            origin_height: 100.0,
            max_distance: 200.0,
            ground_mask: GroundMask::ALL,
        }
    }

    #[test]
    fn flat_surface_reports_zero_slope() {
        let hit = FlatSurface::new(2.0).sample(Vec2::ZERO, &probe()).unwrap();
        assert_eq!(hit.height, 2.0);
        assert!(hit.slope_degrees.abs() < 1e-4);
    }

    #[test]
    fn probe_misses_outside_range_or_mask() {
        let surface = FlatSurface::new(150.0);
        assert!(surface.sample(Vec2::ZERO, &probe()).is_none());

        let masked = SurfaceProbe {
            ground_mask: GroundMask(2),
            ..probe()
        };
        assert!(FlatSurface::new(0.0).sample(Vec2::ZERO, &masked).is_none());
    }

    #[test]
    fn height_field_slope_matches_incline() {
        // 45 degree ramp along x.
        let ramp = HeightFieldSurface::new(|p| Some(p.x));
        let hit = ramp.sample(Vec2::new(3.0, 1.0), &probe()).unwrap();
        assert!((hit.slope_degrees - 45.0).abs() < 0.01);
        assert!((hit.height - 3.0).abs() < 1e-5);
    }

    #[test]
    fn height_field_holes_miss() {
        let holey = HeightFieldSurface::new(|p| (p.x > 0.0).then_some(0.0));
        assert!(holey.sample(Vec2::new(-1.0, 0.0), &probe()).is_none());
        assert!(holey.sample(Vec2::new(1.0, 0.0), &probe()).is_some());
    }

    #[test]
    fn arc_forwards_to_inner_sampler() {
        let shared: Arc<dyn SurfaceSampler> = Arc::new(FlatSurface::new(1.0));
        assert_eq!(shared.sample(Vec2::ZERO, &probe()).unwrap().height, 1.0);
    }
}
