//! Per-candidate placement: noise, density, surface, species, spacing and clusters.
use std::f32::consts::TAU;

use glam::{Quat, Vec2, Vec3};
use tracing::warn;

use crate::noise::NoiseField;
use crate::scatter::context::{GenerationContext, PlacementPass};
use crate::scatter::events::{EventSink, RejectReason, ScatterEvent, ScatterEventKind};
use crate::scatter::host::{PlantHost, SpawnRequest};
use crate::scatter::population::{PlacedPlant, PlantHandle, PopulationTracker};
use crate::scatter::selection::select_species;
use crate::scatter::settings::GenerationSettings;
use crate::scatter::species::SpeciesDef;
use crate::surface::{SurfaceHit, SurfaceSampler};

/// Outcome of [`PlacementEngine::try_place`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementOutcome {
    Placed {
        species: usize,
        primary: PlantHandle,
        /// Secondary cluster members spawned around the primary plant.
        clustered: usize,
    },
    Rejected(RejectReason),
}

impl PlacementOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementOutcome::Placed { .. })
    }

    /// Plants spawned by this attempt, cluster members included.
    pub fn placed_count(&self) -> usize {
        match self {
            PlacementOutcome::Placed { clustered, .. } => 1 + clustered,
            PlacementOutcome::Rejected(_) => 0,
        }
    }
}

/// Mutable state a placement writes into.
pub struct PlacementTargets<'a> {
    pub tracker: &'a mut PopulationTracker,
    pub host: &'a mut dyn PlantHost,
    pub sink: &'a mut dyn EventSink,
    /// Horizontal positions checked for minimum spacing; accepted plants are appended.
    pub existing: &'a mut Vec<Vec2>,
}

/// Read-only view of everything needed to judge and place candidates.
pub struct PlacementEngine<'a> {
    pub settings: &'a GenerationSettings,
    pub species: &'a [SpeciesDef],
    pub noise: &'a NoiseField,
    pub surface: &'a dyn SurfaceSampler,
    /// External density multiplier sampled once for the current pass.
    pub external_multiplier: f32,
}

impl<'a> PlacementEngine<'a> {
    pub fn try_place(
        &self,
        ctx: &mut GenerationContext,
        targets: &mut PlacementTargets<'_>,
        position: Vec2,
        pass: PlacementPass,
    ) -> PlacementOutcome {
        match self.place_primary(ctx, targets, position, pass) {
            Ok((species, primary)) => {
                let clustered = self.place_cluster(ctx, targets, species, position, pass);
                PlacementOutcome::Placed {
                    species,
                    primary,
                    clustered,
                }
            }
            Err(reason) => {
                if targets.sink.wants(ScatterEventKind::CandidateRejected) {
                    targets.sink.send(ScatterEvent::CandidateRejected {
                        position,
                        pass,
                        reason,
                    });
                }
                PlacementOutcome::Rejected(reason)
            }
        }
    }

    /// Acceptance probability after multipliers for a raw noise value.
    pub fn acceptance_probability(&self, raw_noise: f32, pass: PlacementPass) -> f32 {
        let density = &self.settings.density;
        let regen = if pass.is_regeneration() {
            self.settings.regeneration.density_multiplier
        } else {
            1.0
        };
        let effective = density.base_density * regen * self.external_multiplier;
        density.acceptance(density.curve.apply(raw_noise), effective)
    }

    fn place_primary(
        &self,
        ctx: &mut GenerationContext,
        targets: &mut PlacementTargets<'_>,
        position: Vec2,
        pass: PlacementPass,
    ) -> Result<(usize, PlantHandle), RejectReason> {
        if !self.settings.area.contains(position) {
            return Err(RejectReason::OutsideArea);
        }

        let density = &self.settings.density;
        let noise = self.noise.evaluate(ctx, position, pass);
        if noise < density.min_threshold || noise > density.max_threshold {
            return Err(RejectReason::NoiseThreshold);
        }
        if ctx.next_f32() >= self.acceptance_probability(noise, pass) {
            return Err(RejectReason::Density);
        }

        let hit = self
            .surface
            .sample(position, &self.settings.terrain.probe())
            .ok_or(RejectReason::NoSurface)?;

        let species = select_species(
            self.species,
            noise,
            hit.height,
            hit.slope_degrees,
            pass,
            ctx.rng(),
        )
        .ok_or(RejectReason::NoSpecies)?;
        let def = &self.species[species];

        if pass.is_regeneration() {
            if !targets
                .tracker
                .needs_regeneration(species, def, &*targets.host)
            {
                return Err(RejectReason::TargetReached);
            }
            if self.violates_spacing(position, targets.existing.as_slice()) {
                return Err(RejectReason::Spacing);
            }
        }

        let handle = self
            .spawn(ctx, targets, species, position, &hit, pass, false)
            .ok_or(RejectReason::SpawnFailed)?;
        Ok((species, handle))
    }

    fn place_cluster(
        &self,
        ctx: &mut GenerationContext,
        targets: &mut PlacementTargets<'_>,
        species: usize,
        origin: Vec2,
        pass: PlacementPass,
    ) -> usize {
        let def = &self.species[species];
        let Some(cluster) = &def.cluster else {
            return 0;
        };
        let sizes = def.cluster_sizes();
        let size = ctx.range_u32_inclusive(*sizes.start(), *sizes.end());
        let probe = self.settings.terrain.probe();

        let mut placed = 0;
        for _ in 1..size {
            let angle = ctx.next_f32() * TAU;
            let distance = ctx.next_f32() * cluster.radius;
            let position = origin + Vec2::from_angle(angle) * distance;

            if !self.settings.area.contains(position) {
                continue;
            }
            let Some(hit) = self.surface.sample(position, &probe) else {
                continue;
            };
            if !def.accepts_height(hit.height) || !def.accepts_slope(hit.slope_degrees) {
                continue;
            }
            if pass.is_regeneration() && self.violates_spacing(position, targets.existing.as_slice()) {
                continue;
            }
            if self
                .spawn(ctx, targets, species, position, &hit, pass, true)
                .is_some()
            {
                placed += 1;
            }
        }
        placed
    }

    fn violates_spacing(&self, position: Vec2, existing: &[Vec2]) -> bool {
        let spacing = self.settings.regeneration.minimum_spacing;
        if spacing <= 0.0 {
            return false;
        }
        let spacing_sq = spacing * spacing;
        existing
            .iter()
            .any(|p| p.distance_squared(position) < spacing_sq)
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn(
        &self,
        ctx: &mut GenerationContext,
        targets: &mut PlacementTargets<'_>,
        species: usize,
        position: Vec2,
        hit: &SurfaceHit,
        pass: PlacementPass,
        clustered: bool,
    ) -> Option<PlantHandle> {
        let def = &self.species[species];
        let yaw = Quat::from_rotation_y(ctx.next_f32() * TAU);
        let rotation = if self.settings.terrain.align_to_normal {
            Quat::from_rotation_arc(Vec3::Y, hit.normal) * yaw
        } else {
            yaw
        };
        let scale = ctx.range_f32(def.scale_range.0, def.scale_range.1);
        let world = Vec3::new(position.x, hit.height, position.y);

        let request = SpawnRequest {
            species: def,
            position: world,
            rotation,
            scale,
            pass,
        };
        let Some(host_handle) = targets.host.spawn(&request) else {
            warn!("Host failed to spawn species '{}' at {:?}.", def.id, world);
            if targets.sink.wants(ScatterEventKind::Warning) {
                targets.sink.send(ScatterEvent::Warning {
                    context: format!("species:{}", def.id),
                    message: "Host failed to spawn plant".into(),
                });
            }
            return None;
        };

        let handle = targets.tracker.register(PlacedPlant {
            species,
            position: world,
            pass,
            host: host_handle,
        });
        targets.existing.push(position);

        if targets.sink.wants(ScatterEventKind::PlantPlaced) {
            targets.sink.send(ScatterEvent::PlantPlaced {
                species_id: def.id.clone(),
                position,
                pass,
                clustered,
            });
        }
        Some(handle)
    }
}
