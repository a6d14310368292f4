//! High-level generator: initial population, regeneration and host-facing controls.
use std::collections::HashMap;

use glam::Vec2;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::noise::NoiseField;
use crate::scatter::context::{GenerationContext, PlacementPass};
use crate::scatter::events::{EventSink, ScatterEvent, ScatterEventKind};
use crate::scatter::host::PlantHost;
use crate::scatter::placement::{PlacementEngine, PlacementOutcome, PlacementTargets};
use crate::scatter::population::PopulationTracker;
use crate::scatter::regeneration::{RegenerationScheduler, Step};
use crate::scatter::settings::{GenerationArea, GenerationSettings};
use crate::scatter::species::SpeciesDef;
use crate::surface::{FlatSurface, SurfaceSampler};

/// External density scaling keyed by the settings identity.
pub trait DensityMultiplier: Send + Sync {
    fn density_multiplier(&self, settings_id: &str) -> f32;
}

impl DensityMultiplier for () {
    fn density_multiplier(&self, _settings_id: &str) -> f32 {
        1.0
    }
}

impl DensityMultiplier for f32 {
    fn density_multiplier(&self, _settings_id: &str) -> f32 {
        *self
    }
}

impl DensityMultiplier for HashMap<String, f32> {
    fn density_multiplier(&self, settings_id: &str) -> f32 {
        self.get(settings_id).copied().unwrap_or(1.0)
    }
}

/// Summary of an initial generation pass.
#[non_exhaustive]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationReport {
    pub seed: u64,
    /// Candidates produced by the point strategy.
    pub candidates: usize,
    /// Candidates accepted as primary plants.
    pub accepted: usize,
    /// Secondary cluster members spawned.
    pub clustered: usize,
    pub rejected: usize,
}

impl GenerationReport {
    /// All plants spawned by the pass.
    pub fn placed(&self) -> usize {
        self.accepted + self.clustered
    }
}

/// Initial pass in progress, consumed in budgeted steps.
struct InitialPass {
    candidates: Vec<Vec2>,
    cursor: usize,
    positions: Vec<Vec2>,
    external_multiplier: f32,
    report: GenerationReport,
}

/// Vegetation generator bound to one settings object and species pool.
pub struct FloraScatter {
    settings: GenerationSettings,
    species: Vec<SpeciesDef>,
    noise: NoiseField,
    ctx: GenerationContext,
    surface: Box<dyn SurfaceSampler>,
    density: Box<dyn DensityMultiplier>,
    tracker: PopulationTracker,
    scheduler: RegenerationScheduler,
    initial: Option<InitialPass>,
}

impl FloraScatter {
    /// Validates the configuration and builds an idle generator over a flat surface.
    pub fn try_new(settings: GenerationSettings, species: Vec<SpeciesDef>) -> Result<Self> {
        settings.validate()?;
        validate_species(&species)?;

        let ctx = match settings.seed {
            Some(seed) => GenerationContext::new(seed, &settings.noise),
            None => GenerationContext::from_entropy(&settings.noise),
        };
        let noise = NoiseField::new(settings.noise.clone(), ctx.seed());

        Ok(Self {
            settings,
            species,
            noise,
            ctx,
            surface: Box::new(FlatSurface::default()),
            density: Box::new(()),
            tracker: PopulationTracker::new(),
            scheduler: RegenerationScheduler::new(),
            initial: None,
        })
    }

    pub fn with_surface(mut self, surface: impl SurfaceSampler + 'static) -> Self {
        self.surface = Box::new(surface);
        self
    }

    pub fn with_density_multiplier(mut self, density: impl DensityMultiplier + 'static) -> Self {
        self.density = Box::new(density);
        self
    }

    pub fn set_surface(&mut self, surface: impl SurfaceSampler + 'static) {
        self.surface = Box::new(surface);
    }

    pub fn set_density_multiplier(&mut self, density: impl DensityMultiplier + 'static) {
        self.density = Box::new(density);
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    pub fn species(&self) -> &[SpeciesDef] {
        &self.species
    }

    pub fn tracker(&self) -> &PopulationTracker {
        &self.tracker
    }

    /// Seed of the current (or last) generation.
    pub fn seed(&self) -> u64 {
        self.ctx.seed()
    }

    pub fn species_index(&self, id: &str) -> Result<usize> {
        self.species
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::UnknownSpecies { id: id.to_owned() })
    }

    fn external_multiplier(&self) -> f32 {
        let m = self.density.density_multiplier(&self.settings.id);
        if m.is_finite() {
            m.max(0.0)
        } else {
            warn!(
                "Density multiplier for '{}' is not finite; using 1.0.",
                self.settings.id
            );
            1.0
        }
    }

    /// Clears the population and runs the initial pass to completion.
    pub fn generate_all(
        &mut self,
        host: &mut dyn PlantHost,
        sink: &mut dyn EventSink,
    ) -> GenerationReport {
        self.begin_generate_all(host, sink);
        loop {
            if let (Step::Done, report) = self.step_initial(host, sink, usize::MAX) {
                return report.unwrap_or_default();
            }
        }
    }

    /// Clears the population and queues the initial pass; [`Self::update`] consumes it
    /// in steps of `max_plants_per_frame` placements.
    pub fn begin_generate_all(&mut self, host: &mut dyn PlantHost, sink: &mut dyn EventSink) {
        self.scheduler.cancel(sink);
        self.tracker.clear(host);

        self.ctx = match self.settings.seed {
            Some(seed) => GenerationContext::new(seed, &self.settings.noise),
            None => GenerationContext::from_entropy(&self.settings.noise),
        };
        self.noise = NoiseField::new(self.settings.noise.clone(), self.ctx.seed());

        let area = self.settings.area;
        let candidates: Vec<Vec2> = self
            .settings
            .strategy
            .sampler()
            .generate(area.size.into(), self.ctx.rng())
            .into_iter()
            .map(Vec2::from)
            .map(|p| p + area.center)
            .collect();

        info!(
            "Generation '{}' started: seed={} candidates={}.",
            self.settings.id,
            self.ctx.seed(),
            candidates.len()
        );
        if sink.wants(ScatterEventKind::GenerationStarted) {
            sink.send(ScatterEvent::GenerationStarted {
                seed: self.ctx.seed(),
                candidate_count: candidates.len(),
            });
        }

        self.initial = Some(InitialPass {
            report: GenerationReport {
                seed: self.ctx.seed(),
                candidates: candidates.len(),
                ..Default::default()
            },
            candidates,
            cursor: 0,
            positions: Vec::new(),
            external_multiplier: self.external_multiplier(),
        });
    }

    fn step_initial(
        &mut self,
        host: &mut dyn PlantHost,
        sink: &mut dyn EventSink,
        budget: usize,
    ) -> (Step, Option<GenerationReport>) {
        let Some(mut pass) = self.initial.take() else {
            return (Step::Done, None);
        };

        let engine = PlacementEngine {
            settings: &self.settings,
            species: &self.species,
            noise: &self.noise,
            surface: self.surface.as_ref(),
            external_multiplier: pass.external_multiplier,
        };
        let mut placed_this_step = 0;

        while pass.cursor < pass.candidates.len() {
            let position = pass.candidates[pass.cursor];
            pass.cursor += 1;

            let mut targets = PlacementTargets {
                tracker: &mut self.tracker,
                host: &mut *host,
                sink: &mut *sink,
                existing: &mut pass.positions,
            };
            match engine.try_place(&mut self.ctx, &mut targets, position, PlacementPass::Initial) {
                PlacementOutcome::Placed { clustered, .. } => {
                    pass.report.accepted += 1;
                    pass.report.clustered += clustered;
                    placed_this_step += 1 + clustered;
                }
                PlacementOutcome::Rejected(_) => pass.report.rejected += 1,
            }

            if placed_this_step >= budget && pass.cursor < pass.candidates.len() {
                self.initial = Some(pass);
                return (Step::Continue, None);
            }
        }

        let report = pass.report;
        info!(
            "Generation '{}' finished: placed={} rejected={} of {} candidates.",
            self.settings.id,
            report.placed(),
            report.rejected,
            report.candidates
        );
        if sink.wants(ScatterEventKind::GenerationFinished) {
            sink.send(ScatterEvent::GenerationFinished {
                report: report.clone(),
            });
        }
        if self.settings.regeneration.enabled {
            self.scheduler.start();
        }
        (Step::Done, Some(report))
    }

    /// Per-frame driver. Continues a pending initial pass, otherwise advances the
    /// regeneration timer and the active cycle.
    pub fn update(&mut self, dt: f32, host: &mut dyn PlantHost, sink: &mut dyn EventSink) -> Step {
        let budget = self.settings.max_plants_per_frame as usize;
        if self.initial.is_some() {
            let (step, _) = self.step_initial(host, sink, budget);
            return step;
        }

        let interval = self.settings.regeneration.check_interval;
        if self.scheduler.tick(dt, interval) {
            let cap = self.settings.regeneration.attempts_per_cycle as usize;
            let multiplier = self.external_multiplier();
            self.scheduler.begin_cycle(
                &self.species,
                &mut self.tracker,
                &*host,
                cap,
                multiplier,
                sink,
            );
        }

        self.step_regeneration(host, sink, budget)
    }

    fn step_regeneration(
        &mut self,
        host: &mut dyn PlantHost,
        sink: &mut dyn EventSink,
        budget: usize,
    ) -> Step {
        let Some(multiplier) = self.scheduler.cycle_multiplier() else {
            return Step::Done;
        };
        let engine = PlacementEngine {
            settings: &self.settings,
            species: &self.species,
            noise: &self.noise,
            surface: self.surface.as_ref(),
            external_multiplier: multiplier,
        };
        self.scheduler
            .run_step(&engine, &mut self.ctx, &mut self.tracker, host, sink, budget)
    }

    /// Enables periodic regeneration cycles.
    pub fn start_regeneration(&mut self) {
        if !self.settings.regeneration.enabled {
            warn!(
                "Regeneration is disabled for '{}'; start request ignored.",
                self.settings.id
            );
            return;
        }
        self.scheduler.start();
    }

    /// Disables periodic regeneration; an active cycle ends before its next step.
    pub fn stop_regeneration(&mut self, sink: &mut dyn EventSink) {
        self.scheduler.stop(sink);
    }

    pub fn set_regeneration_enabled(&mut self, enabled: bool, sink: &mut dyn EventSink) {
        self.settings.regeneration.enabled = enabled;
        if enabled {
            self.scheduler.start();
        } else {
            self.scheduler.stop(sink);
        }
    }

    /// Runs one regeneration cycle immediately with `attempts` as the per-species cap.
    /// Ignored (returns 0) while another cycle or the initial pass is in progress.
    pub fn force_regenerate(
        &mut self,
        attempts: usize,
        host: &mut dyn PlantHost,
        sink: &mut dyn EventSink,
    ) -> usize {
        if self.initial.is_some() || self.scheduler.is_cycling() {
            return 0;
        }
        let before = self.tracker.total_count(&*host);
        let multiplier = self.external_multiplier();
        if !self.scheduler.begin_cycle(
            &self.species,
            &mut self.tracker,
            &*host,
            attempts,
            multiplier,
            sink,
        ) {
            return 0;
        }
        while self.step_regeneration(host, sink, usize::MAX) == Step::Continue {}
        self.tracker.total_count(&*host).saturating_sub(before)
    }

    /// Moves or resizes the generation area used by later passes.
    pub fn set_generation_area(&mut self, center: Vec2, size: Vec2) -> Result<()> {
        if !(size.x > 0.0 && size.y > 0.0) {
            return Err(Error::InvalidConfig(
                "area size must be > 0 in both components".into(),
            ));
        }
        self.settings.area = GenerationArea::new(center, size);
        Ok(())
    }

    pub fn set_plant_target_count(&mut self, species_id: &str, target: u32) -> Result<()> {
        let index = self.species_index(species_id)?;
        self.species[index].target_count = target;
        Ok(())
    }

    /// Live plants over all species.
    pub fn plant_count(&mut self, host: &dyn PlantHost) -> usize {
        self.tracker.total_count(host)
    }

    /// Live plants of one species.
    pub fn plant_count_for(&mut self, species_id: &str, host: &dyn PlantHost) -> Result<usize> {
        let index = self.species_index(species_id)?;
        Ok(self.tracker.count_for(index, host))
    }

    pub fn is_regenerating(&self) -> bool {
        self.scheduler.is_cycling()
    }

    pub fn is_generating(&self) -> bool {
        self.initial.is_some()
    }

    /// Despawns every tracked plant and abandons pending work.
    pub fn clear_all(&mut self, host: &mut dyn PlantHost, sink: &mut dyn EventSink) {
        self.initial = None;
        self.scheduler.cancel(sink);
        self.tracker.clear(host);
    }
}

fn validate_species(species: &[SpeciesDef]) -> Result<()> {
    if species.is_empty() {
        return Err(Error::MissingSpecies);
    }
    for (i, s) in species.iter().enumerate() {
        s.validate()?;
        if species[..i].iter().any(|other| other.id == s.id) {
            return Err(Error::InvalidConfig(format!(
                "duplicate species id '{}'",
                s.id
            )));
        }
    }
    if species.iter().all(|s| s.spawn_probability <= 0.0) {
        warn!("Every species has zero spawn probability; nothing will be placed.");
    }
    Ok(())
}
