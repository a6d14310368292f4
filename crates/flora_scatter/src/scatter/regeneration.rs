//! Throttled regeneration loop that tops species back up to their targets.
//!
//! The scheduler is a small state machine (`Idle -> Cycling -> Idle`). The host
//! advances it with [`RegenerationScheduler::tick`] every frame and drives an
//! active cycle through [`RegenerationScheduler::run_step`], which returns
//! [`Step::Continue`] after `budget` successful placements so the work spreads
//! over several frames.
use std::collections::VecDeque;

use glam::Vec2;
use tracing::debug;

use crate::scatter::context::{GenerationContext, PlacementPass};
use crate::scatter::events::{EventSink, ScatterEvent, ScatterEventKind};
use crate::scatter::host::PlantHost;
use crate::scatter::placement::{PlacementEngine, PlacementTargets};
use crate::scatter::population::PopulationTracker;
use crate::scatter::species::SpeciesDef;

/// Attempts granted per missing plant, before the per-cycle cap.
pub const ATTEMPTS_PER_MISSING_PLANT: usize = 3;

/// Result of one resumable step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Budget exhausted; call again next frame.
    Continue,
    /// Nothing left to do.
    Done,
}

#[derive(Debug)]
struct Cycle {
    queue: VecDeque<(usize, usize)>,
    current: Option<(usize, usize)>,
    positions: Vec<Vec2>,
    external_multiplier: f32,
    placed: usize,
    attempts: usize,
}

#[derive(Debug)]
enum State {
    Idle { elapsed: f32 },
    Cycling(Cycle),
}

#[derive(Debug)]
pub struct RegenerationScheduler {
    state: State,
    running: bool,
}

impl Default for RegenerationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RegenerationScheduler {
    pub fn new() -> Self {
        Self {
            state: State::Idle { elapsed: 0.0 },
            running: false,
        }
    }

    /// Enables periodic cycles; the interval timer restarts from zero.
    pub fn start(&mut self) {
        self.running = true;
        if let State::Idle { elapsed } = &mut self.state {
            *elapsed = 0.0;
        }
    }

    /// Disables periodic cycles and abandons an active cycle.
    pub fn stop(&mut self, sink: &mut dyn EventSink) {
        self.running = false;
        self.cancel(sink);
    }

    /// Abandons an active cycle without touching the periodic timer state.
    pub fn cancel(&mut self, sink: &mut dyn EventSink) {
        if let State::Cycling(cycle) = &self.state {
            debug!(
                "Regeneration cycle cancelled after {} attempts.",
                cycle.attempts
            );
            emit_finished(sink, cycle);
            self.state = State::Idle { elapsed: 0.0 };
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_cycling(&self) -> bool {
        matches!(self.state, State::Cycling(_))
    }

    /// Advances the interval timer; returns true when a cycle is due.
    pub fn tick(&mut self, dt: f32, interval: f32) -> bool {
        if !self.running {
            return false;
        }
        match &mut self.state {
            State::Idle { elapsed } => {
                *elapsed += dt.max(0.0);
                if *elapsed >= interval {
                    *elapsed = 0.0;
                    true
                } else {
                    false
                }
            }
            State::Cycling(_) => false,
        }
    }

    /// Starts a cycle. Returns false when a cycle is already active or no species
    /// is under target.
    pub fn begin_cycle(
        &mut self,
        species: &[SpeciesDef],
        tracker: &mut PopulationTracker,
        host: &dyn PlantHost,
        attempts_cap: usize,
        external_multiplier: f32,
        sink: &mut dyn EventSink,
    ) -> bool {
        if self.is_cycling() {
            debug!("Regeneration cycle already active; ignoring request.");
            return false;
        }

        tracker.prune(host);
        let mut queue = VecDeque::new();
        let mut deficits = Vec::new();
        for (index, def) in species.iter().enumerate() {
            if !tracker.needs_regeneration(index, def, host) {
                continue;
            }
            let needed = tracker.shortfall(index, def, host);
            let attempts = (needed * ATTEMPTS_PER_MISSING_PLANT).min(attempts_cap);
            if attempts > 0 {
                queue.push_back((index, attempts));
                deficits.push((def.id.clone(), needed));
            }
        }

        if queue.is_empty() {
            return false;
        }

        debug!("Regeneration cycle started for {} species.", queue.len());
        if sink.wants(ScatterEventKind::RegenerationCycleStarted) {
            sink.send(ScatterEvent::RegenerationCycleStarted { deficits });
        }

        self.state = State::Cycling(Cycle {
            queue,
            current: None,
            positions: tracker.ground_positions(),
            external_multiplier,
            placed: 0,
            attempts: 0,
        });
        true
    }

    /// External multiplier captured when the active cycle started.
    pub fn cycle_multiplier(&self) -> Option<f32> {
        match &self.state {
            State::Cycling(c) => Some(c.external_multiplier),
            State::Idle { .. } => None,
        }
    }

    /// Runs the active cycle until `budget` plants were placed or the cycle ends.
    pub fn run_step(
        &mut self,
        engine: &PlacementEngine<'_>,
        ctx: &mut GenerationContext,
        tracker: &mut PopulationTracker,
        host: &mut dyn PlantHost,
        sink: &mut dyn EventSink,
        budget: usize,
    ) -> Step {
        let State::Cycling(cycle) = &mut self.state else {
            return Step::Done;
        };
        let budget = budget.max(1);
        let area = engine.settings.area;
        let mut placed_this_step = 0;

        loop {
            let (species, attempts_left) = match cycle.current {
                Some(current) => current,
                None => match cycle.queue.pop_front() {
                    Some(next) => {
                        cycle.current = Some(next);
                        next
                    }
                    None => break,
                },
            };

            if attempts_left == 0
                || !tracker.needs_regeneration(species, &engine.species[species], &*host)
            {
                cycle.current = None;
                continue;
            }
            cycle.current = Some((species, attempts_left - 1));
            cycle.attempts += 1;

            let offset = Vec2::new(ctx.next_f32() - 0.5, ctx.next_f32() - 0.5) * area.size;
            let position = area.center + offset;

            let mut targets = PlacementTargets {
                tracker: &mut *tracker,
                host: &mut *host,
                sink: &mut *sink,
                existing: &mut cycle.positions,
            };
            let outcome = engine.try_place(ctx, &mut targets, position, PlacementPass::Regeneration);

            let placed = outcome.placed_count();
            cycle.placed += placed;
            placed_this_step += placed;
            if placed_this_step >= budget {
                return Step::Continue;
            }
        }

        debug!(
            "Regeneration cycle finished: placed={} attempts={}.",
            cycle.placed, cycle.attempts
        );
        emit_finished(sink, cycle);
        self.state = State::Idle { elapsed: 0.0 };
        Step::Done
    }
}

fn emit_finished(sink: &mut dyn EventSink, cycle: &Cycle) {
    if sink.wants(ScatterEventKind::RegenerationCycleFinished) {
        sink.send(ScatterEvent::RegenerationCycleFinished {
            placed: cycle.placed,
            attempts: cycle.attempts,
        });
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::noise::{NoiseField, NoiseSettings};
    use crate::scatter::events::VecSink;
    use crate::scatter::host::MemoryHost;
    use crate::scatter::population::PlacedPlant;
    use crate::scatter::settings::{DensitySettings, GenerationSettings};
    use crate::surface::FlatSurface;

    #[test]
    fn timer_fires_only_while_running() {
        let mut scheduler = RegenerationScheduler::new();
        assert!(!scheduler.tick(10.0, 1.0));

        scheduler.start();
        assert!(!scheduler.tick(0.6, 1.0));
        assert!(scheduler.tick(0.6, 1.0));
        assert!(!scheduler.tick(0.6, 1.0));

        scheduler.stop(&mut ());
        assert!(!scheduler.is_running());
        assert!(!scheduler.tick(5.0, 1.0));
    }

    #[test]
    fn cycle_is_skipped_without_deficit() {
        let species = vec![SpeciesDef::new("oak").with_target_count(1)];
        let mut tracker = PopulationTracker::new();
        let mut host = MemoryHost::new();
        let handle = host
            .spawn(&crate::scatter::host::SpawnRequest {
                species: &species[0],
                position: Vec3::ZERO,
                rotation: glam::Quat::IDENTITY,
                scale: 1.0,
                pass: PlacementPass::Initial,
            })
            .unwrap();
        tracker.register(PlacedPlant {
            species: 0,
            position: Vec3::ZERO,
            pass: PlacementPass::Initial,
            host: handle,
        });

        let mut scheduler = RegenerationScheduler::new();
        let mut sink = VecSink::new();
        assert!(!scheduler.begin_cycle(&species, &mut tracker, &host, 50, 1.0, &mut sink));
        assert!(!scheduler.is_cycling());
        assert!(sink.is_empty());

        host.despawn(handle);
        assert!(scheduler.begin_cycle(&species, &mut tracker, &host, 50, 1.0, &mut sink));
        assert!(!scheduler.begin_cycle(&species, &mut tracker, &host, 50, 1.0, &mut sink));
        assert_eq!(sink.len(), 1);
        assert_eq!(scheduler.cycle_multiplier(), Some(1.0));
    }

    #[test]
    fn run_step_yields_after_budget_and_finishes() {
        let settings = GenerationSettings::new("regen")
            .with_seed(8)
            .with_density(DensitySettings {
                base_density: 1.0,
                noise_influence: 0.0,
                ..Default::default()
            });
        let species = vec![SpeciesDef::new("reed").with_target_count(6)];
        let noise_settings = NoiseSettings::default();
        let noise = NoiseField::new(noise_settings.clone(), 8);
        let surface = FlatSurface::default();
        let engine = PlacementEngine {
            settings: &settings,
            species: &species,
            noise: &noise,
            surface: &surface,
            external_multiplier: 1.0,
        };
        let mut ctx = GenerationContext::new(8, &noise_settings);
        let mut tracker = PopulationTracker::new();
        let mut host = MemoryHost::new();
        let mut sink = VecSink::without_rejections();

        let mut scheduler = RegenerationScheduler::new();
        assert!(scheduler.begin_cycle(&species, &mut tracker, &host, 50, 1.0, &mut sink));

        let step = scheduler.run_step(&engine, &mut ctx, &mut tracker, &mut host, &mut sink, 2);
        assert_eq!(step, Step::Continue);
        assert_eq!(host.len(), 2);

        let mut steps = 1;
        while scheduler.run_step(&engine, &mut ctx, &mut tracker, &mut host, &mut sink, 2)
            == Step::Continue
        {
            steps += 1;
        }
        assert!(steps >= 2);
        assert!(!scheduler.is_cycling());
        assert_eq!(host.len(), 6);
        assert!(matches!(
            sink.as_slice().last(),
            Some(ScatterEvent::RegenerationCycleFinished { placed: 6, .. })
        ));
    }

    #[test]
    fn cancel_reports_partial_cycle() {
        let species = vec![SpeciesDef::new("reed").with_target_count(3)];
        let mut tracker = PopulationTracker::new();
        let host = MemoryHost::new();
        let mut sink = VecSink::new();
        let mut scheduler = RegenerationScheduler::new();
        scheduler.start();

        assert!(scheduler.begin_cycle(&species, &mut tracker, &host, 50, 1.0, &mut sink));
        scheduler.cancel(&mut sink);
        assert!(!scheduler.is_cycling());
        assert!(scheduler.is_running());
        assert!(matches!(
            sink.as_slice(),
            [
                ScatterEvent::RegenerationCycleStarted { .. },
                ScatterEvent::RegenerationCycleFinished { placed: 0, attempts: 0 }
            ]
        ));
    }
}
