//! Registry of placed plants with lazy pruning of destroyed individuals.
//!
//! Entries live in an arena of generation-checked slots. The tracker never owns
//! host objects: it stores a [`HostHandle`] per plant and asks the host whether
//! it still exists whenever counts are read. Dead entries are dropped on that
//! read and their slots recycled with a bumped generation, so stale
//! [`PlantHandle`]s never resolve to a newer plant.
use glam::{Vec2, Vec3};

use crate::scatter::context::PlacementPass;
use crate::scatter::host::{HostHandle, PlantHost};
use crate::scatter::species::SpeciesDef;

/// Weak reference to a tracked plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlantHandle {
    index: u32,
    generation: u32,
}

/// Runtime record of one placed plant.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedPlant {
    /// Index of the species in the generator's pool.
    pub species: usize,
    pub position: Vec3,
    pub pass: PlacementPass,
    pub host: HostHandle,
}

impl PlacedPlant {
    /// Horizontal (x, z) position.
    #[inline]
    pub fn ground_position(&self) -> Vec2 {
        Vec2::new(self.position.x, self.position.z)
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    plant: Option<PlacedPlant>,
}

#[derive(Debug, Default)]
pub struct PopulationTracker {
    slots: Vec<Slot>,
    free: Vec<u32>,
    tracked: usize,
}

impl PopulationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plant: PlacedPlant) -> PlantHandle {
        self.tracked += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.plant = Some(plant);
            return PlantHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            plant: Some(plant),
        });
        PlantHandle {
            index,
            generation: 0,
        }
    }

    pub fn get(&self, handle: PlantHandle) -> Option<&PlacedPlant> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.plant.as_ref())
    }

    /// Entries currently held, including ones the host may already have destroyed.
    pub fn tracked_len(&self) -> usize {
        self.tracked
    }

    fn release(&mut self, index: usize) {
        let slot = &mut self.slots[index];
        if slot.plant.take().is_some() {
            slot.generation = slot.generation.wrapping_add(1);
            self.free.push(index as u32);
            self.tracked -= 1;
        }
    }

    fn prune_where(&mut self, host: &dyn PlantHost, filter: impl Fn(&PlacedPlant) -> bool) -> usize {
        let mut removed = 0;
        for index in 0..self.slots.len() {
            let dead = match &self.slots[index].plant {
                Some(p) => filter(p) && !host.is_alive(p.host),
                None => false,
            };
            if dead {
                self.release(index);
                removed += 1;
            }
        }
        removed
    }

    /// Drops every entry whose host object is gone; returns how many were dropped.
    pub fn prune(&mut self, host: &dyn PlantHost) -> usize {
        self.prune_where(host, |_| true)
    }

    /// Live count of one species; dead entries of that species are dropped first.
    pub fn count_for(&mut self, species: usize, host: &dyn PlantHost) -> usize {
        self.prune_where(host, |p| p.species == species);
        self.iter().filter(|p| p.species == species).count()
    }

    /// Live count over all species.
    pub fn total_count(&mut self, host: &dyn PlantHost) -> usize {
        self.prune(host);
        self.tracked
    }

    /// Plants still missing to reach a nonzero target; 0 when unconstrained.
    pub fn shortfall(&mut self, species: usize, def: &SpeciesDef, host: &dyn PlantHost) -> usize {
        if def.target_count == 0 {
            return 0;
        }
        (def.target_count as usize).saturating_sub(self.count_for(species, host))
    }

    pub fn needs_regeneration(
        &mut self,
        species: usize,
        def: &SpeciesDef,
        host: &dyn PlantHost,
    ) -> bool {
        def.allow_regeneration && self.shortfall(species, def, host) > 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedPlant> {
        self.slots.iter().filter_map(|s| s.plant.as_ref())
    }

    /// Horizontal positions of all tracked plants.
    pub fn ground_positions(&self) -> Vec<Vec2> {
        self.iter().map(PlacedPlant::ground_position).collect()
    }

    /// Forgets all entries and despawns the ones still alive.
    pub fn clear(&mut self, host: &mut dyn PlantHost) {
        for index in 0..self.slots.len() {
            if let Some(p) = &self.slots[index].plant {
                if host.is_alive(p.host) {
                    host.despawn(p.host);
                }
            }
            self.release(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Quat;

    use super::*;
    use crate::scatter::host::{MemoryHost, SpawnRequest};

    fn spawn(
        host: &mut MemoryHost,
        tracker: &mut PopulationTracker,
        def: &SpeciesDef,
        species: usize,
        x: f32,
    ) -> PlantHandle {
        let position = Vec3::new(x, 0.0, 0.0);
        let handle = host
            .spawn(&SpawnRequest {
                species: def,
                position,
                rotation: Quat::IDENTITY,
                scale: 1.0,
                pass: PlacementPass::Initial,
            })
            .unwrap();
        tracker.register(PlacedPlant {
            species,
            position,
            pass: PlacementPass::Initial,
            host: handle,
        })
    }

    #[test]
    fn count_for_drops_destroyed_plants_on_read() {
        let def = SpeciesDef::new("bush").with_target_count(3);
        let mut host = MemoryHost::new();
        let mut tracker = PopulationTracker::new();
        let a = spawn(&mut host, &mut tracker, &def, 0, 0.0);
        spawn(&mut host, &mut tracker, &def, 0, 1.0);
        spawn(&mut host, &mut tracker, &def, 1, 2.0);

        let host_a = tracker.get(a).unwrap().host;
        host.despawn(host_a);
        assert_eq!(tracker.tracked_len(), 3);
        assert_eq!(tracker.count_for(0, &host), 1);
        assert_eq!(tracker.tracked_len(), 2);
        assert!(tracker.get(a).is_none());
        assert_eq!(tracker.count_for(1, &host), 1);
    }

    #[test]
    fn recycled_slots_invalidate_stale_handles() {
        let def = SpeciesDef::new("bush");
        let mut host = MemoryHost::new();
        let mut tracker = PopulationTracker::new();
        let old = spawn(&mut host, &mut tracker, &def, 0, 0.0);
        host.despawn(tracker.get(old).unwrap().host);
        tracker.prune(&host);

        let new = spawn(&mut host, &mut tracker, &def, 0, 5.0);
        assert!(tracker.get(old).is_none());
        assert_eq!(tracker.get(new).unwrap().position.x, 5.0);
    }

    #[test]
    fn needs_regeneration_respects_target_and_flag() {
        let mut host = MemoryHost::new();
        let mut tracker = PopulationTracker::new();
        let targeted = SpeciesDef::new("oak").with_target_count(2);
        let unconstrained = SpeciesDef::new("weed");
        let locked = SpeciesDef::new("rare")
            .with_target_count(5)
            .with_regeneration(false, 1.0);

        assert!(tracker.needs_regeneration(0, &targeted, &host));
        assert!(!tracker.needs_regeneration(1, &unconstrained, &host));
        assert!(!tracker.needs_regeneration(2, &locked, &host));

        spawn(&mut host, &mut tracker, &targeted, 0, 0.0);
        spawn(&mut host, &mut tracker, &targeted, 0, 1.0);
        assert!(!tracker.needs_regeneration(0, &targeted, &host));
        assert_eq!(tracker.shortfall(0, &targeted, &host), 0);
    }

    #[test]
    fn clear_despawns_everything() {
        let def = SpeciesDef::new("reed");
        let mut host = MemoryHost::new();
        let mut tracker = PopulationTracker::new();
        for i in 0..4 {
            spawn(&mut host, &mut tracker, &def, 0, i as f32);
        }
        tracker.clear(&mut host);
        assert!(host.is_empty());
        assert_eq!(tracker.total_count(&host), 0);
        assert!(tracker.ground_positions().is_empty());
    }
}
