//! Host-world primitives: spawning plants and checking whether they still exist.
//!
//! The host owns every spawned object. The library only keeps [`HostHandle`]s and
//! asks [`PlantHost::is_alive`] when it needs to know.
use std::collections::HashMap;

use glam::{Quat, Vec3};

use crate::scatter::context::PlacementPass;
use crate::scatter::species::SpeciesDef;

/// Opaque handle issued by the host for a spawned plant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostHandle(pub u64);

/// Everything the host needs to instantiate a plant.
#[derive(Debug, Clone, Copy)]
pub struct SpawnRequest<'a> {
    pub species: &'a SpeciesDef,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub pass: PlacementPass,
}

pub trait PlantHost {
    /// Spawns a plant; `None` when the host could not instantiate it.
    fn spawn(&mut self, request: &SpawnRequest<'_>) -> Option<HostHandle>;

    fn is_alive(&self, handle: HostHandle) -> bool;

    /// Destroys a plant. Unknown or already destroyed handles are ignored.
    fn despawn(&mut self, handle: HostHandle);
}

/// A plant as stored by [`MemoryHost`].
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryPlant {
    pub species_id: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub pass: PlacementPass,
}

/// In-memory host for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemoryHost {
    next: u64,
    plants: HashMap<HostHandle, MemoryPlant>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }

    pub fn get(&self, handle: HostHandle) -> Option<&MemoryPlant> {
        self.plants.get(&handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (HostHandle, &MemoryPlant)> {
        self.plants.iter().map(|(h, p)| (*h, p))
    }

    /// Handles of all live plants in spawn order.
    pub fn handles(&self) -> Vec<HostHandle> {
        let mut handles: Vec<_> = self.plants.keys().copied().collect();
        handles.sort();
        handles
    }

    /// Handles of live plants of one species in spawn order.
    pub fn handles_of(&self, species_id: &str) -> Vec<HostHandle> {
        let mut handles: Vec<_> = self
            .plants
            .iter()
            .filter(|(_, p)| p.species_id == species_id)
            .map(|(h, _)| *h)
            .collect();
        handles.sort();
        handles
    }
}

impl PlantHost for MemoryHost {
    fn spawn(&mut self, request: &SpawnRequest<'_>) -> Option<HostHandle> {
        let handle = HostHandle(self.next);
        self.next += 1;
        self.plants.insert(
            handle,
            MemoryPlant {
                species_id: request.species.id.clone(),
                position: request.position,
                rotation: request.rotation,
                scale: request.scale,
                pass: request.pass,
            },
        );
        Some(handle)
    }

    fn is_alive(&self, handle: HostHandle) -> bool {
        self.plants.contains_key(&handle)
    }

    fn despawn(&mut self, handle: HostHandle) {
        self.plants.remove(&handle);
    }
}
