use std::collections::HashSet;

use bevy::prelude::*;
use flora_scatter::prelude::{HostHandle, PlacementPass, PlantHost, SpawnRequest};

/// Marker for plants spawned by a [`crate::FloraScatterer`].
#[derive(Component, Debug, Clone)]
pub struct FloraPlant {
    pub species_id: String,
    /// Scatterer entity that spawned the plant.
    pub scatterer: Entity,
    pub pass: PlacementPass,
}

/// [`EntityEvent`] triggered after a plant entity was spawned. Observe it to attach
/// meshes, scenes or gameplay components per species.
#[derive(EntityEvent, Debug, Clone)]
pub struct FloraPlantSpawned {
    /// The new plant entity.
    pub entity: Entity,
    pub scatterer: Entity,
    pub species_id: String,
}

/// [`PlantHost`] backed by [`Commands`].
///
/// Spawns are deferred until the command queue is applied, so entities created during
/// the current run are tracked as pending and reported alive.
pub(crate) struct CommandsHost<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
    scatterer: Entity,
    exists: &'a dyn Fn(Entity) -> bool,
    pending: HashSet<Entity>,
    despawned: HashSet<Entity>,
}

impl<'a, 'w, 's> CommandsHost<'a, 'w, 's> {
    pub fn new(
        commands: &'a mut Commands<'w, 's>,
        scatterer: Entity,
        exists: &'a dyn Fn(Entity) -> bool,
    ) -> Self {
        Self {
            commands,
            scatterer,
            exists,
            pending: HashSet::new(),
            despawned: HashSet::new(),
        }
    }
}

fn entity_of(handle: HostHandle) -> Entity {
    Entity::from_bits(handle.0)
}

impl PlantHost for CommandsHost<'_, '_, '_> {
    fn spawn(&mut self, request: &SpawnRequest<'_>) -> Option<HostHandle> {
        let species_id = request.species.id.clone();
        let entity = self
            .commands
            .spawn((
                FloraPlant {
                    species_id: species_id.clone(),
                    scatterer: self.scatterer,
                    pass: request.pass,
                },
                Transform {
                    translation: request.position,
                    rotation: request.rotation,
                    scale: Vec3::splat(request.scale),
                },
            ))
            .id();
        self.pending.insert(entity);
        self.commands.trigger(FloraPlantSpawned {
            entity,
            scatterer: self.scatterer,
            species_id,
        });
        Some(HostHandle(entity.to_bits()))
    }

    fn is_alive(&self, handle: HostHandle) -> bool {
        let entity = entity_of(handle);
        !self.despawned.contains(&entity)
            && (self.pending.contains(&entity) || (self.exists)(entity))
    }

    fn despawn(&mut self, handle: HostHandle) {
        let entity = entity_of(handle);
        if self.is_alive(handle) && self.despawned.insert(entity) {
            self.pending.remove(&entity);
            self.commands.entity(entity).try_despawn();
        }
    }
}
