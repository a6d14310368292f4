//! Bevy plugin for flora_scatter providing the settings asset, scatterer components, messages, and systems.
#![forbid(unsafe_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub use assets::{FloraSettingsAsset, FloraSettingsAssetLoader};
use bevy::prelude::*;
pub use events::{FloraMessage, FloraMessageConfig};
use events::MessageSink;
use flora_scatter::prelude::*;
use host::CommandsHost;
pub use host::{FloraPlant, FloraPlantSpawned};

mod assets;
mod events;
mod host;

/// Convenient re-exports for common types. Import with `use bevy_flora_scatter::prelude::*;`.
pub mod prelude {
    pub use flora_scatter::prelude::*;

    pub use crate::assets::{FloraSettingsAsset, FloraSettingsAssetLoader};
    pub use crate::events::{FloraMessage, FloraMessageConfig};
    pub use crate::host::{FloraPlant, FloraPlantSpawned};
    pub use crate::{
        FloraAction, FloraCommand, FloraDensityMultipliers, FloraScatterPlugin, FloraScatterer,
        FloraSurface,
    };
}

/// Bevy plugin providing assets, resources, message types, and systems.
pub struct FloraScatterPlugin;

impl Plugin for FloraScatterPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<FloraMessage>()
            .init_asset::<FloraSettingsAsset>()
            .init_asset_loader::<FloraSettingsAssetLoader>()
            .init_resource::<FloraMessageConfig>()
            .init_resource::<FloraSurface>()
            .init_resource::<FloraDensityMultipliers>()
            .add_systems(Update, drive_scatterers)
            .add_observer(handle_flora_command);
    }
}

/// Ground used by every scatterer. Replace it with a sampler backed by your terrain.
#[derive(Resource, Clone)]
pub struct FloraSurface(pub Arc<dyn SurfaceSampler>);

impl Default for FloraSurface {
    fn default() -> Self {
        Self(Arc::new(FlatSurface::default()))
    }
}

/// External density multipliers keyed by [`GenerationSettings::id`]; 1.0 when absent.
#[derive(Resource, Clone, Debug, Default)]
pub struct FloraDensityMultipliers(pub HashMap<String, f32>);

/// Component driving one [`FloraScatter`] generator from a [`FloraSettingsAsset`].
///
/// The generator is built once the asset is loaded and, unless disabled, runs the
/// initial pass spread over frames. Plants are spawned as separate entities tagged
/// with [`FloraPlant`]. Pointing `settings` at another asset, or modifying the loaded
/// one, clears the plants and rebuilds the generator.
#[derive(Component)]
pub struct FloraScatterer {
    pub settings: Handle<FloraSettingsAsset>,
    /// Overrides the seed stored in the settings.
    pub seed: Option<u64>,
    generate_when_ready: bool,
    generator: Option<FloraScatter>,
    /// Asset the current generator (or the failed build) came from.
    built_from: Option<AssetId<FloraSettingsAsset>>,
    failed: bool,
}

impl FloraScatterer {
    pub fn new(settings: Handle<FloraSettingsAsset>) -> Self {
        Self {
            settings,
            seed: None,
            generate_when_ready: true,
            generator: None,
            built_from: None,
            failed: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the generator without running the initial pass; send
    /// [`FloraAction::Generate`] to start it.
    pub fn without_initial_generation(mut self) -> Self {
        self.generate_when_ready = false;
        self
    }

    /// The generator, once the settings asset is loaded and valid.
    pub fn generator(&self) -> Option<&FloraScatter> {
        self.generator.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.generator.is_some()
    }

    /// Drops the generator when its source asset was replaced or modified.
    fn invalidate_stale(
        &mut self,
        modified: &HashSet<AssetId<FloraSettingsAsset>>,
        host: &mut dyn PlantHost,
        sink: &mut dyn EventSink,
    ) {
        let Some(source) = self.built_from else {
            return;
        };
        if source == self.settings.id() && !modified.contains(&source) {
            return;
        }
        self.built_from = None;
        self.failed = false;
        if let Some(mut old) = self.generator.take() {
            old.clear_all(host, sink);
            self.generate_when_ready = true;
        }
    }

    fn ensure_generator(
        &mut self,
        entity: Entity,
        assets: &Assets<FloraSettingsAsset>,
        surface: &FloraSurface,
        multipliers: &FloraDensityMultipliers,
        sink: &mut dyn EventSink,
    ) -> bool {
        if self.generator.is_some() {
            return true;
        }
        if self.failed {
            return false;
        }
        let Some(asset) = assets.get(&self.settings) else {
            return false;
        };
        self.built_from = Some(self.settings.id());

        match asset.build(self.seed) {
            Ok(generator) => {
                debug!(
                    "Flora scatterer {:?} ready with {} species.",
                    entity,
                    generator.species().len()
                );
                self.generator = Some(
                    generator
                        .with_surface(surface.0.clone())
                        .with_density_multiplier(multipliers.0.clone()),
                );
                true
            }
            Err(err) => {
                error!("Flora settings invalid for {:?}: {}", entity, err);
                if sink.wants(ScatterEventKind::Warning) {
                    sink.send(ScatterEvent::Warning {
                        context: format!("scatterer:{entity:?}"),
                        message: err.to_string(),
                    });
                }
                self.failed = true;
                false
            }
        }
    }
}

/// Runtime control for a [`FloraScatterer`].
#[derive(Debug, Clone, PartialEq)]
pub enum FloraAction {
    /// Clear existing plants and run a new stepped initial pass.
    Generate,
    StartRegeneration,
    StopRegeneration,
    SetRegenerationEnabled(bool),
    /// Run one regeneration cycle immediately with the given per-species attempt cap.
    ForceRegenerate { attempts: usize },
    SetGenerationArea { center: Vec2, size: Vec2 },
    SetTargetCount { species: String, target: u32 },
    /// Despawn every plant of the scatterer.
    Clear,
}

/// [`EntityEvent`] applying a [`FloraAction`] to the scatterer entity.
#[derive(EntityEvent, Debug, Clone)]
pub struct FloraCommand {
    /// Scatterer entity.
    pub entity: Entity,
    pub action: FloraAction,
}

impl FloraCommand {
    pub fn new(entity: Entity, action: FloraAction) -> Self {
        Self { entity, action }
    }
}

#[allow(clippy::too_many_arguments)]
fn drive_scatterers(
    mut commands: Commands,
    time: Res<Time>,
    assets: Res<Assets<FloraSettingsAsset>>,
    surface: Res<FloraSurface>,
    multipliers: Res<FloraDensityMultipliers>,
    config: Res<FloraMessageConfig>,
    mut messages: ResMut<Messages<FloraMessage>>,
    mut asset_events: MessageReader<AssetEvent<FloraSettingsAsset>>,
    mut scatterers: Query<(Entity, &mut FloraScatterer)>,
    plants: Query<(), With<FloraPlant>>,
) {
    let exists = |entity: Entity| plants.contains(entity);
    let dt = time.delta_secs();
    let modified: HashSet<_> = asset_events
        .read()
        .filter_map(|event| match event {
            AssetEvent::Modified { id } => Some(*id),
            _ => None,
        })
        .collect();

    for (entity, mut scatterer) in scatterers.iter_mut() {
        let scatterer = &mut *scatterer;
        let mut sink = MessageSink {
            scatterer: entity,
            config: &config,
            messages: &mut messages,
        };

        {
            let mut host = CommandsHost::new(&mut commands, entity, &exists);
            scatterer.invalidate_stale(&modified, &mut host, &mut sink);
        }

        let built_now = scatterer.generator.is_none();
        if !scatterer.ensure_generator(entity, &assets, &surface, &multipliers, &mut sink) {
            continue;
        }
        let Some(generator) = scatterer.generator.as_mut() else {
            continue;
        };

        if !built_now {
            if surface.is_changed() {
                generator.set_surface(surface.0.clone());
            }
            if multipliers.is_changed() {
                generator.set_density_multiplier(multipliers.0.clone());
            }
        }

        let mut host = CommandsHost::new(&mut commands, entity, &exists);
        if scatterer.generate_when_ready {
            scatterer.generate_when_ready = false;
            generator.begin_generate_all(&mut host, &mut sink);
        }
        generator.update(dt, &mut host, &mut sink);
    }
}

fn handle_flora_command(
    command: On<FloraCommand>,
    mut commands: Commands,
    config: Res<FloraMessageConfig>,
    mut messages: ResMut<Messages<FloraMessage>>,
    mut scatterers: Query<&mut FloraScatterer>,
    plants: Query<(), With<FloraPlant>>,
) {
    let entity = command.entity;
    let Ok(mut scatterer) = scatterers.get_mut(entity) else {
        warn!("FloraCommand target {:?} has no FloraScatterer.", entity);
        return;
    };
    let scatterer = &mut *scatterer;

    let Some(generator) = scatterer.generator.as_mut() else {
        if command.action == FloraAction::Generate {
            scatterer.generate_when_ready = true;
        } else {
            warn!(
                "Flora scatterer {:?} is not ready; {:?} ignored.",
                entity, command.action
            );
        }
        return;
    };

    let exists = |e: Entity| plants.contains(e);
    let mut host = CommandsHost::new(&mut commands, entity, &exists);
    let mut sink = MessageSink {
        scatterer: entity,
        config: &config,
        messages: &mut messages,
    };

    match &command.action {
        FloraAction::Generate => generator.begin_generate_all(&mut host, &mut sink),
        FloraAction::StartRegeneration => generator.start_regeneration(),
        FloraAction::StopRegeneration => generator.stop_regeneration(&mut sink),
        FloraAction::SetRegenerationEnabled(enabled) => {
            generator.set_regeneration_enabled(*enabled, &mut sink)
        }
        FloraAction::ForceRegenerate { attempts } => {
            let placed = generator.force_regenerate(*attempts, &mut host, &mut sink);
            debug!("Forced regeneration on {:?} placed {} plants.", entity, placed);
        }
        FloraAction::SetGenerationArea { center, size } => {
            if let Err(err) = generator.set_generation_area(*center, *size) {
                warn!("Rejected generation area for {:?}: {}", entity, err);
            }
        }
        FloraAction::SetTargetCount { species, target } => {
            if let Err(err) = generator.set_plant_target_count(species, *target) {
                warn!("Rejected target count for {:?}: {}", entity, err);
            }
        }
        FloraAction::Clear => generator.clear_all(&mut host, &mut sink),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[derive(Resource, Default)]
    struct Collected(Vec<ScatterEventKind>);

    fn collect(mut reader: MessageReader<FloraMessage>, mut collected: ResMut<Collected>) {
        for msg in reader.read() {
            collected.0.push(msg.event.kind());
        }
    }

    fn meadow(target: u32) -> FloraSettingsAsset {
        let settings = GenerationSettings::new("meadow")
            .with_seed(3)
            .with_area(Vec2::ZERO, Vec2::splat(20.0))
            .with_density(DensitySettings {
                base_density: 1.0,
                noise_influence: 0.0,
                ..Default::default()
            })
            .with_regeneration(RegenerationSettings {
                check_interval: 1.0,
                ..Default::default()
            });
        FloraSettingsAsset::new(
            settings,
            vec![SpeciesDef::new("grass").with_target_count(target)],
        )
    }

    fn setup_app(asset: FloraSettingsAsset, initial: bool) -> (App, Entity) {
        let mut app = App::new();
        app.add_message::<FloraMessage>()
            .add_message::<AssetEvent<FloraSettingsAsset>>()
            .init_resource::<FloraMessageConfig>()
            .init_resource::<FloraSurface>()
            .init_resource::<FloraDensityMultipliers>()
            .init_resource::<Time>()
            .init_resource::<Collected>()
            .add_systems(Update, (drive_scatterers, collect).chain())
            .add_observer(handle_flora_command);

        let mut assets = Assets::<FloraSettingsAsset>::default();
        let handle = assets.add(asset);
        app.world_mut().insert_resource(assets);

        let mut scatterer = FloraScatterer::new(handle);
        if !initial {
            scatterer = scatterer.without_initial_generation();
        }
        let entity = app.world_mut().spawn(scatterer).id();
        (app, entity)
    }

    fn plants(app: &mut App) -> Vec<Entity> {
        let mut query = app.world_mut().query_filtered::<Entity, With<FloraPlant>>();
        query.iter(app.world()).collect()
    }

    fn count(app: &App, kind: ScatterEventKind) -> usize {
        app.world()
            .resource::<Collected>()
            .0
            .iter()
            .filter(|k| **k == kind)
            .count()
    }

    #[test]
    fn initial_pass_spawns_plants_over_several_frames() {
        let (mut app, scatterer) = setup_app(meadow(0), true);

        app.update();
        let first_frame = plants(&mut app).len();
        assert!(first_frame > 0 && first_frame <= 32);

        for _ in 0..10 {
            app.update();
        }
        let spawned = plants(&mut app);
        assert_eq!(spawned.len(), count(&app, ScatterEventKind::PlantPlaced));
        assert_eq!(count(&app, ScatterEventKind::GenerationStarted), 1);
        assert_eq!(count(&app, ScatterEventKind::GenerationFinished), 1);
        assert_eq!(count(&app, ScatterEventKind::CandidateRejected), 0);

        let plant = app.world().get::<FloraPlant>(spawned[0]).unwrap();
        assert_eq!(plant.scatterer, scatterer);
        assert_eq!(plant.species_id, "grass");
        let transform = app.world().get::<Transform>(spawned[0]).unwrap();
        assert_eq!(transform.translation.y, 0.0);
    }

    #[test]
    fn regeneration_replaces_despawned_plants() {
        let (mut app, _) = setup_app(meadow(10), true);
        for _ in 0..10 {
            app.update();
        }
        for entity in plants(&mut app).into_iter().skip(3) {
            app.world_mut().despawn(entity);
        }
        assert_eq!(plants(&mut app).len(), 3);

        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs(1));
        for _ in 0..3 {
            app.update();
        }

        let refilled = plants(&mut app).len();
        assert!((8..=10).contains(&refilled), "refilled {refilled}");
        assert!(count(&app, ScatterEventKind::RegenerationCycleFinished) >= 1);
    }

    #[test]
    fn commands_generate_and_clear() {
        let (mut app, scatterer) = setup_app(meadow(0), false);
        app.update();
        assert!(app.world().get::<FloraScatterer>(scatterer).unwrap().is_ready());
        assert!(plants(&mut app).is_empty());

        app.world_mut()
            .trigger(FloraCommand::new(scatterer, FloraAction::Generate));
        for _ in 0..10 {
            app.update();
        }
        assert!(!plants(&mut app).is_empty());

        app.world_mut()
            .trigger(FloraCommand::new(scatterer, FloraAction::Clear));
        app.update();
        assert!(plants(&mut app).is_empty());
    }

    #[test]
    fn invalid_settings_report_a_warning_once() {
        let asset = FloraSettingsAsset::new(GenerationSettings::new("empty"), Vec::new());
        let (mut app, scatterer) = setup_app(asset, true);
        app.update();
        app.update();

        assert!(!app.world().get::<FloraScatterer>(scatterer).unwrap().is_ready());
        assert!(plants(&mut app).is_empty());
        assert_eq!(count(&app, ScatterEventKind::Warning), 1);
    }

    #[test]
    fn replacing_invalid_settings_recovers() {
        let asset = FloraSettingsAsset::new(GenerationSettings::new("empty"), Vec::new());
        let (mut app, scatterer) = setup_app(asset, true);
        app.update();
        assert!(!app.world().get::<FloraScatterer>(scatterer).unwrap().is_ready());

        let valid = app
            .world_mut()
            .resource_mut::<Assets<FloraSettingsAsset>>()
            .add(meadow(0));
        app.world_mut()
            .get_mut::<FloraScatterer>(scatterer)
            .unwrap()
            .settings = valid;
        for _ in 0..10 {
            app.update();
        }

        assert!(app.world().get::<FloraScatterer>(scatterer).unwrap().is_ready());
        assert!(!plants(&mut app).is_empty());
        assert_eq!(count(&app, ScatterEventKind::Warning), 1);
    }

    #[test]
    fn modified_asset_rebuilds_the_generator() {
        let (mut app, scatterer) = setup_app(meadow(0), true);
        for _ in 0..10 {
            app.update();
        }
        let before = plants(&mut app);
        assert!(!before.is_empty());

        let id = app
            .world()
            .get::<FloraScatterer>(scatterer)
            .unwrap()
            .settings
            .id();
        app.world_mut()
            .resource_mut::<Messages<AssetEvent<FloraSettingsAsset>>>()
            .write(AssetEvent::Modified { id });
        for _ in 0..10 {
            app.update();
        }

        let after = plants(&mut app);
        assert_eq!(after.len(), before.len());
        assert!(before.iter().all(|e| !after.contains(e)));
        assert_eq!(count(&app, ScatterEventKind::GenerationStarted), 2);
    }
}
