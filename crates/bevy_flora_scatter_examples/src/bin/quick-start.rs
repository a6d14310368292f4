use bevy::prelude::*;
use bevy_flora_scatter::prelude::*;

#[derive(Resource)]
struct SpeciesVisuals {
    grass: (Handle<Mesh>, Handle<StandardMaterial>),
    bush: (Handle<Mesh>, Handle<StandardMaterial>),
    tree: (Handle<Mesh>, Handle<StandardMaterial>),
}

fn main() {
    App::new()
        .add_plugins(DefaultPlugins)
        .add_plugins(FloraScatterPlugin)
        .add_systems(Startup, setup)
        .add_systems(Update, (keyboard_controls, log_flora_messages))
        .add_observer(attach_visuals)
        .run();
}

/// Spawns camera, light, ground and the scatterer.
fn setup(
    mut commands: Commands,
    assets: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 55.0, 60.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(20.0, 40.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(60.0, 60.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.45, 0.38, 0.25))),
    ));

    commands.insert_resource(SpeciesVisuals {
        grass: (
            meshes.add(Cone::new(0.25, 0.6)),
            materials.add(Color::srgb(0.45, 0.75, 0.3)),
        ),
        bush: (
            meshes.add(Sphere::new(0.6)),
            materials.add(Color::srgb(0.2, 0.5, 0.2)),
        ),
        tree: (
            meshes.add(Cone::new(0.9, 3.0)),
            materials.add(Color::srgb(0.1, 0.3, 0.12)),
        ),
    });

    // The scatterer builds its generator once the settings asset has loaded.
    commands.spawn(FloraScatterer::new(assets.load("meadow.flora")).with_seed(42));
}

/// Gives every spawned plant a mesh depending on its species.
fn attach_visuals(
    spawned: On<FloraPlantSpawned>,
    mut commands: Commands,
    visuals: Res<SpeciesVisuals>,
) {
    let (mesh, material) = match spawned.species_id.as_str() {
        "tree" => &visuals.tree,
        "bush" => &visuals.bush,
        _ => &visuals.grass,
    };
    commands
        .entity(spawned.entity)
        .insert((Mesh3d(mesh.clone()), MeshMaterial3d(material.clone())));
}

/// H: harvest about half the plants, R: force a regeneration cycle,
/// G: regenerate everything, C: clear.
fn keyboard_controls(
    mut commands: Commands,
    keys: Res<ButtonInput<KeyCode>>,
    scatterers: Query<Entity, With<FloraScatterer>>,
    plants: Query<Entity, With<FloraPlant>>,
) {
    let action = if keys.just_pressed(KeyCode::KeyR) {
        Some(FloraAction::ForceRegenerate { attempts: 60 })
    } else if keys.just_pressed(KeyCode::KeyG) {
        Some(FloraAction::Generate)
    } else if keys.just_pressed(KeyCode::KeyC) {
        Some(FloraAction::Clear)
    } else {
        None
    };

    if keys.just_pressed(KeyCode::KeyH) {
        let mut harvested = 0;
        for plant in &plants {
            if rand::random::<f32>() < 0.5 {
                commands.entity(plant).despawn();
                harvested += 1;
            }
        }
        info!("Harvested {harvested} plants.");
    }

    if let Some(action) = action {
        for scatterer in &scatterers {
            commands.trigger(FloraCommand::new(scatterer, action.clone()));
        }
    }
}

fn log_flora_messages(mut reader: MessageReader<FloraMessage>) {
    for msg in reader.read() {
        match &msg.event {
            ScatterEvent::GenerationStarted {
                seed,
                candidate_count,
            } => {
                info!(
                    "Generation started on {:?}: seed={seed} candidates={candidate_count}",
                    msg.scatterer
                );
            }
            ScatterEvent::GenerationFinished { report } => {
                info!(
                    "Generation finished: placed={} clustered={} rejected={}",
                    report.placed(),
                    report.clustered,
                    report.rejected
                );
            }
            ScatterEvent::RegenerationCycleStarted { deficits } => {
                info!("Regeneration cycle started: {deficits:?}");
            }
            ScatterEvent::RegenerationCycleFinished { placed, attempts } => {
                info!("Regeneration cycle finished: placed={placed} attempts={attempts}");
            }
            ScatterEvent::Warning { context, message } => {
                warn!("Warning '{}': {}", context, message);
            }
            _ => {}
        }
    }
}
