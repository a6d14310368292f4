use flora_scatter::prelude::*;
use flora_scatter_examples::{init_tracing, render_plants_to_png, RenderConfig, SpeciesStyle};
use glam::Vec2;

const FRAME: f32 = 1.0 / 30.0;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = GenerationSettings::new("forest")
        .with_seed(11)
        .with_area(Vec2::ZERO, Vec2::new(80.0, 80.0))
        .with_strategy(PointStrategy::PoissonDisk {
            radius: 3.0,
            sample_attempts: 30,
        })
        .with_regeneration(RegenerationSettings {
            check_interval: 2.0,
            attempts_per_cycle: 40,
            minimum_spacing: 2.5,
            ..Default::default()
        })
        .with_max_plants_per_frame(8);

    let species = vec![
        SpeciesDef::new("berry_bush")
            .with_target_count(60)
            .with_cluster(ClusterSettings::new(1, 3, 2.0)),
        SpeciesDef::new("oak")
            .with_spawn_probability(0.4)
            .with_target_count(30)
            .with_regeneration(true, 2.0),
    ];

    let mut scatter = FloraScatter::try_new(settings.clone(), species)?;
    let mut host = MemoryHost::new();
    let mut sink = VecSink::without_rejections();

    scatter.begin_generate_all(&mut host, &mut sink);
    let mut frames = 0;
    while scatter.update(FRAME, &mut host, &mut sink) == Step::Continue {
        frames += 1;
    }
    println!("initial pass took {} frames", frames + 1);

    let mut config = RenderConfig::new((640, 640), settings.area);
    config
        .set_species_style(
            "berry_bush",
            SpeciesStyle {
                color: [170, 40, 90],
                radius: 3,
            },
        )
        .set_species_style(
            "oak",
            SpeciesStyle {
                color: [40, 90, 30],
                radius: 6,
            },
        );
    render_plants_to_png(&host, &config, "regeneration-before.png")?;

    // Harvest every other bush and a third of the oaks.
    for handle in host.handles_of("berry_bush").into_iter().step_by(2) {
        host.despawn(handle);
    }
    for handle in host.handles_of("oak").into_iter().step_by(3) {
        host.despawn(handle);
    }
    println!(
        "after harvest: bushes={} oaks={}",
        scatter.plant_count_for("berry_bush", &host)?,
        scatter.plant_count_for("oak", &host)?
    );
    render_plants_to_png(&host, &config, "regeneration-harvested.png")?;

    sink.clear();
    for _ in 0..(10.0 / FRAME) as usize {
        scatter.update(FRAME, &mut host, &mut sink);
    }
    for event in sink.as_slice() {
        match event {
            ScatterEvent::RegenerationCycleStarted { deficits } => {
                println!("cycle started: {deficits:?}");
            }
            ScatterEvent::RegenerationCycleFinished { placed, attempts } => {
                println!("cycle finished: placed={placed} attempts={attempts}");
            }
            _ => {}
        }
    }
    println!(
        "after regrowth: bushes={} oaks={}",
        scatter.plant_count_for("berry_bush", &host)?,
        scatter.plant_count_for("oak", &host)?
    );
    render_plants_to_png(&host, &config, "regeneration-after.png")
}
