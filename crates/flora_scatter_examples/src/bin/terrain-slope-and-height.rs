use flora_scatter::prelude::*;
use flora_scatter_examples::{init_tracing, render_plants_to_png, RenderConfig, SpeciesStyle};
use glam::Vec2;

fn height(p: Vec2) -> Option<f32> {
    let h = (p.x * 0.06).sin() * 12.0 + (p.y * 0.045).cos() * 9.0 + p.x * 0.15;
    // A lake in the lowest part of the map.
    (h > -14.0).then_some(h)
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let surface = HeightFieldSurface::new(height);
    let settings = GenerationSettings::new("valley")
        .with_seed(3)
        .with_area(Vec2::ZERO, Vec2::new(160.0, 160.0))
        .with_terrain(TerrainSettings {
            align_to_normal: true,
            ..Default::default()
        })
        .with_strategy(PointStrategy::PoissonDisk {
            radius: 1.8,
            sample_attempts: 30,
        });

    let species = vec![
        SpeciesDef::new("reed").with_height_range(-14.0, -8.0),
        SpeciesDef::new("grass")
            .with_height_range(-8.0, 10.0)
            .with_max_slope(35.0),
        SpeciesDef::new("pine")
            .with_height_range(6.0, 40.0)
            .with_spawn_probability(0.5)
            .with_cluster(ClusterSettings::new(1, 3, 3.0)),
        SpeciesDef::new("rock").with_spawn_probability(0.1),
    ];

    let mut scatter =
        FloraScatter::try_new(settings.clone(), species)?.with_surface(surface);
    let mut host = MemoryHost::new();
    let mut rejected = std::collections::HashMap::<RejectReason, usize>::new();
    let mut sink = FnSink::new(|event| {
        if let ScatterEvent::CandidateRejected { reason, .. } = event {
            *rejected.entry(reason).or_default() += 1;
        }
    });
    let report = scatter.generate_all(&mut host, &mut sink);
    println!("placed {} plants", report.placed());
    for (reason, n) in &rejected {
        println!("  rejected {reason:?}: {n}");
    }

    let mut config = RenderConfig::new((800, 800), settings.area).with_shading(|p| {
        match height(p) {
            Some(h) => {
                let t = ((h + 14.0) / 50.0).clamp(0.0, 1.0);
                let v = (120.0 + t * 120.0) as u8;
                [v, v, (v as f32 * 0.85) as u8]
            }
            None => [70, 110, 190],
        }
    });
    config
        .set_species_style(
            "reed",
            SpeciesStyle {
                color: [150, 170, 60],
                radius: 2,
            },
        )
        .set_species_style(
            "grass",
            SpeciesStyle {
                color: [60, 160, 60],
                radius: 2,
            },
        )
        .set_species_style(
            "pine",
            SpeciesStyle {
                color: [20, 80, 40],
                radius: 5,
            },
        )
        .set_species_style(
            "rock",
            SpeciesStyle {
                color: [110, 110, 110],
                radius: 4,
            },
        );
    render_plants_to_png(&host, &config, "terrain-slope-and-height.png")
}
