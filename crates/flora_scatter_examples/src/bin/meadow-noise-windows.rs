use flora_scatter::prelude::*;
use flora_scatter_examples::{init_tracing, render_plants_to_png, RenderConfig, SpeciesStyle};
use glam::Vec2;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = GenerationSettings::new("meadow")
        .with_seed(42)
        .with_area(Vec2::ZERO, Vec2::new(100.0, 100.0))
        .with_noise(NoiseSettings::default().with_scale(0.04).with_octaves(4))
        .with_density(DensitySettings {
            base_density: 0.8,
            curve: DensityCurve::SmoothStep,
            noise_influence: 0.7,
            min_threshold: 0.25,
            ..Default::default()
        })
        .with_strategy(PointStrategy::JitterGrid {
            spacing: 1.5,
            jitter: 0.8,
        });

    // Disjoint noise windows split the meadow into bands.
    let species = vec![
        SpeciesDef::new("grass").with_noise_window(0.25, 0.5),
        SpeciesDef::new("clover")
            .with_noise_window(0.5, 0.65)
            .with_cluster(ClusterSettings::new(2, 5, 1.2)),
        SpeciesDef::new("flower")
            .with_noise_window(0.65, 1.0)
            .with_scale_range(0.6, 1.4),
    ];

    let mut scatter = FloraScatter::try_new(settings.clone(), species)?;
    let mut host = MemoryHost::new();
    let report = scatter.generate_all(&mut host, &mut ());
    println!(
        "placed {} ({} clustered) of {} candidates",
        report.placed(),
        report.clustered,
        report.candidates
    );

    let mut config = RenderConfig::new((800, 800), settings.area);
    config
        .set_species_style(
            "grass",
            SpeciesStyle {
                color: [90, 170, 60],
                radius: 2,
            },
        )
        .set_species_style(
            "clover",
            SpeciesStyle {
                color: [30, 110, 40],
                radius: 3,
            },
        )
        .set_species_style(
            "flower",
            SpeciesStyle {
                color: [230, 80, 140],
                radius: 3,
            },
        );
    render_plants_to_png(&host, &config, "meadow-noise-windows.png")
}
