use flora_scatter::prelude::*;
use flora_scatter_examples::{init_tracing, render_plants_to_png, RenderConfig, SpeciesStyle};
use glam::Vec2;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let strategies = [
        (
            "jitter-grid",
            PointStrategy::JitterGrid {
                spacing: 2.0,
                jitter: 0.5,
            },
        ),
        (
            "random-grid",
            PointStrategy::RandomGrid {
                points_per_100_units: 25.0,
            },
        ),
        ("uniform", PointStrategy::Uniform { density: 0.25 }),
        (
            "poisson-disk",
            PointStrategy::PoissonDisk {
                radius: 2.0,
                sample_attempts: 30,
            },
        ),
    ];

    for (name, strategy) in strategies {
        let settings = GenerationSettings::new(name)
            .with_seed(7)
            .with_area(Vec2::ZERO, Vec2::new(60.0, 60.0))
            .with_density(DensitySettings {
                base_density: 1.0,
                noise_influence: 0.0,
                ..Default::default()
            })
            .with_strategy(strategy);

        let mut scatter = FloraScatter::try_new(settings.clone(), vec![SpeciesDef::new("shrub")])?;
        let mut host = MemoryHost::new();
        let report = scatter.generate_all(&mut host, &mut ());
        println!("{name}: {} plants", report.placed());

        let mut config = RenderConfig::new((600, 600), settings.area);
        config.set_species_style(
            "shrub",
            SpeciesStyle {
                color: [40, 120, 50],
                radius: 4,
            },
        );
        render_plants_to_png(&host, &config, format!("strategies-{name}.png"))?;
    }
    Ok(())
}
