use core::result::Result;

use bevy::asset::io::Reader;
use bevy::asset::{AssetLoader, LoadContext};
use bevy::prelude::*;
use bevy::reflect::TypePath;
use bevy::tasks::ConditionalSendFuture;
use flora_scatter::prelude::*;
use serde::{Deserialize, Serialize};

/// Asset bundling a [`GenerationSettings`] with its species pool.
#[derive(Asset, TypePath, Clone, Debug, Serialize, Deserialize)]
pub struct FloraSettingsAsset {
    #[serde(default)]
    pub settings: GenerationSettings,
    pub species: Vec<SpeciesDef>,
}

impl FloraSettingsAsset {
    pub fn new(settings: GenerationSettings, species: Vec<SpeciesDef>) -> Self {
        Self { settings, species }
    }

    /// Builds a generator; `seed` overrides the seed stored in the settings.
    pub fn build(&self, seed: Option<u64>) -> flora_scatter::error::Result<FloraScatter> {
        let mut settings = self.settings.clone();
        if let Some(seed) = seed {
            settings = settings.with_seed(seed);
        }
        FloraScatter::try_new(settings, self.species.clone())
    }
}

/// Asset loader for [`FloraSettingsAsset`] using RON files with `.flora` extension.
#[derive(TypePath)]
pub struct FloraSettingsAssetLoader;

impl AssetLoader for FloraSettingsAssetLoader {
    type Asset = FloraSettingsAsset;
    type Settings = ();
    type Error = anyhow::Error;

    fn extensions(&self) -> &[&str] {
        &["flora"]
    }

    fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _context: &mut LoadContext,
    ) -> impl ConditionalSendFuture<Output = Result<Self::Asset, Self::Error>> {
        Box::pin(async move {
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).await?;
            let asset: FloraSettingsAsset =
                ron::de::from_bytes(&bytes).map_err(|e| anyhow::anyhow!(e))?;
            asset.settings.validate()?;
            Ok(asset)
        })
    }
}

impl FromWorld for FloraSettingsAssetLoader {
    fn from_world(_: &mut World) -> Self {
        FloraSettingsAssetLoader
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEADOW: &str = r#"(
        settings: (
            id: "meadow",
            seed: Some(7),
            area: (center: (0.0, 0.0), size: (40.0, 30.0)),
            density: (base_density: 0.4, curve: SmoothStep),
            strategy: PoissonDisk(radius: 1.5, sample_attempts: 20),
            regeneration: (check_interval: 2.0, attempts_per_cycle: 20),
        ),
        species: [
            (id: "grass", noise_window: (0.0, 0.6)),
            (
                id: "fern",
                scale_range: (0.8, 1.2),
                cluster: Some((min_size: 2, max_size: 4, radius: 1.5)),
                target_count: 25,
            ),
        ],
    )"#;

    #[test]
    fn parses_ron_with_defaults() {
        let asset: FloraSettingsAsset = ron::de::from_str(MEADOW).unwrap();
        assert_eq!(asset.settings.id, "meadow");
        assert_eq!(asset.settings.seed, Some(7));
        assert_eq!(asset.settings.area.size, Vec2::new(40.0, 30.0));
        assert_eq!(asset.settings.density.curve, DensityCurve::SmoothStep);
        assert_eq!(asset.settings.max_plants_per_frame, 32);
        assert!(asset.settings.regeneration.enabled);

        assert_eq!(asset.species.len(), 2);
        assert_eq!(asset.species[0].max_slope, 90.0);
        assert_eq!(asset.species[1].target_count, 25);
        assert_eq!(asset.species[1].cluster_sizes(), 2..=4);
    }

    #[test]
    fn build_applies_seed_override() {
        let asset: FloraSettingsAsset = ron::de::from_str(MEADOW).unwrap();
        assert_eq!(asset.build(None).unwrap().settings().seed, Some(7));
        assert_eq!(asset.build(Some(99)).unwrap().settings().seed, Some(99));
    }

    #[test]
    fn build_rejects_empty_pool() {
        let asset = FloraSettingsAsset::new(GenerationSettings::default(), Vec::new());
        assert!(matches!(asset.build(None), Err(Error::MissingSpecies)));
    }
}
