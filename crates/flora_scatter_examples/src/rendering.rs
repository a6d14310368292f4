use std::collections::HashMap;
use std::path::Path;

use flora_scatter::prelude::*;
use glam::Vec2;
use image::{Rgb, RgbImage};
use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber honouring `RUST_LOG` (default `info`).
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// How one species is drawn.
#[derive(Debug, Clone, Copy)]
pub struct SpeciesStyle {
    pub color: [u8; 3],
    /// Radius in pixels at plant scale 1.0.
    pub radius: i32,
}

impl Default for SpeciesStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 255],
            radius: 3,
        }
    }
}

type BackgroundFn = dyn Fn(Vec2) -> [u8; 3];

/// Top-down rendering setup mapping a [`GenerationArea`] onto an image.
pub struct RenderConfig {
    pub image_size: (u32, u32),
    pub area: GenerationArea,
    pub background: [u8; 3],
    styles: HashMap<String, SpeciesStyle>,
    shade: Option<Box<BackgroundFn>>,
}

impl RenderConfig {
    pub fn new(image_size: (u32, u32), area: GenerationArea) -> Self {
        Self {
            image_size,
            area,
            background: [235, 235, 220],
            styles: HashMap::new(),
            shade: None,
        }
    }

    pub fn with_background(mut self, background: [u8; 3]) -> Self {
        self.background = background;
        self
    }

    /// Per-pixel background colour from the world position (e.g. a height map).
    pub fn with_shading(mut self, shade: impl Fn(Vec2) -> [u8; 3] + 'static) -> Self {
        self.shade = Some(Box::new(shade));
        self
    }

    pub fn set_species_style(&mut self, species_id: impl Into<String>, style: SpeciesStyle) -> &mut Self {
        self.styles.insert(species_id.into(), style);
        self
    }

    fn pixel_to_world(&self, x: u32, y: u32) -> Vec2 {
        let (w, h) = self.image_size;
        let uv = Vec2::new((x as f32 + 0.5) / w as f32, (y as f32 + 0.5) / h as f32);
        self.area.center + (uv - Vec2::splat(0.5)) * self.area.size
    }

    fn world_to_pixel(&self, p: Vec2) -> (i32, i32) {
        let (w, h) = self.image_size;
        let uv = (p - self.area.center) / self.area.size + Vec2::splat(0.5);
        ((uv.x * w as f32) as i32, (uv.y * h as f32) as i32)
    }
}

/// Draws every plant of `host` as a filled circle and writes a PNG.
pub fn render_plants_to_png(
    host: &MemoryHost,
    config: &RenderConfig,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let (w, h) = config.image_size;
    let mut img = RgbImage::from_pixel(w, h, Rgb(config.background));

    if let Some(shade) = &config.shade {
        for (x, y, px) in img.enumerate_pixels_mut() {
            *px = Rgb(shade(config.pixel_to_world(x, y)));
        }
    }

    let mut plants: Vec<_> = host.iter().map(|(_, p)| p).collect();
    // Larger plants last so they stay visible.
    plants.sort_by(|a, b| a.scale.total_cmp(&b.scale));

    for plant in plants {
        let style = config
            .styles
            .get(&plant.species_id)
            .copied()
            .unwrap_or_default();
        let (cx, cy) = config.world_to_pixel(Vec2::new(plant.position.x, plant.position.z));
        let radius = ((style.radius as f32) * plant.scale).round().max(1.0) as i32;
        draw_disk(&mut img, cx, cy, radius, Rgb(style.color));
    }

    img.save(path.as_ref())?;
    tracing::info!("Wrote {}", path.as_ref().display());
    Ok(())
}

fn draw_disk(img: &mut RgbImage, cx: i32, cy: i32, radius: i32, color: Rgb<u8>) {
    let (w, h) = (img.width() as i32, img.height() as i32);
    let r2 = radius * radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && x < w && y < h {
                img.put_pixel(x as u32, y as u32, color);
            }
        }
    }
}
