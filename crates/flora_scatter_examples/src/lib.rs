#![forbid(unsafe_code)]

mod rendering;

pub use rendering::{init_tracing, render_plants_to_png, RenderConfig, SpeciesStyle};
