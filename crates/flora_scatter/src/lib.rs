#![forbid(unsafe_code)]
//! flora_scatter: Procedural vegetation scattering and population upkeep.
//!
//! Modules:
//! - noise: seeded fractal noise used as the density field
//! - sampling: candidate generation (jitter grid, random grid, uniform, Poisson disk)
//! - surface: terrain probing interface and simple built-in surfaces
//! - scatter: settings, species, selection, placement, population tracking, regeneration
//!
//! The entry point for hosts is [`scatter::generator::FloraScatter`].
pub mod error;
pub mod noise;
pub mod sampling;
pub mod scatter;
pub mod surface;

/// Convenient re-exports for common types. Import with `use flora_scatter::prelude::*;`.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::noise::{NoiseField, NoiseSettings};
    pub use crate::sampling::{
        JitterGridSampling, PointStrategy, PoissonDiskSampling, PositionSampling,
        RandomGridSampling, UniformRandomSampling,
    };
    pub use crate::scatter::context::{GenerationContext, PlacementPass};
    pub use crate::scatter::events::{
        EventSink, FnSink, RejectReason, ScatterEvent, ScatterEventKind, VecSink,
    };
    pub use crate::scatter::generator::{DensityMultiplier, FloraScatter, GenerationReport};
    pub use crate::scatter::host::{HostHandle, MemoryHost, PlantHost, SpawnRequest};
    pub use crate::scatter::placement::{PlacementEngine, PlacementOutcome};
    pub use crate::scatter::population::{PlacedPlant, PlantHandle, PopulationTracker};
    pub use crate::scatter::regeneration::{RegenerationScheduler, Step};
    pub use crate::scatter::selection::{select_species, triangular_falloff};
    pub use crate::scatter::settings::{
        DensityCurve, DensitySettings, GenerationArea, GenerationSettings, RegenerationSettings,
        TerrainSettings,
    };
    pub use crate::scatter::species::{ClusterSettings, SpeciesDef, SpeciesId};
    pub use crate::surface::{
        FlatSurface, GroundMask, HeightFieldSurface, SurfaceHit, SurfaceProbe, SurfaceSampler,
    };
}
