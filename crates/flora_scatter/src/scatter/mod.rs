//! Vegetation placement: settings, species, selection, placement, population and regeneration.
pub mod context;
pub mod events;
pub mod generator;
pub mod host;
pub mod placement;
pub mod population;
pub mod regeneration;
pub mod selection;
pub mod settings;
pub mod species;
