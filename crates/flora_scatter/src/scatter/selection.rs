//! Selection of a [`SpeciesDef`] for an evaluated candidate.
//!
//! [`evaluate_species`] filters the pool by height, slope, noise window and
//! regeneration eligibility and weights the survivors;
//! [`pick_weighted_random`] draws proportionally to those weights.
use rand::RngCore;

use crate::scatter::context::PlacementPass;
use crate::scatter::species::SpeciesDef;

/// Lower bound of the noise falloff so window edges stay selectable.
pub const MIN_FALLOFF: f32 = 1e-3;

/// Result of evaluating one species at a candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesEvaluation {
    /// Index into the species pool.
    pub index: usize,
    /// Whether all constraints passed.
    pub allowed: bool,
    /// Selection weight, 0 when not allowed.
    pub weight: f32,
}

/// Triangular falloff of `noise` inside `window`: 1 at the midpoint, linearly
/// decreasing to the edges, floored at [`MIN_FALLOFF`].
pub fn triangular_falloff(noise: f32, window: (f32, f32)) -> f32 {
    let half = (window.1 - window.0) * 0.5;
    if half <= 0.0 {
        return 1.0;
    }
    let mid = window.0 + half;
    (1.0 - (noise - mid).abs() / half).max(MIN_FALLOFF)
}

pub fn evaluate_species(
    pool: &[SpeciesDef],
    noise: f32,
    height: f32,
    slope_degrees: f32,
    pass: PlacementPass,
) -> Vec<SpeciesEvaluation> {
    pool.iter()
        .enumerate()
        .map(|(index, s)| {
            let allowed = s.accepts_height(height)
                && s.accepts_slope(slope_degrees)
                && s.accepts_noise(noise)
                && (!pass.is_regeneration() || s.allow_regeneration);
            let weight = if allowed {
                let multiplier = if pass.is_regeneration() {
                    s.regeneration_multiplier
                } else {
                    1.0
                };
                s.spawn_probability * multiplier * triangular_falloff(noise, s.noise_window)
            } else {
                0.0
            };
            SpeciesEvaluation {
                index,
                allowed,
                weight,
            }
        })
        .collect()
}

pub fn pick_weighted_random<R: RngCore + ?Sized>(
    results: &[SpeciesEvaluation],
    rng: &mut R,
) -> Option<usize> {
    let placeable: Vec<_> = results
        .iter()
        .filter(|r| r.allowed && r.weight > 0.0)
        .collect();
    if placeable.is_empty() {
        return None;
    }

    let total_weight: f32 = placeable.iter().map(|r| r.weight).sum();
    if total_weight <= 0.0 {
        return None;
    }

    let roll_source = (rng.next_u32() as f32) / ((u32::MAX as f32) + 1.0);
    let mut roll = roll_source * total_weight;
    for r in &placeable {
        roll -= r.weight;
        if roll <= 0.0 {
            return Some(r.index);
        }
    }

    placeable.last().map(|r| r.index)
}

/// Filters, weights and draws a species; `None` when nothing survives.
pub fn select_species<R: RngCore + ?Sized>(
    pool: &[SpeciesDef],
    noise: f32,
    height: f32,
    slope_degrees: f32,
    pass: PlacementPass,
    rng: &mut R,
) -> Option<usize> {
    let results = evaluate_species(pool, noise, height, slope_degrees, pass);
    pick_weighted_random(&results, rng)
}
