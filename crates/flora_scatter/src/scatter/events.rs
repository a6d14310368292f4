//! Event types and sinks for observing generation and regeneration.
//!
//! Generators emit [`ScatterEvent`]s into an [`EventSink`]. Sinks may opt out of
//! noisy kinds (per-candidate rejections) through [`EventSink::wants`].
use glam::Vec2;

use crate::scatter::context::PlacementPass;
use crate::scatter::generator::GenerationReport;
use crate::scatter::species::SpeciesId;

/// Why a candidate was not placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    OutsideArea,
    NoiseThreshold,
    Density,
    NoSurface,
    NoSpecies,
    TargetReached,
    Spacing,
    SpawnFailed,
}

/// Describes events emitted by scatter operations.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum ScatterEvent {
    /// Emitted when a full generation starts.
    GenerationStarted {
        seed: u64,
        candidate_count: usize,
    },

    /// Emitted when the initial pass has consumed all candidates.
    GenerationFinished { report: GenerationReport },

    /// Emitted for every spawned plant, primary or cluster member.
    PlantPlaced {
        species_id: SpeciesId,
        position: Vec2,
        pass: PlacementPass,
        /// Whether the plant was a secondary cluster member.
        clustered: bool,
    },

    /// Emitted for every rejected primary candidate.
    CandidateRejected {
        position: Vec2,
        pass: PlacementPass,
        reason: RejectReason,
    },

    /// Emitted when a regeneration cycle found species under target.
    RegenerationCycleStarted { deficits: Vec<(SpeciesId, usize)> },

    /// Emitted when a regeneration cycle completes or is stopped.
    RegenerationCycleFinished { placed: usize, attempts: usize },

    /// Non-fatal warning.
    Warning { context: String, message: String },
}

/// Discriminant of [`ScatterEvent`] used for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScatterEventKind {
    GenerationStarted,
    GenerationFinished,
    PlantPlaced,
    CandidateRejected,
    RegenerationCycleStarted,
    RegenerationCycleFinished,
    Warning,
}

impl ScatterEvent {
    pub fn kind(&self) -> ScatterEventKind {
        match self {
            ScatterEvent::GenerationStarted { .. } => ScatterEventKind::GenerationStarted,
            ScatterEvent::GenerationFinished { .. } => ScatterEventKind::GenerationFinished,
            ScatterEvent::PlantPlaced { .. } => ScatterEventKind::PlantPlaced,
            ScatterEvent::CandidateRejected { .. } => ScatterEventKind::CandidateRejected,
            ScatterEvent::RegenerationCycleStarted { .. } => {
                ScatterEventKind::RegenerationCycleStarted
            }
            ScatterEvent::RegenerationCycleFinished { .. } => {
                ScatterEventKind::RegenerationCycleFinished
            }
            ScatterEvent::Warning { .. } => ScatterEventKind::Warning,
        }
    }
}

/// A generic event sink that accepts [`ScatterEvent`]s.
pub trait EventSink {
    fn send(&mut self, event: ScatterEvent);

    /// Whether events of `kind` should be built at all.
    fn wants(&self, _kind: ScatterEventKind) -> bool {
        true
    }
}

/// A no-op event sink.
impl EventSink for () {
    #[inline]
    fn send(&mut self, _event: ScatterEvent) {}

    #[inline]
    fn wants(&self, _kind: ScatterEventKind) -> bool {
        false
    }
}

/// An event sink that forwards to a user-provided closure.
pub struct FnSink<F>
where
    F: FnMut(ScatterEvent),
{
    f: F,
}

impl<F> FnSink<F>
where
    F: FnMut(ScatterEvent),
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: FnMut(ScatterEvent),
{
    #[inline]
    fn send(&mut self, event: ScatterEvent) {
        (self.f)(event);
    }
}

/// An event sink that collects events in a `Vec`, optionally skipping rejections.
#[derive(Default)]
pub struct VecSink {
    events: Vec<ScatterEvent>,
    skip_rejections: bool,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects everything except [`ScatterEvent::CandidateRejected`].
    pub fn without_rejections() -> Self {
        Self {
            events: Vec::new(),
            skip_rejections: true,
        }
    }

    pub fn into_inner(self) -> Vec<ScatterEvent> {
        self.events
    }

    pub fn as_slice(&self) -> &[ScatterEvent] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventSink for VecSink {
    #[inline]
    fn send(&mut self, event: ScatterEvent) {
        self.events.push(event);
    }

    fn wants(&self, kind: ScatterEventKind) -> bool {
        !(self.skip_rejections && kind == ScatterEventKind::CandidateRejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warning() -> ScatterEvent {
        ScatterEvent::Warning {
            context: "ctx".into(),
            message: "msg".into(),
        }
    }

    #[test]
    fn vec_sink_collects_events() {
        let mut sink = VecSink::new();
        assert!(sink.is_empty());
        sink.send(warning());
        sink.send(warning());
        assert_eq!(sink.len(), 2);
        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn vec_sink_can_skip_rejections() {
        let sink = VecSink::without_rejections();
        assert!(!sink.wants(ScatterEventKind::CandidateRejected));
        assert!(sink.wants(ScatterEventKind::PlantPlaced));
    }

    #[test]
    fn unit_sink_wants_nothing() {
        assert!(!().wants(ScatterEventKind::Warning));
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        let mut sink = FnSink::new(|_event| {
            count += 1;
        });
        sink.send(warning());
        assert_eq!(count, 1);
    }

    #[test]
    fn kind_matches_variant() {
        assert_eq!(warning().kind(), ScatterEventKind::Warning);
        let ev = ScatterEvent::RegenerationCycleFinished {
            placed: 1,
            attempts: 3,
        };
        assert_eq!(ev.kind(), ScatterEventKind::RegenerationCycleFinished);
    }
}
