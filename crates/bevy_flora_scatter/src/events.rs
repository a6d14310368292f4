use bevy::prelude::*;
use flora_scatter::prelude::{EventSink, ScatterEvent, ScatterEventKind};

/// Bevy message carrying the scatterer entity and the underlying [`ScatterEvent`].
#[derive(Message, Debug, Clone)]
pub struct FloraMessage {
    pub scatterer: Entity,
    pub event: ScatterEvent,
}

/// Which scatter events are forwarded as [`FloraMessage`]s.
#[derive(Resource, Debug, Clone)]
pub struct FloraMessageConfig {
    /// Forward per-candidate rejections (very chatty).
    pub include_rejections: bool,
    /// Forward one message per spawned plant.
    pub include_placements: bool,
}

impl Default for FloraMessageConfig {
    fn default() -> Self {
        Self {
            include_rejections: false,
            include_placements: true,
        }
    }
}

impl FloraMessageConfig {
    pub fn allows(&self, kind: ScatterEventKind) -> bool {
        match kind {
            ScatterEventKind::CandidateRejected => self.include_rejections,
            ScatterEventKind::PlantPlaced => self.include_placements,
            _ => true,
        }
    }
}

/// Event sink writing straight into the [`FloraMessage`] queue, tagged with the scatterer.
pub(crate) struct MessageSink<'a> {
    pub scatterer: Entity,
    pub config: &'a FloraMessageConfig,
    pub messages: &'a mut Messages<FloraMessage>,
}

impl EventSink for MessageSink<'_> {
    #[inline]
    fn send(&mut self, event: ScatterEvent) {
        self.messages.write(FloraMessage {
            scatterer: self.scatterer,
            event,
        });
    }

    #[inline]
    fn wants(&self, kind: ScatterEventKind) -> bool {
        self.config.allows(kind)
    }
}
