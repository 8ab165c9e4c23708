use serde::{Deserialize, Serialize};

use crate::model::narrative_event::EventKind;
use crate::model::queued_event::SourceCycle;

/// An event that reached the world this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FiredEvent<H> {
    pub requested: EventKind,
    pub chosen: EventKind,
    pub source: SourceCycle,
    pub substituted: bool,
    pub handle: H,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Cooldown-class event requested before its cooldown elapsed.
    CooldownActive,
    /// A second cooldown-class event in the same arc.
    CooldownAlreadyInArc,
    /// Background event colliding with a queued narrative event.
    NarrativeConflict,
    /// The desired event and every fallback candidate were refused.
    FallbacksExhausted,
}

impl SkipReason {
    pub fn is_blocked(self) -> bool {
        matches!(
            self,
            SkipReason::CooldownActive | SkipReason::CooldownAlreadyInArc
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEvent {
    pub kind: EventKind,
    pub source: SourceCycle,
    pub reason: SkipReason,
}

/// Everything one scheduler tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport<H> {
    pub drained: bool,
    pub fired: Vec<FiredEvent<H>>,
    pub skipped: Vec<SkippedEvent>,
    pub call_started: bool,
}

impl<H> TickReport<H> {
    pub fn blocked_count(&self) -> usize {
        self.skipped.iter().filter(|s| s.reason.is_blocked()).count()
    }

    pub fn is_quiet(&self) -> bool {
        !self.drained && self.fired.is_empty() && self.skipped.is_empty() && !self.call_started
    }
}

impl<H> Default for TickReport<H> {
    fn default() -> Self {
        Self {
            drained: false,
            fired: Vec::new(),
            skipped: Vec::new(),
            call_started: false,
        }
    }
}
