use serde::{Deserialize, Serialize};

use crate::model::narrative_event::EventKind;
use crate::model::time::SimTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceCycle {
    /// Standalone background event.
    Scattered,
    /// Part of the active narrative arc.
    Narrative,
}

impl SourceCycle {
    pub fn label(self) -> &'static str {
        match self {
            SourceCycle::Scattered => "scattered",
            SourceCycle::Narrative => "narrative",
        }
    }
}

/// Context handed to the world actuator alongside the event kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireParams {
    pub intensity: f32,
    pub faction: Option<String>,
    pub subtype: Option<String>,
}

impl FireParams {
    /// Parameters used for fallback candidates.
    pub fn neutral() -> Self {
        Self {
            intensity: 1.0,
            faction: None,
            subtype: None,
        }
    }

    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }
}

impl Default for FireParams {
    fn default() -> Self {
        Self::neutral()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedEvent {
    pub kind: EventKind,
    pub subtype: Option<String>,
    pub faction: Option<String>,
    pub intensity: f32,
    pub fire_at: SimTime,
    pub source: SourceCycle,
    pub arc_name: Option<String>,
    pub note: String,
}

impl QueuedEvent {
    pub fn new(kind: EventKind, source: SourceCycle) -> Self {
        Self {
            kind,
            subtype: None,
            faction: None,
            intensity: 1.0,
            fire_at: SimTime::ZERO,
            source,
            arc_name: None,
            note: String::new(),
        }
    }

    pub fn fire_params(&self) -> FireParams {
        FireParams {
            intensity: self.intensity,
            faction: self.faction.clone(),
            subtype: self.subtype.clone(),
        }
    }

    pub fn is_narrative(&self) -> bool {
        self.source == SourceCycle::Narrative
    }
}
