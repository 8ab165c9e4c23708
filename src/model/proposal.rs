use serde::{Deserialize, Serialize};

use crate::model::narrative_event::EventKind;

/// One decoded decision-provider response. Lives for a single drain.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Proposal {
    pub arc: Option<ArcDirective>,
    pub scattered_events: Vec<ProposedEvent>,
    pub pacing: PacingHints,
    pub posture: Option<Posture>,
    pub rationale: Option<String>,
}

impl Proposal {
    pub fn starts_arc(&self) -> bool {
        self.arc.as_ref().is_some_and(ArcDirective::starts_arc)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcDecision {
    Start,
    Continue,
    #[default]
    Skip,
}

impl ArcDecision {
    pub fn parse(raw: &str) -> ArcDecision {
        match raw.trim().to_ascii_lowercase().as_str() {
            "start" | "start_arc" | "new_arc" => ArcDecision::Start,
            "continue" | "continue_arc" => ArcDecision::Continue,
            _ => ArcDecision::Skip,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcDirective {
    pub decision: ArcDecision,
    pub name: String,
    pub events: Vec<ProposedEvent>,
    pub rationale: Option<String>,
}

impl ArcDirective {
    pub fn starts_arc(&self) -> bool {
        self.decision == ArcDecision::Start && !self.events.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedEvent {
    pub delay_hours: f32,
    pub kind: EventKind,
    pub subtype: Option<String>,
    pub faction: Option<String>,
    pub intensity: f32,
    pub note: Option<String>,
}

impl ProposedEvent {
    pub fn new(kind: EventKind, delay_hours: f32) -> Self {
        Self {
            delay_hours,
            kind,
            subtype: None,
            faction: None,
            intensity: 1.0,
            note: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PacingHints {
    pub next_call_days: Option<f32>,
    pub adjusted_bounds: Option<TimerAdjustment>,
}

/// Cadence bounds the provider asks for. A zero in either half of a pair
/// leaves that pair unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerAdjustment {
    pub minor_min_hours: f32,
    pub minor_max_hours: f32,
    pub major_min_days: f32,
    pub major_max_days: f32,
    pub narrative_min_days: f32,
    pub narrative_max_days: f32,
}

/// Human-readable pacing strategy, carried across calls for continuity.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Posture {
    pub label: String,
    pub rationale: Option<String>,
    pub next_trigger: Option<String>,
}
