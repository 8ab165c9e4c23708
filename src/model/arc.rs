use serde::{Deserialize, Serialize};

use crate::model::game_state::WorldMetrics;
use crate::model::narrative_event::EventKind;
use crate::model::time::SimTime;

/// What happened to one planned arc event when its time came.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcEventOutcome {
    Fired,
    Fallback,
    Failed,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcOutcome {
    Completed,
    Interrupted,
}

/// The arc currently unfolding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcEpisode {
    pub name: String,
    pub planned_event_count: usize,
    #[serde(default)]
    pub fired_events: Vec<EventKind>,
    #[serde(default)]
    pub outcomes: Vec<ArcEventOutcome>,
    pub start_time: SimTime,
}

impl ArcEpisode {
    pub fn new(name: impl Into<String>, planned_event_count: usize, start_time: SimTime) -> Self {
        Self {
            name: name.into(),
            planned_event_count,
            fired_events: Vec::new(),
            outcomes: Vec::new(),
            start_time,
        }
    }

    pub fn remaining(&self) -> usize {
        self.planned_event_count.saturating_sub(self.fired_events.len())
    }

    pub fn is_complete(&self) -> bool {
        self.fired_events.len() >= self.planned_event_count
    }
}

/// Terminal record of a finished or interrupted arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcLogEntry {
    pub name: String,
    #[serde(default)]
    pub events: Vec<EventKind>,
    #[serde(default)]
    pub event_outcomes: Vec<ArcEventOutcome>,
    pub outcome: ArcOutcome,
    pub start_time: SimTime,
    pub end_time: SimTime,
    #[serde(default)]
    pub metrics: WorldMetrics,
}

impl ArcLogEntry {
    /// Event sequence rendered as `A → B → C`.
    pub fn pattern(&self) -> String {
        if self.events.is_empty() {
            return "empty".to_string();
        }
        self.events
            .iter()
            .map(EventKind::def_name)
            .collect::<Vec<_>>()
            .join(" → ")
    }

    pub fn opener(&self) -> Option<&EventKind> {
        self.events.first()
    }
}
