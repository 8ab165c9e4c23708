use rand::Rng;
use serde::Serialize;
use serde_json::Value;

use crate::engine::event_queue::QueueContext;
use crate::engine::history::{EventDensity, RecentEvent};
use crate::engine::pacing::PacingBounds;
use crate::engine::summarizer::ArcHistorySummary;
use crate::model::game_state::DifficultyPolicy;
use crate::model::narrative_event::EventKind;
use crate::model::proposal::{Posture, Proposal};
use crate::model::time::SimTime;

/// Source of scheduling decisions. Implementations own their timeouts.
pub trait DecisionProvider: Send + Sync {
    fn propose(&self, request: &DecisionRequest) -> anyhow::Result<Proposal>;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClockInfo {
    pub tick: u64,
    pub day: u64,
    pub hour: f32,
}

impl From<SimTime> for ClockInfo {
    fn from(now: SimTime) -> Self {
        Self {
            tick: now.ticks(),
            day: now.days(),
            hour: now.hour_of_day(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveArcInfo {
    pub name: String,
    pub remaining_events: usize,
    pub fired_events: Vec<EventKind>,
}

/// Everything the provider sees for one decision.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionRequest {
    pub request_id: String,
    pub clock: ClockInfo,
    /// Opaque world snapshot from the observer.
    pub snapshot: Value,
    pub arc_history: ArcHistorySummary,
    pub current_queue: QueueContext,
    pub recent_events: Vec<RecentEvent>,
    pub do_not_repeat: Vec<EventKind>,
    pub density: EventDensity,
    pub pacing: PacingBounds,
    pub last_posture: Option<Posture>,
    pub active_arc: Option<ActiveArcInfo>,
    /// Whole days since the last arc completed; `None` before the first.
    pub days_since_last_arc: Option<u64>,
    pub difficulty: DifficultyPolicy,
}

/// Eight random lowercase hex characters.
pub fn new_request_id() -> String {
    format!("{:08x}", rand::thread_rng().gen::<u32>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_ids_are_eight_hex_chars() {
        let id = new_request_id();
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn clock_info_splits_day_and_hour() {
        let clock = ClockInfo::from(SimTime::from_days(2.0).after_hours(6.0));
        assert_eq!(clock.day, 2);
        assert_eq!(clock.hour, 6.0);
        assert_eq!(clock.tick, 135_000);
    }
}
