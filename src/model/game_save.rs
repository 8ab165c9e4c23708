use serde::{Deserialize, Serialize};

use crate::engine::history::HistoryEntry;
use crate::engine::pacing::PacingBounds;
use crate::model::arc::{ArcEpisode, ArcLogEntry};
use crate::model::proposal::Posture;
use crate::model::queued_event::QueuedEvent;
use crate::model::time::SimTime;

pub const SAVE_VERSION: u32 = 1;

/// Engine state that survives a restart. Every field defaults, so partial
/// or older saves still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSave {
    pub version: u32,
    pub arc_log: Vec<ArcLogEntry>,
    pub active_arc: Option<ArcEpisode>,
    /// Pending queue entries, so a restored arc can still complete.
    pub queued_events: Vec<QueuedEvent>,
    pub last_arc_completed: Option<SimTime>,
    pub pacing: PacingBounds,
    pub posture: Option<Posture>,
    pub event_history: Vec<HistoryEntry>,
    pub last_threat: Option<SimTime>,
    pub last_cooldown_event: Option<SimTime>,
}

impl Default for EngineSave {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            arc_log: Vec::new(),
            active_arc: None,
            queued_events: Vec::new(),
            last_arc_completed: None,
            pacing: PacingBounds::default(),
            posture: None,
            event_history: Vec::new(),
            last_threat: None,
            last_cooldown_event: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_save_loads_with_defaults() {
        let save: EngineSave = serde_json::from_str(
            r#"{"active_arc": {"name": "Siege", "planned_event_count": 3, "start_time": 60000}}"#,
        )
        .unwrap();

        assert_eq!(save.version, SAVE_VERSION);
        assert!(save.arc_log.is_empty());
        let arc = save.active_arc.unwrap();
        assert_eq!(arc.remaining(), 3);
        assert_eq!(arc.start_time, SimTime::from_days(1.0));
        assert_eq!(save.pacing, PacingBounds::default());
    }
}
