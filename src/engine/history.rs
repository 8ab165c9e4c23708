use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::narrative_event::EventKind;
use crate::model::queued_event::SourceCycle;
use crate::model::time::{SimTime, TICKS_PER_DAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOutcome {
    Fired,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: EventKind,
    pub source: SourceCycle,
    pub outcome: HistoryOutcome,
    pub at: SimTime,
}

/// History entry as shown to the decision provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentEvent {
    pub kind: EventKind,
    pub days_ago: u64,
    pub outcome: HistoryOutcome,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EventDensity {
    pub events_last_7_days: usize,
    pub events_last_15_days: usize,
    pub threats_last_7_days: usize,
    pub threats_last_15_days: usize,
    pub cooldown_events_last_30_days: usize,
    pub days_since_last_threat: Option<u64>,
    pub days_since_last_cooldown_event: Option<u64>,
}

/// Capped record of actuated events, newest first.
#[derive(Debug, Clone)]
pub struct EventHistory {
    entries: VecDeque<HistoryEntry>,
    cap: usize,
    last_threat: Option<SimTime>,
    last_cooldown_event: Option<SimTime>,
}

impl EventHistory {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap: cap.max(1),
            last_threat: None,
            last_cooldown_event: None,
        }
    }

    pub fn restore(
        cap: usize,
        entries: Vec<HistoryEntry>,
        last_threat: Option<SimTime>,
        last_cooldown_event: Option<SimTime>,
    ) -> Self {
        let mut history = Self {
            entries: entries.into(),
            cap: cap.max(1),
            last_threat,
            last_cooldown_event,
        };
        history.entries.truncate(history.cap);
        history
    }

    /// Record an event that actually fired.
    pub fn record(&mut self, kind: EventKind, source: SourceCycle, outcome: HistoryOutcome, at: SimTime) {
        if kind.is_threat() {
            self.last_threat = Some(at);
        }
        if kind.is_cooldown_class() {
            self.last_cooldown_event = Some(at);
        }
        self.entries.push_front(HistoryEntry {
            kind,
            source,
            outcome,
            at,
        });
        self.entries.truncate(self.cap);
    }

    /// True when no cooldown-class event fired within `days` before `now`.
    pub fn cooldown_open(&self, now: SimTime, days: u64) -> bool {
        match self.last_cooldown_event {
            None => true,
            Some(at) => now.ticks_since(at) >= days.saturating_mul(TICKS_PER_DAY),
        }
    }

    pub fn recent(&self, n: usize, now: SimTime) -> Vec<RecentEvent> {
        self.entries
            .iter()
            .take(n)
            .map(|e| RecentEvent {
                kind: e.kind.clone(),
                days_ago: now.whole_days_since(e.at),
                outcome: e.outcome,
            })
            .collect()
    }

    /// Distinct kinds among the last `n` events.
    pub fn do_not_repeat(&self, n: usize) -> Vec<EventKind> {
        let mut kinds: Vec<EventKind> = Vec::new();
        for entry in self.entries.iter().take(n) {
            if !kinds.contains(&entry.kind) {
                kinds.push(entry.kind.clone());
            }
        }
        kinds
    }

    pub fn density(&self, now: SimTime) -> EventDensity {
        let within = |e: &&HistoryEntry, days: u64| now.ticks_since(e.at) <= days * TICKS_PER_DAY;

        EventDensity {
            events_last_7_days: self.entries.iter().filter(|e| within(e, 7)).count(),
            events_last_15_days: self.entries.iter().filter(|e| within(e, 15)).count(),
            threats_last_7_days: self
                .entries
                .iter()
                .filter(|e| e.kind.is_threat() && within(e, 7))
                .count(),
            threats_last_15_days: self
                .entries
                .iter()
                .filter(|e| e.kind.is_threat() && within(e, 15))
                .count(),
            cooldown_events_last_30_days: self
                .entries
                .iter()
                .filter(|e| e.kind.is_cooldown_class() && within(e, 30))
                .count(),
            days_since_last_threat: self.last_threat.map(|t| now.whole_days_since(t)),
            days_since_last_cooldown_event: self.last_cooldown_event.map(|t| now.whole_days_since(t)),
        }
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last_threat(&self) -> Option<SimTime> {
        self.last_threat
    }

    pub fn last_cooldown_event(&self) -> Option<SimTime> {
        self.last_cooldown_event
    }
}
