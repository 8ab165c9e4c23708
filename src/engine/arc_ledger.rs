use std::collections::VecDeque;

use crate::model::arc::{ArcEpisode, ArcEventOutcome, ArcLogEntry, ArcOutcome};
use crate::model::game_state::WorldMetrics;
use crate::model::narrative_event::EventKind;
use crate::model::time::SimTime;

/// Tracks the active arc and a capped log of finished ones.
///
/// Idle while `active` is `None`. World metrics are only sampled when an arc
/// is finalized, so callers pass them lazily.
#[derive(Debug, Clone)]
pub struct ArcLedger {
    log: VecDeque<ArcLogEntry>,
    active: Option<ArcEpisode>,
    cap: usize,
    last_completed: Option<SimTime>,
}

impl ArcLedger {
    pub fn new(cap: usize) -> Self {
        Self {
            log: VecDeque::new(),
            active: None,
            cap: cap.max(1),
            last_completed: None,
        }
    }

    /// Rebuild from persisted parts; an oversized log is trimmed oldest-first.
    pub fn restore(
        cap: usize,
        log: Vec<ArcLogEntry>,
        active: Option<ArcEpisode>,
        last_completed: Option<SimTime>,
    ) -> Self {
        let mut ledger = Self {
            log: log.into(),
            active,
            cap: cap.max(1),
            last_completed,
        };
        ledger.evict();
        ledger
    }

    /// Begin a new arc, interrupting any arc still running.
    ///
    /// Returns the log entry of the interrupted arc, if there was one.
    pub fn start_arc(
        &mut self,
        name: impl Into<String>,
        planned_event_count: usize,
        now: SimTime,
        metrics: impl FnOnce() -> WorldMetrics,
    ) -> Option<ArcLogEntry> {
        let interrupted = self.finalize_arc(ArcOutcome::Interrupted, now, metrics);

        let episode = ArcEpisode::new(name, planned_event_count, now);
        tracing::info!(
            arc = %episode.name,
            planned = planned_event_count,
            "started arc"
        );
        self.active = Some(episode);
        interrupted
    }

    /// Append an event result to the active arc. Completes the arc once the
    /// planned count is reached and returns its log entry.
    pub fn record_event(
        &mut self,
        kind: &EventKind,
        outcome: ArcEventOutcome,
        now: SimTime,
        metrics: impl FnOnce() -> WorldMetrics,
    ) -> Option<ArcLogEntry> {
        let episode = self.active.as_mut()?;
        episode.fired_events.push(kind.clone());
        episode.outcomes.push(outcome);

        if episode.is_complete() {
            return self.finalize_arc(ArcOutcome::Completed, now, metrics);
        }
        None
    }

    /// Close the active arc into the log. No-op while idle.
    pub fn finalize_arc(
        &mut self,
        outcome: ArcOutcome,
        now: SimTime,
        metrics: impl FnOnce() -> WorldMetrics,
    ) -> Option<ArcLogEntry> {
        let episode = self.active.take()?;

        let entry = ArcLogEntry {
            name: episode.name,
            events: episode.fired_events,
            event_outcomes: episode.outcomes,
            outcome,
            start_time: episode.start_time,
            end_time: now,
            metrics: metrics(),
        };

        tracing::info!(
            arc = %entry.name,
            outcome = ?outcome,
            events = %entry.pattern(),
            logged = self.log.len() + 1,
            "arc finalized"
        );

        self.log.push_back(entry.clone());
        self.evict();
        self.last_completed = Some(now);
        Some(entry)
    }

    fn evict(&mut self) {
        while self.log.len() > self.cap {
            self.log.pop_front();
        }
    }

    pub fn active(&self) -> Option<&ArcEpisode> {
        self.active.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn remaining_events(&self) -> usize {
        self.active.as_ref().map_or(0, ArcEpisode::remaining)
    }

    /// Oldest first.
    pub fn log(&self) -> &VecDeque<ArcLogEntry> {
        &self.log
    }

    pub fn log_entries(&self) -> Vec<ArcLogEntry> {
        self.log.iter().cloned().collect()
    }

    pub fn last_completed(&self) -> Option<SimTime> {
        self.last_completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> WorldMetrics {
        WorldMetrics {
            population: 6,
            wealth: 42_000.0,
            phase: "establishing".into(),
            narrative_state: "stable".into(),
        }
    }

    #[test]
    fn arc_completes_when_planned_count_reached() {
        let mut ledger = ArcLedger::new(10);
        ledger.start_arc("Siege", 2, SimTime::ZERO, metrics);

        assert!(ledger
            .record_event(&EventKind::ColdSnap, ArcEventOutcome::Fired, SimTime(10), metrics)
            .is_none());
        let done = ledger
            .record_event(&EventKind::RaidEnemy, ArcEventOutcome::Fallback, SimTime(20), metrics)
            .unwrap();

        assert_eq!(done.outcome, ArcOutcome::Completed);
        assert_eq!(done.events, vec![EventKind::ColdSnap, EventKind::RaidEnemy]);
        assert_eq!(
            done.event_outcomes,
            vec![ArcEventOutcome::Fired, ArcEventOutcome::Fallback]
        );
        assert_eq!(done.end_time, SimTime(20));
        assert_eq!(done.metrics.population, 6);
        assert!(!ledger.is_active());
        assert_eq!(ledger.last_completed(), Some(SimTime(20)));
    }

    #[test]
    fn finalizing_twice_logs_once() {
        let mut ledger = ArcLedger::new(10);
        ledger.start_arc("Drought", 5, SimTime::ZERO, metrics);

        assert!(ledger
            .finalize_arc(ArcOutcome::Completed, SimTime(5), metrics)
            .is_some());
        assert!(ledger
            .finalize_arc(ArcOutcome::Completed, SimTime(6), metrics)
            .is_none());
        assert_eq!(ledger.log().len(), 1);
        assert!(!ledger.is_active());
    }

    #[test]
    fn starting_over_an_active_arc_interrupts_it() {
        let mut ledger = ArcLedger::new(10);
        ledger.start_arc("A", 5, SimTime::ZERO, metrics);
        ledger.record_event(&EventKind::ColdSnap, ArcEventOutcome::Fired, SimTime(1), metrics);
        ledger.record_event(&EventKind::HeatWave, ArcEventOutcome::Failed, SimTime(2), metrics);

        let interrupted = ledger.start_arc("B", 3, SimTime(3), metrics).unwrap();

        assert_eq!(interrupted.name, "A");
        assert_eq!(interrupted.outcome, ArcOutcome::Interrupted);
        assert_eq!(interrupted.events.len(), 2);
        assert_eq!(ledger.log().len(), 1);
        assert_eq!(ledger.active().unwrap().name, "B");
        assert_eq!(ledger.remaining_events(), 3);
    }

    #[test]
    fn recording_while_idle_is_ignored() {
        let mut ledger = ArcLedger::new(10);
        assert!(ledger
            .record_event(&EventKind::ColdSnap, ArcEventOutcome::Fired, SimTime(1), metrics)
            .is_none());
        assert!(ledger.log().is_empty());
    }

    #[test]
    fn log_evicts_oldest_entries_past_cap() {
        let mut ledger = ArcLedger::new(3);
        for i in 0..5u64 {
            ledger.start_arc(format!("arc-{i}"), 1, SimTime(i), metrics);
            ledger.record_event(&EventKind::ColdSnap, ArcEventOutcome::Fired, SimTime(i), metrics);
        }

        let names: Vec<_> = ledger.log().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["arc-2", "arc-3", "arc-4"]);
    }

    #[test]
    fn restore_trims_oversized_log() {
        let mut source = ArcLedger::new(10);
        for i in 0..4u64 {
            source.start_arc(format!("arc-{i}"), 1, SimTime(i), metrics);
            source.record_event(&EventKind::ColdSnap, ArcEventOutcome::Fired, SimTime(i), metrics);
        }

        let restored = ArcLedger::restore(2, source.log_entries(), None, source.last_completed());
        assert_eq!(restored.log().len(), 2);
        assert_eq!(restored.log()[0].name, "arc-2");
    }
}
