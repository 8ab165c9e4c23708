use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::model::narrative_event::EventKind;
use crate::model::queued_event::{QueuedEvent, SourceCycle};
use crate::model::time::{hours_to_ticks, SimTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Stored; `displaced` background entries were removed to make way.
    Queued { displaced: usize },
    /// Background event dropped because a narrative event of the same type
    /// is already queued inside the conflict window.
    Dropped,
}

/// Queue state sent to the decision provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct QueueContext {
    pub pending_count: usize,
    pub queued_types: Vec<EventKind>,
    pub summary: String,
}

/// Time-ordered store of events waiting to fire.
///
/// Entries stay sorted by `fire_at`; equal times keep insertion order.
#[derive(Debug)]
pub struct EventQueue {
    entries: Mutex<Vec<QueuedEvent>>,
    conflict_window: u64,
}

impl EventQueue {
    pub fn new(conflict_window_hours: f32) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            conflict_window: hours_to_ticks(conflict_window_hours),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueuedEvent>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn conflicts(&self, a: &QueuedEvent, b: &QueuedEvent) -> bool {
        a.kind == b.kind && a.fire_at.distance(b.fire_at) < self.conflict_window
    }

    /// Schedule `event` to fire `delay_hours` after `now`.
    pub fn enqueue(&self, mut event: QueuedEvent, now: SimTime, delay_hours: f32) -> EnqueueOutcome {
        event.fire_at = now.after_hours(delay_hours);
        self.enqueue_at(event)
    }

    /// Insert with `fire_at` already set.
    pub fn enqueue_at(&self, event: QueuedEvent) -> EnqueueOutcome {
        let mut entries = self.lock();

        let mut displaced = 0;
        if event.is_narrative() {
            let before = entries.len();
            entries.retain(|q| q.is_narrative() || !self.conflicts(q, &event));
            displaced = before - entries.len();
            if displaced > 0 {
                tracing::debug!(
                    kind = %event.kind,
                    displaced,
                    "narrative event displaced conflicting background events"
                );
            }
        } else if entries
            .iter()
            .any(|q| q.is_narrative() && self.conflicts(q, &event))
        {
            tracing::info!(
                kind = %event.kind,
                source = event.source.label(),
                "dedup: conflicts with queued narrative event"
            );
            return EnqueueOutcome::Dropped;
        }

        tracing::debug!(
            kind = %event.kind,
            source = event.source.label(),
            fire_at = event.fire_at.ticks(),
            arc = event.arc_name.as_deref().unwrap_or(""),
            "queued event"
        );

        let at = entries.partition_point(|q| q.fire_at <= event.fire_at);
        entries.insert(at, event);
        EnqueueOutcome::Queued { displaced }
    }

    /// Remove and return every entry due at `now`, earliest first.
    pub fn pop_ready(&self, now: SimTime) -> Vec<QueuedEvent> {
        let mut entries = self.lock();
        let due = entries.partition_point(|q| q.fire_at <= now);
        entries.drain(..due).collect()
    }

    pub fn peek_all(&self) -> Vec<QueuedEvent> {
        self.lock().clone()
    }

    pub fn clear_by_source(&self, source: SourceCycle) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|q| q.source != source);
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Distinct queued kinds in firing order.
    pub fn queued_kinds(&self) -> Vec<EventKind> {
        let entries = self.lock();
        let mut kinds: Vec<EventKind> = Vec::new();
        for entry in entries.iter() {
            if !kinds.contains(&entry.kind) {
                kinds.push(entry.kind.clone());
            }
        }
        kinds
    }

    pub fn summary(&self) -> String {
        let entries = self.lock();
        if entries.is_empty() {
            return "empty".to_string();
        }
        entries
            .iter()
            .map(|q| format!("{}@tick{}({})", q.kind, q.fire_at.ticks(), q.source.label()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn context(&self) -> QueueContext {
        QueueContext {
            pending_count: self.len(),
            queued_types: self.queued_kinds(),
            summary: self.summary(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: EventKind, source: SourceCycle) -> QueuedEvent {
        QueuedEvent::new(kind, source)
    }

    fn fire_times(events: &[QueuedEvent]) -> Vec<u64> {
        events.iter().map(|e| e.fire_at.ticks()).collect()
    }

    #[test]
    fn pop_ready_returns_due_entries_in_time_order() {
        let queue = EventQueue::new(4.0);
        let now = SimTime::from_days(1.0);
        for (kind, delay) in [
            (EventKind::ColdSnap, 10.0),
            (EventKind::RaidEnemy, 2.0),
            (EventKind::ShipChunkDrop, 30.0),
            (EventKind::HeatWave, 6.0),
        ] {
            queue.enqueue(event(kind, SourceCycle::Scattered), now, delay);
        }

        let ready = queue.pop_ready(now.after_hours(10.0));
        let kinds: Vec<_> = ready.iter().map(|e| e.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![EventKind::RaidEnemy, EventKind::HeatWave, EventKind::ColdSnap]
        );
        let times = fire_times(&ready);
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(queue.len(), 1);
        assert!(queue.pop_ready(now.after_hours(29.0)).is_empty());
    }

    #[test]
    fn equal_fire_times_keep_insertion_order() {
        let queue = EventQueue::new(4.0);
        let now = SimTime::ZERO;
        queue.enqueue(event(EventKind::ColdSnap, SourceCycle::Scattered), now, 5.0);
        queue.enqueue(event(EventKind::Flashstorm, SourceCycle::Scattered), now, 5.0);
        queue.enqueue(event(EventKind::HeatWave, SourceCycle::Scattered), now, 5.0);

        let kinds: Vec<_> = queue
            .pop_ready(now.after_hours(5.0))
            .into_iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![EventKind::ColdSnap, EventKind::Flashstorm, EventKind::HeatWave]
        );
    }

    #[test]
    fn narrative_event_displaces_conflicting_background_event() {
        let queue = EventQueue::new(4.0);
        let now = SimTime::ZERO;
        queue.enqueue(event(EventKind::RaidEnemy, SourceCycle::Scattered), now, 10.0);
        queue.enqueue(event(EventKind::RaidEnemy, SourceCycle::Scattered), now, 20.0);

        let outcome = queue.enqueue(event(EventKind::RaidEnemy, SourceCycle::Narrative), now, 12.0);

        assert_eq!(outcome, EnqueueOutcome::Queued { displaced: 1 });
        let remaining = queue.peek_all();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].source, SourceCycle::Narrative);
        assert_eq!(remaining[1].fire_at, now.after_hours(20.0));
    }

    #[test]
    fn background_event_near_narrative_event_is_dropped() {
        let queue = EventQueue::new(4.0);
        let now = SimTime::ZERO;
        queue.enqueue(event(EventKind::Infestation, SourceCycle::Narrative), now, 8.0);

        let outcome = queue.enqueue(event(EventKind::Infestation, SourceCycle::Scattered), now, 10.0);
        assert_eq!(outcome, EnqueueOutcome::Dropped);
        assert_eq!(queue.len(), 1);

        // Different type, or outside the window, is not a conflict.
        queue.enqueue(event(EventKind::ColdSnap, SourceCycle::Scattered), now, 9.0);
        queue.enqueue(event(EventKind::Infestation, SourceCycle::Scattered), now, 12.0);
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn events_exactly_one_window_apart_do_not_conflict() {
        let queue = EventQueue::new(4.0);
        let now = SimTime::ZERO;
        queue.enqueue(event(EventKind::RaidEnemy, SourceCycle::Narrative), now, 8.0);

        let outcome = queue.enqueue(event(EventKind::RaidEnemy, SourceCycle::Scattered), now, 12.0);
        assert_eq!(outcome, EnqueueOutcome::Queued { displaced: 0 });

        let outcome = queue.enqueue(event(EventKind::RaidEnemy, SourceCycle::Narrative), now, 16.0);
        assert_eq!(outcome, EnqueueOutcome::Queued { displaced: 0 });
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn narrative_events_never_displace_each_other() {
        let queue = EventQueue::new(4.0);
        let now = SimTime::ZERO;
        queue.enqueue(event(EventKind::RaidEnemy, SourceCycle::Narrative), now, 1.0);
        queue.enqueue(event(EventKind::RaidEnemy, SourceCycle::Narrative), now, 2.0);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn fire_time_is_relative_to_insertion_time() {
        let queue = EventQueue::new(4.0);
        let inserted = SimTime::from_days(7.0);
        queue.enqueue(event(EventKind::ColdSnap, SourceCycle::Scattered), inserted, 3.0);
        assert_eq!(queue.peek_all()[0].fire_at, inserted.after_hours(3.0));
    }

    #[test]
    fn clear_by_source_leaves_other_sources() {
        let queue = EventQueue::new(4.0);
        let now = SimTime::ZERO;
        queue.enqueue(event(EventKind::ColdSnap, SourceCycle::Scattered), now, 1.0);
        queue.enqueue(event(EventKind::RaidEnemy, SourceCycle::Narrative), now, 2.0);
        queue.enqueue(event(EventKind::MechCluster, SourceCycle::Narrative), now, 3.0);

        assert_eq!(queue.clear_by_source(SourceCycle::Narrative), 2);
        assert_eq!(queue.queued_kinds(), vec![EventKind::ColdSnap]);
    }

    #[test]
    fn context_describes_pending_entries() {
        let queue = EventQueue::new(4.0);
        assert_eq!(queue.context().summary, "empty");

        queue.enqueue(event(EventKind::ColdSnap, SourceCycle::Scattered), SimTime::ZERO, 1.0);
        let ctx = queue.context();
        assert_eq!(ctx.pending_count, 1);
        assert_eq!(ctx.summary, "ColdSnap@tick2500(scattered)");
    }
}
