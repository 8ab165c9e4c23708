use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::settings::EngineConfig;
use crate::engine::arc_ledger::ArcLedger;
use crate::engine::event_queue::{EnqueueOutcome, EventQueue};
use crate::engine::fallback::{FallbackCandidates, FallbackClass, FallbackResolver, ResolveError};
use crate::engine::history::{EventHistory, HistoryOutcome};
use crate::engine::mailbox::{CallExecutor, ProposalMailbox, ThreadExecutor};
use crate::engine::pacing::{next_call_days, PacingBounds};
use crate::engine::provider::{new_request_id, ActiveArcInfo, DecisionProvider, DecisionRequest};
use crate::engine::rate_limit::CallBudget;
use crate::engine::summarizer::summarize_with;
use crate::engine::world::{GatedActuator, WorldActuator, WorldObserver};
use crate::model::arc::ArcEventOutcome;
use crate::model::event_result::{FiredEvent, SkipReason, SkippedEvent, TickReport};
use crate::model::game_save::{EngineSave, SAVE_VERSION};
use crate::model::game_state::DifficultyPolicy;
use crate::model::narrative_event::EventKind;
use crate::model::proposal::{ArcDirective, Posture, Proposal, ProposedEvent};
use crate::model::queued_event::{QueuedEvent, SourceCycle};
use crate::model::time::{days_to_ticks, SimTime};

/// Pushes each delay forward so consecutive events are at least `gap_hours`
/// apart. Delays are treated in the given order.
pub fn normalize_arc_delays(requested: &[f32], gap_hours: f32) -> Vec<f32> {
    let mut out: Vec<f32> = Vec::with_capacity(requested.len());
    for &delay in requested {
        let delay = if delay.is_finite() { delay.max(0.0) } else { 0.0 };
        let effective = match out.last() {
            Some(&prev) => delay.max(prev + gap_hours),
            None => delay,
        };
        out.push(effective);
    }
    out
}

#[derive(Debug, Clone, Copy)]
struct CallTimers {
    initialized: bool,
    last_call: SimTime,
    interval_ticks: u64,
}

#[derive(Debug, Clone)]
struct DifficultyCache {
    policy: DifficultyPolicy,
    refreshed_at: Option<SimTime>,
}

/// Top-level control loop: drains proposals, fires due events and decides
/// when to ask the provider for the next plan.
///
/// `tick` must not run concurrently with itself; the provider call runs on
/// the executor and hands its result back through the mailbox.
pub struct DecisionScheduler<A: WorldActuator, O: WorldObserver> {
    config: EngineConfig,
    actuator: A,
    observer: O,
    provider: Arc<dyn DecisionProvider>,
    executor: Arc<dyn CallExecutor>,
    mailbox: Arc<ProposalMailbox>,
    budget: Arc<CallBudget>,
    queue: EventQueue,
    ledger: ArcLedger,
    history: EventHistory,
    pacing: PacingBounds,
    posture: Option<Posture>,
    resolver: FallbackResolver,
    candidates: FallbackCandidates,
    timers: CallTimers,
    difficulty: DifficultyCache,
}

impl<A: WorldActuator, O: WorldObserver> DecisionScheduler<A, O> {
    pub fn new(config: EngineConfig, actuator: A, observer: O, provider: Arc<dyn DecisionProvider>) -> Self {
        let budget = Arc::new(CallBudget::new(Duration::from_secs(
            config.calls.min_wall_interval_secs,
        )));

        Self {
            queue: EventQueue::new(config.queue.conflict_window_hours),
            ledger: ArcLedger::new(config.arcs.log_cap),
            history: EventHistory::new(config.history.cap),
            candidates: FallbackCandidates::from(&config.fallbacks),
            pacing: PacingBounds::default(),
            posture: None,
            resolver: FallbackResolver::from_entropy(),
            executor: Arc::new(ThreadExecutor),
            mailbox: ProposalMailbox::new(),
            budget,
            timers: CallTimers {
                initialized: false,
                last_call: SimTime::ZERO,
                interval_ticks: 0,
            },
            difficulty: DifficultyCache {
                policy: DifficultyPolicy::default(),
                refreshed_at: None,
            },
            config,
            actuator,
            observer,
            provider,
        }
    }

    pub fn with_executor(mut self, executor: Arc<dyn CallExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_resolver(mut self, resolver: FallbackResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Share one wall-clock budget between several schedulers.
    pub fn with_call_budget(mut self, budget: Arc<CallBudget>) -> Self {
        self.budget = budget;
        self
    }

    pub fn tick(&mut self, now: SimTime) -> TickReport<A::Handle> {
        self.tick_at(now, Instant::now())
    }

    /// `tick` with an explicit wall clock for the rate limiter.
    pub fn tick_at(&mut self, now: SimTime, wall: Instant) -> TickReport<A::Handle> {
        let mut report = TickReport::default();

        self.refresh_timers(now);
        self.refresh_difficulty(now);

        if let Some(proposal) = self.mailbox.take() {
            self.drain(proposal, now, &mut report);
            report.drained = true;
        }

        self.fire_ready(now, &mut report);
        report.call_started = self.maybe_start_call(now, wall);

        if !report.is_quiet() {
            tracing::debug!(
                now = %now,
                fired = report.fired.len(),
                skipped = report.skipped.len(),
                blocked = report.blocked_count(),
                call_started = report.call_started,
                queued = self.queue.len(),
                "tick"
            );
        }
        report
    }

    fn refresh_timers(&mut self, now: SimTime) {
        if self.timers.initialized && now >= self.timers.last_call {
            return;
        }
        if self.timers.initialized {
            tracing::info!(
                now = %now,
                last_call = %self.timers.last_call,
                "clock went backwards, resetting call timers"
            );
            self.mailbox.discard();
        }
        self.timers = CallTimers {
            initialized: true,
            last_call: now,
            interval_ticks: days_to_ticks(self.config.calls.first_call_delay_days),
        };
    }

    fn refresh_difficulty(&mut self, now: SimTime) {
        let stale = match self.difficulty.refreshed_at {
            None => true,
            Some(at) => now < at || now.ticks_since(at) >= self.config.difficulty_refresh_ticks,
        };
        if stale {
            self.difficulty = DifficultyCache {
                policy: self.observer.difficulty(),
                refreshed_at: Some(now),
            };
        }
    }

    fn cooldown_open(&self, now: SimTime) -> bool {
        self.history.cooldown_open(now, self.config.cooldown.days)
    }

    fn drain(&mut self, proposal: Proposal, now: SimTime, report: &mut TickReport<A::Handle>) {
        if let Some(adj) = &proposal.pacing.adjusted_bounds {
            self.pacing.apply_adjustment(adj, &self.config.pacing);
        }

        let days = next_call_days(&proposal, &self.config.calls);
        self.timers.interval_ticks = days_to_ticks(days);
        tracing::info!(days, "next decision call scheduled");

        if let Some(rationale) = &proposal.rationale {
            tracing::info!(rationale = %rationale, "proposal rationale");
        }

        let Proposal {
            arc,
            scattered_events,
            posture,
            ..
        } = proposal;

        if let Some(posture) = posture {
            tracing::info!(
                posture = %posture.label,
                next_trigger = posture.next_trigger.as_deref().unwrap_or(""),
                "posture updated"
            );
            self.posture = Some(posture);
        }

        match arc {
            Some(directive) if directive.starts_arc() => self.start_arc(directive, now, report),
            Some(directive) => tracing::debug!(
                decision = ?directive.decision,
                events = directive.events.len(),
                "arc left unchanged"
            ),
            None => {}
        }

        for event in scattered_events {
            self.schedule_scattered(event, now, report);
        }
    }

    /// Drop arc events the cooldown rules forbid. At most the configured
    /// number of cooldown-class events survive per arc.
    fn filter_arc_events(
        &self,
        events: Vec<ProposedEvent>,
        now: SimTime,
        report: &mut TickReport<A::Handle>,
    ) -> Vec<ProposedEvent> {
        let cooldown_open = self.cooldown_open(now);
        let mut cooldown_kept = 0;

        events
            .into_iter()
            .filter(|event| {
                if !event.kind.is_cooldown_class() {
                    return true;
                }
                let reason = if !cooldown_open {
                    SkipReason::CooldownActive
                } else if cooldown_kept >= self.config.arcs.max_cooldown_events_per_arc {
                    SkipReason::CooldownAlreadyInArc
                } else {
                    cooldown_kept += 1;
                    return true;
                };
                tracing::warn!(kind = %event.kind, reason = ?reason, "arc event blocked");
                report.skipped.push(SkippedEvent {
                    kind: event.kind.clone(),
                    source: SourceCycle::Narrative,
                    reason,
                });
                false
            })
            .collect()
    }

    fn start_arc(&mut self, directive: ArcDirective, now: SimTime, report: &mut TickReport<A::Handle>) {
        let ArcDirective {
            name,
            events,
            rationale,
            ..
        } = directive;

        let events = self.filter_arc_events(events, now, report);
        if events.is_empty() {
            tracing::warn!(arc = %name, "no arc events survived filtering, arc not started");
            return;
        }

        let requested: Vec<f32> = events.iter().map(|e| e.delay_hours).collect();
        let effective = normalize_arc_delays(&requested, self.config.arcs.min_spacing_hours);

        let cleared = self.queue.clear_by_source(SourceCycle::Narrative);
        let observer = &self.observer;
        if let Some(interrupted) = self
            .ledger
            .start_arc(name.clone(), events.len(), now, || observer.metrics())
        {
            tracing::info!(
                arc = %interrupted.name,
                cleared,
                "previous arc interrupted"
            );
        }
        if let Some(rationale) = &rationale {
            tracing::info!(arc = %name, rationale = %rationale, "arc rationale");
        }

        for ((event, requested), delay) in events.into_iter().zip(requested).zip(effective) {
            if delay > requested {
                tracing::info!(
                    kind = %event.kind,
                    requested_hours = requested,
                    effective_hours = delay,
                    "arc event pushed back for spacing"
                );
            }
            let mut queued = queued_from(event, SourceCycle::Narrative);
            queued.arc_name = Some(name.clone());
            self.queue.enqueue(queued, now, delay);
        }
    }

    fn schedule_scattered(&mut self, event: ProposedEvent, now: SimTime, report: &mut TickReport<A::Handle>) {
        if event.kind.is_cooldown_class() && !self.cooldown_open(now) {
            tracing::warn!(kind = %event.kind, "scattered event blocked by cooldown");
            report.skipped.push(SkippedEvent {
                kind: event.kind,
                source: SourceCycle::Scattered,
                reason: SkipReason::CooldownActive,
            });
            return;
        }

        let delay = event.delay_hours;
        let mut queued = queued_from(event, SourceCycle::Scattered);
        if delay.is_nan() || delay <= 0.0 {
            queued.fire_at = now;
            self.actuate(queued, now, report);
            return;
        }

        let kind = queued.kind.clone();
        if self.queue.enqueue(queued, now, delay) == EnqueueOutcome::Dropped {
            report.skipped.push(SkippedEvent {
                kind,
                source: SourceCycle::Scattered,
                reason: SkipReason::NarrativeConflict,
            });
        }
    }

    fn fire_ready(&mut self, now: SimTime, report: &mut TickReport<A::Handle>) {
        for event in self.queue.pop_ready(now) {
            self.actuate(event, now, report);
        }
    }

    fn actuate(&mut self, event: QueuedEvent, now: SimTime, report: &mut TickReport<A::Handle>) {
        let cooldown_open = self.cooldown_open(now);

        if event.kind.is_cooldown_class() && !cooldown_open {
            tracing::warn!(
                kind = %event.kind,
                source = event.source.label(),
                "cooldown-class event blocked at fire time"
            );
            report.skipped.push(SkippedEvent {
                kind: event.kind.clone(),
                source: event.source,
                reason: SkipReason::CooldownActive,
            });
            self.record_arc_outcome(&event, ArcEventOutcome::Blocked, now);
            return;
        }

        let gate = GatedActuator::new(&self.actuator, &self.difficulty.policy, cooldown_open);
        let candidates = self.candidates.for_class(FallbackClass::from(event.source));
        let resolved = self
            .resolver
            .resolve(&gate, &event.kind, &event.fire_params(), candidates);

        match resolved {
            Ok(resolution) => {
                let (history_outcome, arc_outcome) = if resolution.substituted {
                    (HistoryOutcome::Fallback, ArcEventOutcome::Fallback)
                } else {
                    (HistoryOutcome::Fired, ArcEventOutcome::Fired)
                };
                tracing::info!(
                    kind = %resolution.chosen,
                    requested = %event.kind,
                    source = event.source.label(),
                    arc = event.arc_name.as_deref().unwrap_or(""),
                    "event fired"
                );
                self.history
                    .record(resolution.chosen.clone(), event.source, history_outcome, now);
                self.record_arc_outcome(&event, arc_outcome, now);
                report.fired.push(FiredEvent {
                    requested: event.kind,
                    chosen: resolution.chosen,
                    source: event.source,
                    substituted: resolution.substituted,
                    handle: resolution.handle,
                });
            }
            Err(ResolveError::Exhausted { .. }) => {
                report.skipped.push(SkippedEvent {
                    kind: event.kind.clone(),
                    source: event.source,
                    reason: SkipReason::FallbacksExhausted,
                });
                self.record_arc_outcome(&event, ArcEventOutcome::Failed, now);
            }
        }
    }

    fn record_arc_outcome(&mut self, event: &QueuedEvent, outcome: ArcEventOutcome, now: SimTime) {
        if !event.is_narrative() {
            return;
        }
        let observer = &self.observer;
        self.ledger
            .record_event(&event.kind, outcome, now, || observer.metrics());
    }

    fn maybe_start_call(&mut self, now: SimTime, wall: Instant) -> bool {
        if self.mailbox.is_in_flight() {
            return false;
        }
        if now.ticks_since(self.timers.last_call) < self.timers.interval_ticks {
            return false;
        }
        let Some(ticket) = self.mailbox.try_begin() else {
            return false;
        };
        if !self.budget.try_acquire(wall) {
            return false;
        }

        let request = self.build_request(now);
        self.timers.last_call = now;

        tracing::info!(
            request_id = %request.request_id,
            now = %now,
            active_arc = request.active_arc.as_ref().map_or("", |a| a.name.as_str()),
            "starting decision call"
        );

        let provider = Arc::clone(&self.provider);
        self.executor.execute(Box::new(move || {
            match provider.propose(&request) {
                Ok(proposal) => ticket.deliver(proposal),
                Err(e) => tracing::warn!(
                    request_id = %request.request_id,
                    error = %format!("{e:#}"),
                    "decision call failed"
                ),
            }
        }));
        true
    }

    pub fn build_request(&self, now: SimTime) -> DecisionRequest {
        let history_policy = &self.config.history;

        DecisionRequest {
            request_id: new_request_id(),
            clock: now.into(),
            snapshot: self.observer.snapshot(),
            arc_history: summarize_with(self.ledger.log(), &EventKind::all_known(), &self.config.summary),
            current_queue: self.queue.context(),
            recent_events: self.history.recent(history_policy.recent_in_request, now),
            do_not_repeat: self.history.do_not_repeat(history_policy.do_not_repeat),
            density: self.history.density(now),
            pacing: self.pacing,
            last_posture: self.posture.clone(),
            active_arc: self.ledger.active().map(|arc| ActiveArcInfo {
                name: arc.name.clone(),
                remaining_events: arc.remaining(),
                fired_events: arc.fired_events.clone(),
            }),
            days_since_last_arc: self.ledger.last_completed().map(|at| now.whole_days_since(at)),
            difficulty: self.difficulty.policy.clone(),
        }
    }

    pub fn save(&self) -> EngineSave {
        EngineSave {
            version: SAVE_VERSION,
            arc_log: self.ledger.log_entries(),
            active_arc: self.ledger.active().cloned(),
            queued_events: self.queue.peek_all(),
            last_arc_completed: self.ledger.last_completed(),
            pacing: self.pacing,
            posture: self.posture.clone(),
            event_history: self.history.entries(),
            last_threat: self.history.last_threat(),
            last_cooldown_event: self.history.last_cooldown_event(),
        }
    }

    /// Replace persisted state. Call timers restart as for a fresh game.
    pub fn restore(&mut self, save: EngineSave) {
        if save.version != SAVE_VERSION {
            tracing::warn!(
                found = save.version,
                expected = SAVE_VERSION,
                "loading save from a different version"
            );
        }

        self.ledger = ArcLedger::restore(
            self.config.arcs.log_cap,
            save.arc_log,
            save.active_arc,
            save.last_arc_completed,
        );
        self.history = EventHistory::restore(
            self.config.history.cap,
            save.event_history,
            save.last_threat,
            save.last_cooldown_event,
        );
        self.queue.clear();
        for event in save.queued_events {
            self.queue.enqueue_at(event);
        }
        self.pacing = save.pacing;
        self.posture = save.posture;
        self.mailbox.discard();
        self.timers.initialized = false;
        self.difficulty.refreshed_at = None;

        tracing::info!(
            arcs = self.ledger.log().len(),
            active = self.ledger.is_active(),
            queued = self.queue.len(),
            "engine state restored"
        );
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn ledger(&self) -> &ArcLedger {
        &self.ledger
    }

    pub fn history(&self) -> &EventHistory {
        &self.history
    }

    pub fn pacing(&self) -> &PacingBounds {
        &self.pacing
    }

    pub fn posture(&self) -> Option<&Posture> {
        self.posture.as_ref()
    }

    pub fn is_call_in_flight(&self) -> bool {
        self.mailbox.is_in_flight()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

fn queued_from(event: ProposedEvent, source: SourceCycle) -> QueuedEvent {
    let mut queued = QueuedEvent::new(event.kind, source);
    queued.subtype = event.subtype;
    queued.faction = event.faction;
    queued.intensity = event.intensity;
    queued.note = event.note.unwrap_or_default();
    queued
}
