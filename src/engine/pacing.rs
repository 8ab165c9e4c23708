use serde::{Deserialize, Serialize};

use crate::config::settings::{CallPolicy, Limit, PacingLimits};
use crate::model::proposal::{Proposal, TimerAdjustment};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Ignored unless both values are positive. Each value is clamped, then
    /// `max` is raised to `min` if they came in inverted.
    fn adjust(&mut self, min: f32, max: f32, limit: Limit) -> bool {
        if !(min > 0.0 && max > 0.0) {
            return false;
        }
        self.min = limit.clamp(min);
        self.max = limit.clamp(max);
        if self.max < self.min {
            self.max = self.min;
        }
        true
    }
}

/// Cadence the host's own event timers should follow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingBounds {
    pub minor_hours: Span,
    pub major_days: Span,
    pub narrative_days: Span,
}

impl Default for PacingBounds {
    fn default() -> Self {
        Self {
            minor_hours: Span::new(36.0, 72.0),
            major_days: Span::new(3.0, 7.0),
            narrative_days: Span::new(4.0, 8.0),
        }
    }
}

impl PacingBounds {
    /// Returns whether any pair changed.
    pub fn apply_adjustment(&mut self, adj: &TimerAdjustment, limits: &PacingLimits) -> bool {
        let minor = self
            .minor_hours
            .adjust(adj.minor_min_hours, adj.minor_max_hours, limits.minor_hours);
        let major = self
            .major_days
            .adjust(adj.major_min_days, adj.major_max_days, limits.major_days);
        let narrative = self.narrative_days.adjust(
            adj.narrative_min_days,
            adj.narrative_max_days,
            limits.narrative_days,
        );

        let changed = minor || major || narrative;
        if changed {
            tracing::info!(
                minor_hours = ?(self.minor_hours.min, self.minor_hours.max),
                major_days = ?(self.major_days.min, self.major_days.max),
                narrative_days = ?(self.narrative_days.min, self.narrative_days.max),
                "pacing bounds adjusted"
            );
        }
        changed
    }
}

/// Days until the next provider call.
///
/// Missing or non-positive hints use the default; the result is clamped and,
/// when the proposal starts an arc, held off long enough for it to play out.
pub fn next_call_days(proposal: &Proposal, policy: &CallPolicy) -> f32 {
    let requested = proposal
        .pacing
        .next_call_days
        .filter(|d| d.is_finite() && *d > 0.0)
        .unwrap_or(policy.default_next_call_days);

    let mut days = Limit::new(policy.min_next_call_days, policy.max_next_call_days).clamp(requested);
    if proposal.starts_arc() {
        days = days.max(policy.min_days_after_arc_start);
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::narrative_event::EventKind;
    use crate::model::proposal::{ArcDecision, ArcDirective, PacingHints, ProposedEvent};

    #[test]
    fn adjustment_with_zero_leaves_pair_unchanged() {
        let mut bounds = PacingBounds::default();
        let adj = TimerAdjustment {
            minor_min_hours: 12.0,
            minor_max_hours: 0.0,
            major_min_days: 2.0,
            major_max_days: 5.0,
            ..TimerAdjustment::default()
        };

        assert!(bounds.apply_adjustment(&adj, &PacingLimits::default()));
        assert_eq!(bounds.minor_hours, Span::new(36.0, 72.0));
        assert_eq!(bounds.major_days, Span::new(2.0, 5.0));
        assert_eq!(bounds.narrative_days, Span::new(4.0, 8.0));
    }

    #[test]
    fn adjustment_is_clamped_and_uninverted() {
        let mut bounds = PacingBounds::default();
        let adj = TimerAdjustment {
            minor_min_hours: 1.0,
            minor_max_hours: 500.0,
            narrative_min_days: 10.0,
            narrative_max_days: 3.0,
            ..TimerAdjustment::default()
        };

        bounds.apply_adjustment(&adj, &PacingLimits::default());
        assert_eq!(bounds.minor_hours, Span::new(6.0, 72.0));
        assert_eq!(bounds.narrative_days, Span::new(10.0, 10.0));
    }

    #[test]
    fn empty_adjustment_changes_nothing() {
        let mut bounds = PacingBounds::default();
        assert!(!bounds.apply_adjustment(&TimerAdjustment::default(), &PacingLimits::default()));
        assert_eq!(bounds, PacingBounds::default());
    }

    fn with_next(days: Option<f32>) -> Proposal {
        Proposal {
            pacing: PacingHints {
                next_call_days: days,
                adjusted_bounds: None,
            },
            ..Proposal::default()
        }
    }

    #[test]
    fn next_call_is_clamped_with_default() {
        let policy = CallPolicy::default();
        assert_eq!(next_call_days(&with_next(None), &policy), 3.0);
        assert_eq!(next_call_days(&with_next(Some(-1.0)), &policy), 3.0);
        assert_eq!(next_call_days(&with_next(Some(0.5)), &policy), 2.0);
        assert_eq!(next_call_days(&with_next(Some(20.0)), &policy), 7.0);
        assert_eq!(next_call_days(&with_next(Some(4.5)), &policy), 4.5);
    }

    #[test]
    fn arc_start_defers_next_call() {
        let mut proposal = with_next(Some(2.0));
        proposal.arc = Some(ArcDirective {
            decision: ArcDecision::Start,
            name: "Siege".into(),
            events: vec![ProposedEvent::new(EventKind::RaidEnemy, 5.0)],
            rationale: None,
        });

        assert_eq!(next_call_days(&proposal, &CallPolicy::default()), 5.0);
    }
}
