use serde_json::Value;

use crate::model::game_state::{DifficultyPolicy, WorldMetrics};
use crate::model::narrative_event::EventKind;
use crate::model::queued_event::FireParams;

/// The host world's side of event firing.
///
/// `can_fire` must be side-effect free. `instantiate` is only called after
/// `can_fire` said yes for the same kind and parameters.
pub trait WorldActuator {
    type Handle;

    fn can_fire(&self, kind: &EventKind, params: &FireParams) -> bool;

    fn instantiate(&self, kind: &EventKind, params: &FireParams) -> Self::Handle;
}

/// Read-only view of the world used to build decision requests.
pub trait WorldObserver {
    /// Opaque world snapshot, forwarded to the provider as-is.
    fn snapshot(&self) -> Value;

    fn metrics(&self) -> WorldMetrics;

    fn difficulty(&self) -> DifficultyPolicy {
        DifficultyPolicy::default()
    }
}

/// Wraps an actuator with the engine's own firing rules: difficulty gating,
/// intensity clamping and the cooldown-class safety net.
pub struct GatedActuator<'a, A> {
    inner: &'a A,
    difficulty: &'a DifficultyPolicy,
    cooldown_open: bool,
}

impl<'a, A: WorldActuator> GatedActuator<'a, A> {
    pub fn new(inner: &'a A, difficulty: &'a DifficultyPolicy, cooldown_open: bool) -> Self {
        Self {
            inner,
            difficulty,
            cooldown_open,
        }
    }

    fn permitted(&self, kind: &EventKind) -> bool {
        if kind.is_threat() && !self.difficulty.allow_threats {
            return false;
        }
        if kind.is_major_threat() && !self.difficulty.allow_major_threats {
            return false;
        }
        !(kind.is_cooldown_class() && !self.cooldown_open)
    }

    fn clamped(&self, params: &FireParams) -> FireParams {
        params
            .clone()
            .with_intensity(self.difficulty.clamp_intensity(params.intensity))
    }
}

impl<A: WorldActuator> WorldActuator for GatedActuator<'_, A> {
    type Handle = A::Handle;

    fn can_fire(&self, kind: &EventKind, params: &FireParams) -> bool {
        if !self.permitted(kind) {
            tracing::debug!(
                kind = %kind,
                difficulty = %self.difficulty.label,
                cooldown_open = self.cooldown_open,
                "refused by engine rules"
            );
            return false;
        }
        self.inner.can_fire(kind, &self.clamped(params))
    }

    fn instantiate(&self, kind: &EventKind, params: &FireParams) -> Self::Handle {
        self.inner.instantiate(kind, &self.clamped(params))
    }
}
