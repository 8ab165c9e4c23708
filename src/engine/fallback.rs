use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::config::settings::FallbackLists;
use crate::engine::world::WorldActuator;
use crate::model::narrative_event::EventKind;
use crate::model::queued_event::{FireParams, SourceCycle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackClass {
    Background,
    Significant,
}

impl From<SourceCycle> for FallbackClass {
    fn from(source: SourceCycle) -> Self {
        match source {
            SourceCycle::Narrative => FallbackClass::Significant,
            SourceCycle::Scattered => FallbackClass::Background,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FallbackCandidates {
    pub background: Vec<EventKind>,
    pub significant: Vec<EventKind>,
}

impl FallbackCandidates {
    pub fn for_class(&self, class: FallbackClass) -> &[EventKind] {
        match class {
            FallbackClass::Background => &self.background,
            FallbackClass::Significant => &self.significant,
        }
    }
}

impl From<&FallbackLists> for FallbackCandidates {
    fn from(lists: &FallbackLists) -> Self {
        Self {
            background: lists.background_kinds(),
            significant: lists.significant_kinds(),
        }
    }
}

impl Default for FallbackCandidates {
    fn default() -> Self {
        Self::from(&FallbackLists::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution<H> {
    pub chosen: EventKind,
    pub handle: H,
    pub substituted: bool,
    /// Kinds tried before one could fire, the chosen one included.
    pub attempts: usize,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("no candidate could fire for {desired} ({tried} tried)")]
    Exhausted { desired: EventKind, tried: usize },
}

/// Tries the desired event, then a random permutation of the candidates
/// for its class with neutral parameters. Each list entry is tried once.
pub struct FallbackResolver<R: Rng = StdRng> {
    rng: R,
}

impl FallbackResolver<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> FallbackResolver<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Candidates in trial order: a uniform permutation of the whole list.
    /// The desired kind stays in when listed, so it gets a second chance with
    /// neutral parameters.
    pub fn shuffled(&mut self, candidates: &[EventKind]) -> Vec<EventKind> {
        let mut order = candidates.to_vec();
        order.shuffle(&mut self.rng);
        order
    }

    pub fn resolve<A: WorldActuator>(
        &mut self,
        actuator: &A,
        desired: &EventKind,
        params: &FireParams,
        candidates: &[EventKind],
    ) -> Result<Resolution<A::Handle>, ResolveError> {
        if actuator.can_fire(desired, params) {
            return Ok(Resolution {
                chosen: desired.clone(),
                handle: actuator.instantiate(desired, params),
                substituted: false,
                attempts: 1,
            });
        }

        let neutral = FireParams::neutral();
        let order = self.shuffled(candidates);
        for (i, candidate) in order.iter().enumerate() {
            if actuator.can_fire(candidate, &neutral) {
                let substituted = candidate != desired;
                tracing::info!(
                    desired = %desired,
                    substitute = %candidate,
                    attempts = i + 2,
                    substituted,
                    "fallback resolved"
                );
                return Ok(Resolution {
                    chosen: candidate.clone(),
                    handle: actuator.instantiate(candidate, &neutral),
                    substituted,
                    attempts: i + 2,
                });
            }
        }

        tracing::warn!(
            desired = %desired,
            tried = order.len() + 1,
            "all fallbacks exhausted"
        );
        Err(ResolveError::Exhausted {
            desired: desired.clone(),
            tried: order.len() + 1,
        })
    }
}
