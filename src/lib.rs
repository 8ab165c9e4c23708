//! Event orchestration for a simulation storyteller: a delayed event queue,
//! narrative arc bookkeeping, history summaries for the decision provider,
//! fallback resolution against the world, and the scheduler tying them
//! together.

pub mod config;
pub mod engine;
pub mod model;

pub use config::settings::EngineConfig;
pub use engine::engine::{spawn_engine, EngineHandle};
pub use engine::provider::{DecisionProvider, DecisionRequest};
pub use engine::scheduler::DecisionScheduler;
pub use engine::world::{WorldActuator, WorldObserver};
pub use model::narrative_event::EventKind;
pub use model::time::SimTime;
