pub mod engine;
pub mod protocol;

pub mod arc_ledger;
pub mod event_queue;
pub mod fallback;
pub mod history;
pub mod mailbox;
pub mod pacing;
pub mod rate_limit;
pub mod scheduler;
pub mod summarizer;
pub mod world;

pub mod llm_client;
pub mod prompt_builder;
pub mod provider;
