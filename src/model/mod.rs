pub mod arc;
pub mod event_result;
pub mod game_save;
pub mod game_state;
pub mod llm_decode;
pub mod narrative_event;
pub mod proposal;
pub mod queued_event;
pub mod time;
