use std::path::PathBuf;

use crate::model::event_result::TickReport;
use crate::model::time::SimTime;

pub enum EngineCommand {
    Tick(SimTime),
    Save(PathBuf),
    Load(PathBuf),
    Shutdown,
}

pub enum EngineResponse<H> {
    Ticked(TickReport<H>),
    Saved(PathBuf),
    Loaded(PathBuf),
    Error(String),
}
