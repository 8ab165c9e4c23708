use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};

use crate::config::settings_io::{load_state, save_state};
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::engine::scheduler::DecisionScheduler;
use crate::engine::world::{WorldActuator, WorldObserver};
use crate::model::event_result::TickReport;
use crate::model::time::SimTime;

/// Owns the scheduler on a dedicated thread, so ticks run strictly one
/// after another.
pub struct Engine<A: WorldActuator, O: WorldObserver> {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse<A::Handle>>,
    scheduler: DecisionScheduler<A, O>,
}

impl<A: WorldActuator, O: WorldObserver> Engine<A, O> {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse<A::Handle>>,
        scheduler: DecisionScheduler<A, O>,
    ) -> Self {
        Self { rx, tx, scheduler }
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            let response = match cmd {
                EngineCommand::Tick(now) => EngineResponse::Ticked(self.scheduler.tick(now)),

                EngineCommand::Save(path) => match save_state(&path, &self.scheduler.save()) {
                    Ok(()) => EngineResponse::Saved(path),
                    Err(e) => EngineResponse::Error(format!("{e:#}")),
                },

                EngineCommand::Load(path) => match self.load(&path) {
                    Ok(()) => EngineResponse::Loaded(path),
                    Err(e) => EngineResponse::Error(format!("{e:#}")),
                },

                EngineCommand::Shutdown => {
                    tracing::info!("engine shutting down");
                    break;
                }
            };

            if self.tx.send(response).is_err() {
                tracing::debug!("engine handle dropped, stopping");
                break;
            }
        }
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        let save = load_state(path)?;
        self.scheduler.restore(save);
        Ok(())
    }
}

/// Client side of a running engine thread.
pub struct EngineHandle<H> {
    tx: Sender<EngineCommand>,
    rx: Receiver<EngineResponse<H>>,
    join: Option<JoinHandle<()>>,
}

pub fn spawn_engine<A, O>(scheduler: DecisionScheduler<A, O>) -> Result<EngineHandle<A::Handle>>
where
    A: WorldActuator + Send + 'static,
    A::Handle: Send + 'static,
    O: WorldObserver + Send + 'static,
{
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();

    let join = thread::Builder::new()
        .name("storyteller-engine".into())
        .spawn(move || {
            let mut engine = Engine::new(cmd_rx, resp_tx, scheduler);
            engine.run();
        })?;

    Ok(EngineHandle {
        tx: cmd_tx,
        rx: resp_rx,
        join: Some(join),
    })
}

impl<H> EngineHandle<H> {
    fn request(&self, cmd: EngineCommand) -> Result<EngineResponse<H>> {
        self.tx
            .send(cmd)
            .map_err(|_| anyhow!("engine thread is not running"))?;
        self.rx
            .recv()
            .map_err(|_| anyhow!("engine thread stopped without answering"))
    }

    pub fn tick(&self, now: SimTime) -> Result<TickReport<H>> {
        match self.request(EngineCommand::Tick(now))? {
            EngineResponse::Ticked(report) => Ok(report),
            EngineResponse::Error(e) => Err(anyhow!(e)),
            _ => Err(anyhow!("unexpected engine response to tick")),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        match self.request(EngineCommand::Save(path.as_ref().to_path_buf()))? {
            EngineResponse::Saved(_) => Ok(()),
            EngineResponse::Error(e) => Err(anyhow!(e)),
            _ => Err(anyhow!("unexpected engine response to save")),
        }
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<()> {
        match self.request(EngineCommand::Load(path.as_ref().to_path_buf()))? {
            EngineResponse::Loaded(_) => Ok(()),
            EngineResponse::Error(e) => Err(anyhow!(e)),
            _ => Err(anyhow!("unexpected engine response to load")),
        }
    }

    /// Stop the thread and wait for it.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        let _ = self.tx.send(EngineCommand::Shutdown);
        match self.join.take() {
            Some(join) => join.join().map_err(|_| anyhow!("engine thread panicked")),
            None => Ok(()),
        }
    }
}

impl<H> Drop for EngineHandle<H> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!(error = %e, "engine did not stop cleanly");
        }
    }
}
