//! Lifecycle of one running simulation.
//!
//! [`Engine`] owns the shared state and every channel between the units.
//! `start` launches the worker pool, the spawner and the control loop as
//! tokio tasks; `stop` cancels them all and waits for each to return.
//! Outside code only polls snapshots and pushes spawn requests.

pub mod shutdown;

use crate::config::SimConfig;
use crate::error::EngineError;
use crate::shared_data::Snapshot;
use crate::simulation_engine::movement::{run_worker, MotionJob, MotionResult};
use crate::simulation_engine::simulation::ControlLoop;
use crate::simulation_engine::spawning::{SpawnRequests, Spawner};
use crate::simulation_engine::state::{IntersectionState, SharedState};
use crate::simulation_engine::vehicles::Direction;
use log::{error, info};
use self::shutdown::{shutdown_channel, ShutdownTrigger};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

/// Channel ends handed to the units on start.
struct UnitChannels {
    job_tx: mpsc::Sender<MotionJob>,
    job_rx: mpsc::Receiver<MotionJob>,
    result_tx: mpsc::Sender<MotionResult>,
    result_rx: mpsc::Receiver<MotionResult>,
    snapshot_tx: mpsc::Sender<Snapshot>,
    spawn_rx: mpsc::Receiver<Direction>,
}

pub struct Engine {
    config: SimConfig,
    state: SharedState,
    spawn_tx: mpsc::Sender<Direction>,
    snapshot_rx: mpsc::Receiver<Snapshot>,
    // Taken by `start`; `None` afterwards.
    channels: Option<UnitChannels>,
    shutdown: ShutdownTrigger,
    units: JoinSet<()>,
}

impl Engine {
    /// Builds the engine and its channels without launching anything.
    pub fn new(config: SimConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let (job_tx, job_rx) = mpsc::channel(config.job_queue_capacity);
        let (result_tx, result_rx) = mpsc::channel(config.result_queue_capacity);
        let (spawn_tx, spawn_rx) = mpsc::channel(config.spawn_queue_capacity);
        let (snapshot_tx, snapshot_rx) = mpsc::channel(config.snapshot_capacity());
        let (shutdown, _) = shutdown_channel();

        Ok(Self {
            state: IntersectionState::new(&config).into_shared(),
            config,
            spawn_tx,
            snapshot_rx,
            channels: Some(UnitChannels {
                job_tx,
                job_rx,
                result_tx,
                result_rx,
                snapshot_tx,
                spawn_rx,
            }),
            shutdown,
            units: JoinSet::new(),
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Launches the workers, the spawner and the control loop. Must be called
    /// from within a tokio runtime. An engine runs at most once.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.shutdown.is_cancelled() {
            return Err(EngineError::Stopped);
        }
        let channels = self.channels.take().ok_or(EngineError::AlreadyStarted)?;
        let UnitChannels {
            job_tx,
            job_rx,
            result_tx,
            result_rx,
            snapshot_tx,
            spawn_rx,
        } = channels;

        let jobs = Arc::new(Mutex::new(job_rx));
        for worker_id in 0..self.config.worker_count {
            self.units.spawn(run_worker(
                worker_id,
                Arc::clone(&jobs),
                result_tx.clone(),
                self.config.step_length,
                self.shutdown.subscribe(),
            ));
        }
        drop(result_tx);

        let spawner = Spawner::new(Arc::clone(&self.state), spawn_rx, self.config.spawn_seed);
        self.units
            .spawn(spawner.run(self.config.spawn_interval(), self.shutdown.subscribe()));

        let control = ControlLoop::new(Arc::clone(&self.state), job_tx, result_rx, snapshot_tx);
        self.units
            .spawn(control.run(self.config.tick_interval(), self.shutdown.subscribe()));

        info!(
            "Engine started: {} workers, tick {:?}, spawn cadence {:?}",
            self.config.worker_count,
            self.config.tick_interval(),
            self.config.spawn_interval()
        );
        Ok(())
    }

    /// Signals cancellation and waits until every launched unit returned.
    /// Calling it again, or on an engine that never started, is a no-op.
    pub async fn stop(&mut self) -> Result<(), EngineError> {
        self.shutdown.cancel();
        let mut first_failure = None;
        while let Some(joined) = self.units.join_next().await {
            if let Err(err) = joined {
                error!("Simulation unit failed: {}", err);
                if first_failure.is_none() {
                    first_failure = Some(err);
                }
            }
        }
        if self.channels.is_none() {
            info!("Engine stopped");
        }
        match first_failure {
            Some(err) => Err(EngineError::UnitPanicked(err)),
            None => Ok(()),
        }
    }

    /// Number of launched units that have not returned yet.
    pub fn running_units(&self) -> usize {
        self.units.len()
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled() && self.units.is_empty()
    }

    /// Latest unread snapshot, or `None` right away if there is none.
    pub fn poll_snapshot(&mut self) -> Option<Snapshot> {
        self.snapshot_rx.try_recv().ok()
    }

    /// Cloneable, write-only spawn request handle.
    pub fn spawn_requests(&self) -> SpawnRequests {
        SpawnRequests::new(self.spawn_tx.clone())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        // JoinSet aborts whatever is left once dropped.
        self.shutdown.cancel();
    }
}
