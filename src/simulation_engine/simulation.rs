// simulation.rs
use crate::engine::shutdown::Shutdown;
use crate::shared_data::Snapshot;
use crate::simulation_engine::movement::{MotionJob, MotionResult};
use crate::simulation_engine::state::{lock_state, SharedState};
use log::{debug, trace};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

/// What one tick did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub snapshot_published: bool,
    pub jobs_submitted: usize,
    pub jobs_dropped: usize,
    pub results_applied: usize,
    pub admitted: usize,
    pub crossed: usize,
    pub released: usize,
    pub removed: usize,
}

/// The fixed-cadence driver of the simulation.
pub struct ControlLoop {
    state: SharedState,
    jobs: mpsc::Sender<MotionJob>,
    results: mpsc::Receiver<MotionResult>,
    snapshots: mpsc::Sender<Snapshot>,
}

impl ControlLoop {
    pub fn new(
        state: SharedState,
        jobs: mpsc::Sender<MotionJob>,
        results: mpsc::Receiver<MotionResult>,
        snapshots: mpsc::Sender<Snapshot>,
    ) -> Self {
        Self {
            state,
            jobs,
            results,
            snapshots,
        }
    }

    /// Executes one tick. Never blocks: every channel operation is a `try_*`
    /// and the lock is not held while jobs and results are exchanged.
    pub fn tick(&mut self) -> TickReport {
        let mut report = TickReport::default();

        let batch = {
            let mut state = lock_state(&self.state);
            state.advance_phase();
            report.tick = state.tick();
            // An unread snapshot stays in the slot; this one is skipped.
            report.snapshot_published = self.snapshots.try_send(state.snapshot()).is_ok();
            state.motion_jobs()
        };

        for job in &batch {
            match self.jobs.try_send(*job) {
                Ok(()) => report.jobs_submitted += 1,
                Err(_) => report.jobs_dropped += 1,
            }
        }

        for _ in 0..batch.len() {
            let Ok(result) = self.results.try_recv() else {
                break;
            };
            if lock_state(&self.state).apply_motion(result) {
                report.results_applied += 1;
            }
        }

        let mut state = lock_state(&self.state);
        report.admitted = state.admit_waiting();
        report.crossed = state.detect_crossings();
        report.released = state.release_occupancy();
        report.removed = state.remove_departed();
        debug_assert!(state.queues_consistent());
        debug_assert!(state.occupancy().count() <= state.occupancy().max());
        report
    }

    /// Ticks every `period` until shutdown.
    pub async fn run(mut self, period: Duration, mut shutdown: Shutdown) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!("Control loop started ({:?} per tick)", period);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let report = self.tick();
            trace!("{:?}", report);
        }
        debug!("Control loop stopped");
    }
}
