use crate::engine::shutdown::Shutdown;
use crate::simulation_engine::vehicles::{Point, Vehicle};
use log::{debug, trace};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// One vehicle's motion request for the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionJob {
    pub id: u64,
    pub position: Point,
    pub target: Point,
}

impl MotionJob {
    pub fn for_vehicle(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id,
            position: vehicle.position,
            target: vehicle.target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionResult {
    pub id: u64,
    pub position: Point,
}

/// Job queue shared by every worker in the pool.
pub type JobQueue = Arc<Mutex<mpsc::Receiver<MotionJob>>>;

/// Moves one step of `step_length` towards the target, or lands on it when
/// it is no further than one step away.
pub fn integrate(job: &MotionJob, step_length: f64) -> MotionResult {
    let dx = job.target.x - job.position.x;
    let dy = job.target.y - job.position.y;
    let distance = dx.hypot(dy);
    let position = if distance > step_length {
        Point::new(
            job.position.x + dx / distance * step_length,
            job.position.y + dy / distance * step_length,
        )
    } else {
        job.target
    };
    MotionResult {
        id: job.id,
        position,
    }
}

/// Worker loop: takes jobs off the shared queue until shutdown or until the
/// queue closes. Results go out with `try_send`; a full result queue drops
/// the update and the vehicle catches up on a later tick.
pub async fn run_worker(
    worker_id: usize,
    jobs: JobQueue,
    results: mpsc::Sender<MotionResult>,
    step_length: f64,
    mut shutdown: Shutdown,
) {
    debug!("Motion worker {} started", worker_id);
    loop {
        let job = {
            let mut queue = tokio::select! {
                _ = shutdown.cancelled() => break,
                queue = jobs.lock() => queue,
            };
            tokio::select! {
                _ = shutdown.cancelled() => break,
                job = queue.recv() => job,
            }
        };
        let Some(job) = job else {
            break;
        };
        if results.try_send(integrate(&job, step_length)).is_err() {
            trace!("Result queue full, dropped update for vehicle {}", job.id);
        }
    }
    debug!("Motion worker {} stopped", worker_id);
}
